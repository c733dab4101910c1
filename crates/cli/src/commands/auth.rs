//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar login -e customer@example.com   # prompts via BAZAAR_PASSWORD
//! bazaar register -e new@example.com -u ravi
//! bazaar whoami
//! bazaar logout
//! ```

use std::io::Write;

use bazaar_storefront::AppState;
use bazaar_storefront::api::{Registration, User};
use secrecy::SecretString;

use crate::error::CliError;

/// Sign in and persist the session under the state directory.
pub async fn login(
    state: &AppState,
    out: &mut impl Write,
    email: &str,
    password: &SecretString,
) -> Result<(), CliError> {
    let user = state.auth().login(email, password).await?;
    writeln!(out, "Signed in as {}", describe(&user))?;
    Ok(())
}

/// Create an account; the new session is persisted like a login.
pub async fn register(
    state: &AppState,
    out: &mut impl Write,
    registration: &Registration,
) -> Result<(), CliError> {
    let user = state.auth().register(registration).await?;
    writeln!(out, "Welcome! Signed in as {}", describe(&user))?;
    Ok(())
}

fn describe(user: &User) -> String {
    format!(
        "{} ({})",
        user.name.as_deref().or(user.email.as_deref()).unwrap_or(user.id.as_str()),
        user.user_type
    )
}

pub fn logout(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.auth().logout();
    writeln!(out, "Signed out")?;
    Ok(())
}

pub fn whoami(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let user = state.auth().require_user()?;
    writeln!(out, "ID:    {}", user.id)?;
    if let Some(name) = &user.name {
        writeln!(out, "Name:  {name}")?;
    }
    if let Some(email) = &user.email {
        writeln!(out, "Email: {email}")?;
    }
    writeln!(out, "Role:  {}", user.user_type)?;
    Ok(())
}
