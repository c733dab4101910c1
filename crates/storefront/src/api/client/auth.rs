use bazaar_core::Email;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::ApiClient;
use crate::api::ApiError;
use crate::api::conversions::{TokenDto, convert_user, decode, unwrap_envelope};
use crate::api::types::{Registration, User};
use crate::store::LoginSuccess;

impl ApiClient {
    /// Exchange credentials for a user and token pair.
    ///
    /// Nothing is stored; the caller decides what to persist.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a malformed email or empty
    /// password without contacting the backend, [`ApiError::Server`] with
    /// status 401 for refused credentials, or a transport error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginSuccess, ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::validation(e.to_string()))?;
        if password.expose_secret().is_empty() {
            return Err(ApiError::validation("Password is required"));
        }

        let body = self
            .send_json(
                Method::POST,
                "/auth/login",
                &json!({ "email": email.as_str(), "password": password.expose_secret() }),
            )
            .await
            .map_err(credentials_refused)?;

        let success = session_from(body, "login")?;
        info!(user_id = %success.user.id, user_type = %success.user.user_type, "Logged in");
        Ok(success)
    }

    /// Create a customer account. The backend signs the new account in
    /// straight away, so this returns the same token pair as a login.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a malformed email or empty
    /// password without contacting the backend, [`ApiError::Server`] when
    /// the email or username is taken (409) or the password is refused, or a
    /// transport error.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<LoginSuccess, ApiError> {
        let email =
            Email::parse(&registration.email).map_err(|e| ApiError::validation(e.to_string()))?;
        if registration.password.expose_secret().is_empty() {
            return Err(ApiError::validation("Password is required"));
        }

        let mut body = json!({
            "email": email.as_str(),
            "password": registration.password.expose_secret(),
        });
        for (key, value) in [
            ("username", &registration.username),
            ("first_name", &registration.first_name),
            ("last_name", &registration.last_name),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                body[key] = Value::String(value.to_string());
            }
        }

        let body = self
            .send_json(Method::POST, "/auth/register", &body)
            .await
            .map_err(credentials_refused)?;

        let success = session_from(body, "registration")?;
        info!(user_id = %success.user.id, "Registered");
        Ok(success)
    }

    /// The user the current token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is no longer valid
    /// and cannot be refreshed.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        match unwrap_envelope(self.get("/auth/me").await?, &["user"]) {
            Value::Null => Err(ApiError::Parse("profile response is empty".to_string())),
            user => convert_user(&user),
        }
    }
}

/// User and tokens from a login or registration response.
fn session_from(body: Value, what: &str) -> Result<LoginSuccess, ApiError> {
    let user = body
        .get("user")
        .ok_or_else(|| ApiError::Parse(format!("{what} response has no user")))
        .and_then(convert_user)?;
    let tokens: TokenDto = decode(body, what)?;
    Ok(LoginSuccess {
        user,
        token: SecretString::from(tokens.access_token),
        refresh_token: tokens.refresh_token.map(SecretString::from),
    })
}

/// A 401 while signing in means the credentials were refused, not that a
/// session lapsed.
fn credentials_refused(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthorized(message) => ApiError::Server {
            status: 401,
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_credentials_are_not_a_session_error() {
        let err = credentials_refused(ApiError::Unauthorized("Invalid email or password".into()));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "Invalid email or password");
        assert!(!err.is_session_error());

        let err = credentials_refused(ApiError::validation("Password is required"));
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
