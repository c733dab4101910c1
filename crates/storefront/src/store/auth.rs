//! The auth slice: who is signed in and with which tokens.
//!
//! Reducers here are pure. Persisting tokens is the session's job.

use bazaar_core::UserType;
use secrecy::SecretString;

use crate::api::types::User;

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub is_authenticated: bool,
    pub user_type: Option<UserType>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Payload of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: User,
    pub token: SecretString,
    pub refresh_token: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    LoginStart,
    LoginSuccess(LoginSuccess),
    LoginFailure(String),
    Logout,
    /// Adopt a token read from persistent storage when none is held yet.
    /// The session only counts as authenticated once the user is restored.
    CheckAuth {
        token: Option<SecretString>,
        refresh_token: Option<SecretString>,
    },
    /// User fetched from the backend after a restart.
    RestoreUser(User),
    SetUser(User),
    /// New access token from a refresh.
    SetAccessToken(SecretString),
}

impl AuthAction {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::LoginStart => "auth/loginStart",
            Self::LoginSuccess(_) => "auth/loginSuccess",
            Self::LoginFailure(_) => "auth/loginFailure",
            Self::Logout => "auth/logout",
            Self::CheckAuth { .. } => "auth/checkAuth",
            Self::RestoreUser(_) => "auth/restoreUser",
            Self::SetUser(_) => "auth/setUser",
            Self::SetAccessToken(_) => "auth/setAccessToken",
        }
    }
}

pub(crate) fn reduce(state: &mut AuthState, action: AuthAction) {
    match action {
        AuthAction::LoginStart => {
            state.loading = true;
            state.error = None;
        }
        AuthAction::LoginSuccess(payload) => {
            state.loading = false;
            state.is_authenticated = true;
            state.user_type = Some(payload.user.user_type);
            state.user = Some(payload.user);
            state.token = Some(payload.token);
            state.refresh_token = payload.refresh_token;
            state.error = None;
        }
        AuthAction::LoginFailure(error) => {
            *state = AuthState {
                error: Some(error),
                ..AuthState::default()
            };
        }
        AuthAction::Logout => *state = AuthState::default(),
        AuthAction::CheckAuth {
            token,
            refresh_token,
        } => {
            if state.token.is_none()
                && let Some(token) = token
            {
                state.token = Some(token);
                if state.refresh_token.is_none() {
                    state.refresh_token = refresh_token;
                }
            }
        }
        AuthAction::RestoreUser(user) | AuthAction::SetUser(user) => {
            state.user_type = Some(user.user_type);
            state.user = Some(user);
            if state.token.is_some() {
                state.is_authenticated = true;
            }
        }
        AuthAction::SetAccessToken(token) => state.token = Some(token),
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::UserId;
    use secrecy::ExposeSecret;

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            email: Some("asha@example.com".into()),
            name: Some("Asha".into()),
            user_type: UserType::User,
        }
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_login_flow() {
        let mut state = AuthState::default();
        reduce(&mut state, AuthAction::LoginStart);
        assert!(state.loading);

        reduce(
            &mut state,
            AuthAction::LoginSuccess(LoginSuccess {
                user: user(),
                token: secret("a1"),
                refresh_token: Some(secret("r1")),
            }),
        );
        assert!(!state.loading);
        assert!(state.is_authenticated);
        assert_eq!(state.user_type, Some(UserType::User));
        assert_eq!(state.token.as_ref().map(ExposeSecret::expose_secret), Some("a1"));
    }

    #[test]
    fn test_login_failure_clears_session() {
        let mut state = AuthState {
            token: Some(secret("old")),
            is_authenticated: true,
            ..AuthState::default()
        };
        reduce(&mut state, AuthAction::LoginFailure("Invalid credentials".into()));
        assert!(!state.is_authenticated);
        assert!(state.token.is_none());
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_check_auth_does_not_authenticate() {
        let mut state = AuthState::default();
        reduce(
            &mut state,
            AuthAction::CheckAuth {
                token: Some(secret("stored")),
                refresh_token: None,
            },
        );
        assert!(state.token.is_some());
        assert!(!state.is_authenticated);

        reduce(&mut state, AuthAction::RestoreUser(user()));
        assert!(state.is_authenticated);
    }

    #[test]
    fn test_check_auth_keeps_in_memory_token() {
        let mut state = AuthState {
            token: Some(secret("memory")),
            ..AuthState::default()
        };
        reduce(
            &mut state,
            AuthAction::CheckAuth {
                token: Some(secret("stored")),
                refresh_token: None,
            },
        );
        assert_eq!(state.token.as_ref().map(ExposeSecret::expose_secret), Some("memory"));
    }

    #[test]
    fn test_set_user_without_token_stays_anonymous() {
        let mut state = AuthState::default();
        reduce(&mut state, AuthAction::SetUser(user()));
        assert!(state.user.is_some());
        assert!(!state.is_authenticated);
    }

    #[test]
    fn test_logout_resets() {
        let mut state = AuthState {
            token: Some(secret("t")),
            is_authenticated: true,
            user: Some(user()),
            ..AuthState::default()
        };
        reduce(&mut state, AuthAction::Logout);
        assert!(state.user.is_none());
        assert!(state.token.is_none());
        assert!(!state.is_authenticated);
    }
}
