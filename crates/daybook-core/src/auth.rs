//! Signup and login flows
//!
//! Forms are validated locally first; only a valid form reaches the
//! [`AuthRemote`]. Every failure maps to a short user-facing message.

use thiserror::Error;
use tracing::{info, warn};

use crate::remote::{AuthRemote, AuthRequest, RemoteError};
use crate::session::Credential;

/// User-facing auth failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Form rejected before any remote call
    #[error("{0}")]
    Validation(&'static str),

    /// The server answered with a non-success status
    #[error("{0}")]
    Rejected(String),

    /// The request did not complete or the answer was unreadable
    #[error("Server error")]
    Server,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.is_empty() || self.password.is_empty() || self.confirm.is_empty() {
            return Err(AuthError::Validation("All fields required"));
        }
        if self.password != self.confirm {
            return Err(AuthError::Validation("Passwords do not match"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AuthError::Validation("All fields required"));
        }
        Ok(())
    }
}

/// Create an account and return its credential.
pub async fn sign_up(remote: &dyn AuthRemote, form: &SignupForm) -> Result<Credential, AuthError> {
    form.validate()?;
    let request = AuthRequest {
        username: form.username.clone(),
        password: form.password.clone(),
    };

    let response = remote
        .signup(request)
        .await
        .map_err(|e| auth_failure(e, "Signup failed"))?;

    info!(username = %response.user.username, "Signed up");
    Ok(Credential {
        token: response.token,
        username: response.user.username,
    })
}

/// Log in and return the credential.
pub async fn log_in(remote: &dyn AuthRemote, form: &LoginForm) -> Result<Credential, AuthError> {
    form.validate()?;
    let request = AuthRequest {
        username: form.username.clone(),
        password: form.password.clone(),
    };

    let response = remote
        .login(request)
        .await
        .map_err(|e| auth_failure(e, "Login failed"))?;

    info!(username = %response.user.username, "Logged in");
    Ok(Credential {
        token: response.token,
        username: response.user.username,
    })
}

fn auth_failure(error: RemoteError, fallback: &str) -> AuthError {
    warn!(error = %error, "Auth request failed");
    match error {
        RemoteError::Status { message, .. } if !message.trim().is_empty() => AuthError::Rejected(message),
        RemoteError::Status { .. } => AuthError::Rejected(fallback.to_string()),
        RemoteError::Transport(_) | RemoteError::Decode(_) => AuthError::Server,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRemote, RecordedCall};

    fn signup_form(password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            username: "ada".to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_validation_skips_remote() {
        let remote = MockRemote::new();

        let err = sign_up(&remote, &signup_form("", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "All fields required");

        let err = sign_up(&remote, &signup_form("abc", "abd")).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");

        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signup_success() {
        let remote = MockRemote::new();
        let credential = sign_up(&remote, &signup_form("pw", "pw")).await.unwrap();

        assert_eq!(credential.username, "ada");
        assert_eq!(credential.token, "token-ada");
        assert_eq!(
            remote.calls(),
            vec![RecordedCall::Signup(AuthRequest {
                username: "ada".to_string(),
                password: "pw".to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn test_login_surfaces_server_text() {
        let remote = MockRemote::new().with_auth_error(RemoteError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        });
        let form = LoginForm {
            username: "ada".to_string(),
            password: "nope".to_string(),
        };

        let err = log_in(&remote, &form).await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid credentials".to_string()));
    }

    #[tokio::test]
    async fn test_login_fallback_messages() {
        let form = LoginForm {
            username: "ada".to_string(),
            password: "pw".to_string(),
        };

        let remote = MockRemote::new().with_auth_error(RemoteError::Status {
            status: 500,
            message: String::new(),
        });
        assert_eq!(log_in(&remote, &form).await.unwrap_err().to_string(), "Login failed");

        let remote = MockRemote::new().with_auth_error(RemoteError::Transport("refused".to_string()));
        assert_eq!(log_in(&remote, &form).await.unwrap_err().to_string(), "Server error");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let form = LoginForm {
            username: "ada".to_string(),
            password: String::new(),
        };
        assert_eq!(form.validate(), Err(AuthError::Validation("All fields required")));
    }
}
