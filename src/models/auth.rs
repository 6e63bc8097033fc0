//! Login and registration models.

use serde::Deserialize;
use zeroize::Zeroizing;

/// Credentials for `POST Users/login`.
pub struct LoginRequest {
    pub email: String,
    pub password: Zeroizing<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Form fields in the order the backend expects them.
    pub fn form(&self) -> [(&str, &str); 2] {
        [("email", self.email.as_str()), ("password", self.password.as_str())]
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub api_key: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// New account details for `PUT Users/register`.
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl RegisterRequest {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn form(&self) -> [(&str, &str); 3] {
        [
            ("email", self.email.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ]
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
