//! Account endpoints: login and registration.

use tracing::info;

use super::{ApiClient, LOGIN_PATH, REGISTER_PATH};
use crate::Result;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};

impl ApiClient {
    /// Exchanges credentials for an API key.
    ///
    /// The key is returned, not stored; the caller decides whether to keep it.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::Rejected`](crate::TradeDeskError::Rejected)
    /// for wrong credentials, or a network/JSON error.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let builder = self.post(LOGIN_PATH)?.form(&request.form());
        let response = self.execute("login", builder).await?;
        let body: LoginResponse = Self::json(response).await?;
        info!(email = %request.email, "logged in");
        Ok(body)
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::Rejected`](crate::TradeDeskError::Rejected)
    /// if the backend refuses the registration, or a network error.
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        let builder = self.put(REGISTER_PATH)?.form(&request.form());
        self.execute("register", builder).await?;
        info!(email = %request.email, username = %request.username, "registered account");
        Ok(())
    }
}
