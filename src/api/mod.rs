//! REST client for the trading backend.
//!
//! Every call is a single request/response round trip. Form-encoded bodies
//! go out, JSON comes back, and any non-2xx status becomes
//! [`TradeDeskError::Rejected`] carrying the body text. Transport failures
//! (refused connections, timeouts) become [`TradeDeskError::Network`].

mod agent;
mod market;
mod trading;
mod users;

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::{Result, TradeDeskError};

/// Header carrying the session's API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

const LOGIN_PATH: &str = "Users/login";
const REGISTER_PATH: &str = "Users/register";
const WALLET_BALANCE_PATH: &str = "APIServices/WalletBalance";
const ADD_MONEY_PATH: &str = "APIServices/AddMoney";
const CURRENCY_INFO_PATH: &str = "APIServices/CurrencyInfo";
const TRANSACTIONS_HISTORY_PATH: &str = "APIServices/TransactionsHistory";
const AGENT_PATH: &str = "APIServices/Agent";

/// HTTP client bound to one backend and, once logged in, one API key.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Builds a client from backend settings.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::Config`] if the base URL does not parse or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url).map_err(|e| {
            TradeDeskError::Config(format!("invalid api url {:?}: {e}", config.api_url))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tradedesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TradeDeskError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            api_key: config.api_key.clone(),
        })
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = Some(key.into());
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| TradeDeskError::Config(format!("invalid endpoint path {path:?}: {e}")))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.post(self.url(path)?))
    }

    fn put(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.put(self.url(path)?))
    }

    /// Attaches the API key, failing before anything is sent when absent.
    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let key = self.api_key.as_deref().ok_or(TradeDeskError::NotAuthenticated)?;
        Ok(request.header(API_KEY_HEADER, key))
    }

    /// Sends a request and maps the status to success or rejection.
    async fn execute(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response> {
        debug!(endpoint, "sending request");
        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "request failed before a response arrived");
            TradeDeskError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), %message, "request rejected");
            return Err(TradeDeskError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(endpoint, status = status.as_u16(), "request succeeded");
        Ok(response)
    }

    /// Reads a success body as JSON.
    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
