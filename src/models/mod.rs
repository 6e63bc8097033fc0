//! Wire models for the trading backend's REST endpoints.
//!
//! Requests are form-encoded; responses are JSON with camelCase keys.

pub mod agent;
pub mod auth;
pub mod currency;
pub mod transaction;
pub mod wallet;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

pub use agent::AgentReply;
pub use auth::{LoginRequest, LoginResponse, RegisterRequest};
pub use currency::{CATALOG, CatalogEntry, CoinTicker, CurrencyDetail, PriceHistory, PricePoint};
pub use transaction::{TransactionRecord, TransactionsHistoryResponse};
pub use wallet::{WalletBalanceResponse, holding_key_for_symbol};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Returns the lowercase name used in endpoint paths and history records.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(format!("unknown trade action {other:?}")),
        }
    }
}

/// Parses backend timestamps, which arrive either as RFC 3339 or as a
/// naive ISO 8601 string that is implicitly UTC.
pub(crate) fn de_timestamp<'de, D>(
    deserializer: D,
) -> Result<chrono::DateTime<chrono::Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}
