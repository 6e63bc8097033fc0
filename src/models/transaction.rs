//! Transaction history models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::TradeAction;

/// Response from `GET APIServices/TransactionsHistory`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsHistoryResponse {
    pub transactions_history: Vec<TransactionRecord>,
}

/// A trade as recorded by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub action: TradeAction,
    pub crypto_id: u32,
    pub price_at_transaction: Decimal,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(deserialize_with = "super::de_timestamp")]
    pub date_time: DateTime<Utc>,
}

impl TransactionRecord {
    /// USD value at the recorded price.
    pub fn notional(&self) -> Decimal {
        self.amount * self.price_at_transaction
    }
}
