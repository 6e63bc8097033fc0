//! Wallet balance model.
//!
//! The backend returns its account row verbatim: one numeric column per
//! coin (named after the coin, e.g. `bitcoin`), a `balance` column in USD,
//! and the `walletId` key. Columns are mapped to ticker symbols so the
//! wallet cache is keyed the same way currency quotes are.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::wallet::WalletSnapshot;

/// Key holding the USD balance.
const FIAT_KEY: &str = "balance";

/// Keys that are not balances at all.
const IGNORED_KEYS: [&str; 1] = ["walletId"];

/// Symbols with a dedicated account column; every other coin is booked
/// against `otherCrypto`.
const DEDICATED_SYMBOLS: [&str; 4] = ["BTC", "ETH", "LTC", "XRP"];

/// Wallet key of the catch-all `otherCrypto` column.
pub const OTHER_SYMBOL: &str = "OTHER";

/// Response from `GET APIServices/WalletBalance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub wallet_balance: Map<String, Value>,
}

impl WalletBalanceResponse {
    /// Converts the account row into a snapshot stamped with `fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::MalformedMessage`](crate::TradeDeskError::MalformedMessage)
    /// if the USD balance is missing, or any balance is unparsable or negative.
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> crate::Result<WalletSnapshot> {
        let mut fiat = None;
        let mut assets = BTreeMap::new();

        for (key, value) in self.wallet_balance {
            if IGNORED_KEYS.contains(&key.as_str()) || value.is_null() {
                continue;
            }
            let amount = decimal_from_value(&value).ok_or_else(|| {
                crate::TradeDeskError::MalformedMessage(format!(
                    "wallet field {key:?} is not a number: {value}"
                ))
            })?;
            if amount < Decimal::ZERO {
                return Err(crate::TradeDeskError::MalformedMessage(format!(
                    "wallet field {key:?} is negative: {amount}"
                )));
            }
            if key == FIAT_KEY {
                fiat = Some(amount);
            } else {
                *assets.entry(symbol_for_key(&key)).or_insert(Decimal::ZERO) += amount;
            }
        }

        let fiat = fiat.ok_or_else(|| {
            crate::TradeDeskError::MalformedMessage("wallet response has no balance field".into())
        })?;

        Ok(WalletSnapshot {
            fiat_balance: fiat,
            asset_balances: assets,
            last_synced_at: Some(fetched_at),
        })
    }
}

/// Maps an account column name to the ticker symbol it holds.
pub fn symbol_for_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "bitcoin" => "BTC".to_string(),
        "ethereum" => "ETH".to_string(),
        "solana" => "SOL".to_string(),
        "ripple" => "XRP".to_string(),
        "litecoin" => "LTC".to_string(),
        "cardano" => "ADA".to_string(),
        "dogecoin" => "DOGE".to_string(),
        "othercrypto" => OTHER_SYMBOL.to_string(),
        _ => key.to_ascii_uppercase(),
    }
}

/// Wallet key the backend books a trade in `symbol` under.
///
/// Coins without their own column share the `OTHER` holding.
pub fn holding_key_for_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_ascii_uppercase();
    if DEDICATED_SYMBOLS.contains(&symbol.as_str()) {
        symbol
    } else {
        OTHER_SYMBOL.to_string()
    }
}

/// Reads a decimal from a JSON number or numeric string.
fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
