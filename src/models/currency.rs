//! Currency catalog, ticker and price history models.

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// A currency offered on the selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Backend (coinlore) identifier.
    pub id: u32,
    pub name: &'static str,
    pub symbol: &'static str,
}

/// Currencies the client offers, in display order.
pub static CATALOG: [CatalogEntry; 6] = [
    CatalogEntry { id: 90, name: "Bitcoin", symbol: "BTC" },
    CatalogEntry { id: 80, name: "Ethereum", symbol: "ETH" },
    CatalogEntry { id: 70, name: "Ripple", symbol: "XRP" },
    CatalogEntry { id: 60, name: "Litecoin", symbol: "LTC" },
    CatalogEntry { id: 50, name: "Dogecoin", symbol: "DOGE" },
    CatalogEntry { id: 40, name: "Cardano", symbol: "ADA" },
];

/// Looks up a catalog entry by backend id.
pub fn catalog_entry(id: u32) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

/// Ticker row as relayed from the upstream price service.
///
/// Numeric fields arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinTicker {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub nameid: Option<String>,
    pub rank: u32,
    pub price_usd: Decimal,
    #[serde(default)]
    pub percent_change_1h: Option<Decimal>,
    #[serde(default)]
    pub percent_change_24h: Option<Decimal>,
    #[serde(default)]
    pub percent_change_7d: Option<Decimal>,
}

/// One recorded price.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    #[serde(deserialize_with = "super::de_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Chronological price series for one currency.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory {
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Lowest and highest price in the series.
    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        let mut prices = self.points.iter().map(|p| p.price);
        let first = prices.next()?;
        Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// X-axis labels, one per point: `HH:00` the first time an hour is seen,
    /// empty otherwise.
    pub fn hourly_labels(&self) -> Vec<String> {
        let mut seen = Vec::new();
        self.points
            .iter()
            .map(|point| {
                let hour = point.timestamp.hour();
                if seen.contains(&hour) {
                    String::new()
                } else {
                    seen.push(hour);
                    format!("{hour:02}:00")
                }
            })
            .collect()
    }
}

/// Raw body of `POST APIServices/CurrencyInfo`.
///
/// `currencyData` is the upstream ticker array, usually re-encoded as a
/// JSON string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfoResponse {
    pub currency_data: Value,
    #[serde(default)]
    pub currency_history: Option<PriceHistory>,
}

impl CurrencyInfoResponse {
    /// Decodes the nested ticker payload.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::MalformedMessage`](crate::TradeDeskError::MalformedMessage)
    /// if the ticker array is empty or not an array, or a JSON error if the
    /// embedded string does not parse.
    pub fn into_detail(self) -> crate::Result<CurrencyDetail> {
        let tickers: Vec<CoinTicker> = match self.currency_data {
            Value::String(encoded) => serde_json::from_str(&encoded)?,
            array @ Value::Array(_) => serde_json::from_value(array)?,
            other => {
                return Err(crate::TradeDeskError::MalformedMessage(format!(
                    "currencyData is neither a string nor an array: {other}"
                )));
            }
        };
        let ticker = tickers.into_iter().next().ok_or_else(|| {
            crate::TradeDeskError::MalformedMessage("currencyData holds no ticker".into())
        })?;

        Ok(CurrencyDetail {
            ticker,
            history: self.currency_history.unwrap_or_default(),
        })
    }
}

/// Everything the detail view shows for one currency.
#[derive(Debug, Clone)]
pub struct CurrencyDetail {
    pub ticker: CoinTicker,
    pub history: PriceHistory,
}

impl CurrencyDetail {
    pub fn symbol(&self) -> &str {
        &self.ticker.symbol
    }

    /// Current USD price; the price used for trades opened from this view.
    pub fn price(&self) -> Decimal {
        self.ticker.price_usd
    }
}
