//! Per-transaction lifecycle.

use std::fmt;

use rust_decimal::Decimal;

use crate::models::TradeAction;

/// Session-unique transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TX-{:06}", self.0)
    }
}

/// Where a transaction is in its lifecycle.
///
/// `Submitted` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Submitted,
    Confirmed,
    Rejected,
}

/// A buy or sell the user has asked the backend to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub id: TxId,
    /// Backend identifier of the traded currency.
    pub asset_id: u32,
    /// Wallet key the holding is booked under (e.g. "BTC", or "OTHER").
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: Decimal,
    /// Price per unit quoted when the transaction was submitted.
    pub unit_price: Decimal,
    status: TransactionStatus,
}

impl PendingTransaction {
    /// Creates a transaction in the `Submitted` state.
    pub fn submitted(
        id: TxId,
        asset_id: u32,
        symbol: impl Into<String>,
        action: TradeAction,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id,
            asset_id,
            symbol: symbol.into(),
            action,
            quantity,
            unit_price,
            status: TransactionStatus::Submitted,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// USD value of the transaction at its quoted price.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Moves `Submitted` to `Confirmed`. Returns `false` from a terminal state.
    pub fn confirm(&mut self) -> bool {
        self.transition(TransactionStatus::Confirmed)
    }

    /// Moves `Submitted` to `Rejected`. Returns `false` from a terminal state.
    pub fn reject(&mut self) -> bool {
        self.transition(TransactionStatus::Rejected)
    }

    fn transition(&mut self, to: TransactionStatus) -> bool {
        if self.status != TransactionStatus::Submitted {
            return false;
        }
        self.status = to;
        true
    }
}
