//! Local wallet cache reconciled against the backend.
//!
//! The backend is the only source of truth for balances. The client keeps a
//! [`WalletSnapshot`] that is replaced wholesale on every sync and nudged by
//! exactly one optimistic delta per confirmed transaction in between.
//! Asset holdings never go negative locally: a delta that would push one
//! below zero is clamped and the snapshot is flagged stale so the next read
//! resyncs. Fiat is left unclamped because overspend is the server's call.

pub mod transaction;

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::models::TradeAction;
pub use transaction::{PendingTransaction, TransactionStatus, TxId};

/// Decimal places used when deriving a quantity from a balance percentage.
const QUANTITY_SCALE: u32 = 8;

/// Balances as last known by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletSnapshot {
    /// USD balance.
    pub fiat_balance: Decimal,
    /// Held quantity per asset symbol.
    pub asset_balances: BTreeMap<String, Decimal>,
    /// When this snapshot was fetched from the server, if ever.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl WalletSnapshot {
    /// Builds an unstamped snapshot from balances.
    pub fn new(fiat_balance: Decimal, asset_balances: BTreeMap<String, Decimal>) -> Self {
        Self {
            fiat_balance,
            asset_balances,
            last_synced_at: None,
        }
    }

    /// Held quantity of `symbol`, zero when absent.
    pub fn holding(&self, symbol: &str) -> Decimal {
        self.asset_balances
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Quantity matching `percent` of the balance that funds `action`.
    ///
    /// Buys are funded by fiat at `unit_price`, sells by the asset holding.
    /// `percent` is clamped to `0..=100` and the result is truncated to
    /// eight decimal places. Non-positive prices or balances yield zero.
    pub fn quantity_for_percent(
        &self,
        action: TradeAction,
        symbol: &str,
        unit_price: Decimal,
        percent: Decimal,
    ) -> Decimal {
        let fraction = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED;
        let quantity = match action {
            TradeAction::Buy => {
                if unit_price <= Decimal::ZERO || self.fiat_balance <= Decimal::ZERO {
                    return Decimal::ZERO;
                }
                self.fiat_balance * fraction / unit_price
            }
            TradeAction::Sell => self.holding(symbol).max(Decimal::ZERO) * fraction,
        };
        quantity.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::ToZero)
    }
}

/// What [`WalletReconciler::apply_confirmed`] did with a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The delta was applied in full.
    Applied,
    /// The asset side would have gone negative; it was set to zero and the
    /// snapshot marked stale. `shortfall` is the amount that was dropped.
    Clamped { symbol: String, shortfall: Decimal },
    /// This transaction id was already applied; nothing changed.
    Duplicate,
    /// The transaction is not confirmed; nothing changed.
    NotConfirmed(TransactionStatus),
}

/// Owns the session's wallet cache.
#[derive(Debug)]
pub struct WalletReconciler {
    snapshot: WalletSnapshot,
    stale: bool,
    applied: HashSet<TxId>,
}

impl WalletReconciler {
    /// Creates an empty, never-synced (and therefore stale) wallet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: WalletSnapshot::default(),
            stale: true,
            applied: HashSet::new(),
        }
    }

    /// Replaces the local snapshot with an authoritative one.
    ///
    /// A snapshot without a fetch time is stamped with the current time.
    pub fn sync(&mut self, mut snapshot: WalletSnapshot) {
        if snapshot.last_synced_at.is_none() {
            snapshot.last_synced_at = Some(Utc::now());
        }
        debug!(
            fiat = %snapshot.fiat_balance,
            assets = snapshot.asset_balances.len(),
            "wallet synced"
        );
        self.snapshot = snapshot;
        self.stale = false;
    }

    /// Applies the optimistic delta of a confirmed transaction, at most once
    /// per transaction id.
    pub fn apply_confirmed(&mut self, tx: &PendingTransaction) -> ApplyOutcome {
        if tx.status() != TransactionStatus::Confirmed {
            return ApplyOutcome::NotConfirmed(tx.status());
        }
        if !self.applied.insert(tx.id) {
            debug!(tx = %tx.id, "transaction already applied");
            return ApplyOutcome::Duplicate;
        }

        let usd_delta = tx.notional();
        let (fiat_delta, asset_delta) = match tx.action {
            TradeAction::Buy => (-usd_delta, tx.quantity),
            TradeAction::Sell => (usd_delta, -tx.quantity),
        };

        self.snapshot.fiat_balance += fiat_delta;
        let holding = self
            .snapshot
            .asset_balances
            .entry(tx.symbol.clone())
            .or_insert(Decimal::ZERO);
        let next = *holding + asset_delta;

        if next < Decimal::ZERO {
            *holding = Decimal::ZERO;
            self.stale = true;
            warn!(
                tx = %tx.id,
                symbol = %tx.symbol,
                shortfall = %(-next),
                "local holding would go negative; clamped and marked stale"
            );
            return ApplyOutcome::Clamped {
                symbol: tx.symbol.clone(),
                shortfall: -next,
            };
        }

        *holding = next;
        debug!(
            tx = %tx.id,
            action = tx.action.as_str(),
            symbol = %tx.symbol,
            "applied optimistic delta"
        );
        ApplyOutcome::Applied
    }

    /// The local snapshot. Check [`is_stale`](Self::is_stale) before trusting it.
    pub fn current_snapshot(&self) -> &WalletSnapshot {
        &self.snapshot
    }

    /// `true` before the first sync and after a clamp, until the next sync.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether the given transaction's delta has been applied.
    pub fn was_applied(&self, id: TxId) -> bool {
        self.applied.contains(&id)
    }
}

impl Default for WalletReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn snapshot(fiat: Decimal, assets: &[(&str, Decimal)]) -> WalletSnapshot {
        let balances = assets.iter().map(|(s, q)| (s.to_string(), *q)).collect();
        WalletSnapshot::new(fiat, balances)
    }

    fn confirmed(
        id: u64,
        symbol: &str,
        action: TradeAction,
        qty: Decimal,
        price: Decimal,
    ) -> PendingTransaction {
        let mut tx = PendingTransaction::submitted(TxId(id), 90, symbol, action, qty, price);
        assert!(tx.confirm());
        tx
    }

    #[test]
    fn new_wallet_is_empty_and_stale() {
        let wallet = WalletReconciler::new();
        assert!(wallet.is_stale());
        assert_eq!(wallet.current_snapshot(), &WalletSnapshot::default());
        assert!(wallet.current_snapshot().last_synced_at.is_none());
    }

    #[test]
    fn sync_then_read_returns_same_snapshot() {
        let mut wallet = WalletReconciler::new();
        let mut s = snapshot(dec!(250.50), &[("BTC", dec!(0.5)), ("ETH", dec!(3))]);
        s.last_synced_at = Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());

        wallet.sync(s.clone());

        assert_eq!(wallet.current_snapshot(), &s);
        assert!(!wallet.is_stale());
    }

    #[test]
    fn sync_stamps_unstamped_snapshot() {
        let mut wallet = WalletReconciler::new();
        let before = Utc::now();
        wallet.sync(snapshot(dec!(1), &[]));
        let stamped = wallet.current_snapshot().last_synced_at.unwrap();
        assert!(stamped >= before);
    }

    #[test]
    fn buy_moves_fiat_into_asset() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(5000), &[("BTC", dec!(0.5))]));

        let buy = confirmed(1, "BTC", TradeAction::Buy, dec!(0.1), dec!(20000));
        let outcome = wallet.apply_confirmed(&buy);

        assert_eq!(outcome, ApplyOutcome::Applied);
        let s = wallet.current_snapshot();
        assert_eq!(s.fiat_balance, dec!(3000));
        assert_eq!(s.holding("BTC"), dec!(0.6));
        assert!(!wallet.is_stale());
    }

    #[test]
    fn overspend_is_accepted_locally_until_resync() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(1000), &[("BTC", dec!(0.5))]));

        let buy = confirmed(1, "BTC", TradeAction::Buy, dec!(0.1), dec!(20000));
        wallet.apply_confirmed(&buy);
        assert_eq!(wallet.current_snapshot().fiat_balance, dec!(-1000));
        assert_eq!(wallet.current_snapshot().holding("BTC"), dec!(0.6));
        assert!(!wallet.is_stale());

        let corrected = snapshot(dec!(1000), &[("BTC", dec!(0.5))]);
        wallet.sync(corrected.clone());
        assert_eq!(wallet.current_snapshot().fiat_balance, dec!(1000));
        assert_eq!(wallet.current_snapshot().holding("BTC"), dec!(0.5));
    }

    #[test]
    fn oversell_clamps_asset_but_credits_fiat() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(500), &[("ETH", dec!(1.0))]));

        let sell = confirmed(7, "ETH", TradeAction::Sell, dec!(2.0), dec!(100));
        let outcome = wallet.apply_confirmed(&sell);

        assert_eq!(
            outcome,
            ApplyOutcome::Clamped {
                symbol: "ETH".to_string(),
                shortfall: dec!(1.0),
            }
        );
        let s = wallet.current_snapshot();
        assert_eq!(s.holding("ETH"), Decimal::ZERO);
        assert_eq!(s.fiat_balance, dec!(700));
        assert!(wallet.is_stale());
    }

    #[test]
    fn sell_of_unheld_asset_clamps_to_zero() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(0), &[]));

        let sell = confirmed(1, "XRP", TradeAction::Sell, dec!(10), dec!(0.5));
        let outcome = wallet.apply_confirmed(&sell);

        assert!(matches!(outcome, ApplyOutcome::Clamped { .. }));
        assert_eq!(wallet.current_snapshot().holding("XRP"), Decimal::ZERO);
        assert_eq!(wallet.current_snapshot().fiat_balance, dec!(5));
    }

    #[test]
    fn resync_clears_staleness_after_clamp() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(500), &[("ETH", dec!(1.0))]));
        wallet.apply_confirmed(&confirmed(1, "ETH", TradeAction::Sell, dec!(2.0), dec!(100)));
        assert!(wallet.is_stale());

        wallet.sync(snapshot(dec!(600), &[("ETH", dec!(0))]));
        assert!(!wallet.is_stale());
    }

    #[test]
    fn confirmation_is_idempotent() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(1000), &[]));
        let tx = confirmed(3, "LTC", TradeAction::Buy, dec!(2), dec!(50));

        assert_eq!(wallet.apply_confirmed(&tx), ApplyOutcome::Applied);
        assert_eq!(wallet.apply_confirmed(&tx), ApplyOutcome::Duplicate);

        assert_eq!(wallet.current_snapshot().fiat_balance, dec!(900));
        assert_eq!(wallet.current_snapshot().holding("LTC"), dec!(2));
        assert!(wallet.was_applied(TxId(3)));
    }

    #[test]
    fn applied_ids_survive_resync() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(1000), &[]));
        let tx = confirmed(3, "LTC", TradeAction::Buy, dec!(2), dec!(50));
        wallet.apply_confirmed(&tx);

        let server = snapshot(dec!(900), &[("LTC", dec!(2))]);
        wallet.sync(server.clone());
        assert_eq!(wallet.apply_confirmed(&tx), ApplyOutcome::Duplicate);
        assert_eq!(wallet.current_snapshot().fiat_balance, dec!(900));
    }

    #[test]
    fn rejected_and_submitted_transactions_never_mutate() {
        let mut wallet = WalletReconciler::new();
        let start = snapshot(dec!(1000), &[("BTC", dec!(1))]);
        wallet.sync(start.clone());
        let expected = wallet.current_snapshot().clone();

        let pending = |id, action| {
            PendingTransaction::submitted(TxId(id), 90, "BTC", action, dec!(1), dec!(100))
        };
        let mut rejected = pending(1, TradeAction::Sell);
        rejected.reject();
        let submitted = pending(2, TradeAction::Buy);

        assert_eq!(
            wallet.apply_confirmed(&rejected),
            ApplyOutcome::NotConfirmed(TransactionStatus::Rejected)
        );
        assert_eq!(
            wallet.apply_confirmed(&submitted),
            ApplyOutcome::NotConfirmed(TransactionStatus::Submitted)
        );
        assert_eq!(wallet.current_snapshot(), &expected);
        assert!(!wallet.was_applied(TxId(1)));
    }

    #[test]
    fn holdings_stay_non_negative_over_mixed_sequence() {
        let mut wallet = WalletReconciler::new();
        wallet.sync(snapshot(dec!(100), &[("BTC", dec!(0.3)), ("ETH", dec!(2))]));

        let steps = [
            ("BTC", TradeAction::Sell, dec!(0.2)),
            ("ETH", TradeAction::Buy, dec!(1)),
            ("BTC", TradeAction::Sell, dec!(0.5)),
            ("ETH", TradeAction::Sell, dec!(4)),
            ("SOL", TradeAction::Sell, dec!(1)),
        ];
        for (i, (symbol, action, qty)) in steps.into_iter().enumerate() {
            wallet.apply_confirmed(&confirmed(i as u64, symbol, action, qty, dec!(10)));
            assert!(
                wallet
                    .current_snapshot()
                    .asset_balances
                    .values()
                    .all(|q| *q >= Decimal::ZERO)
            );
        }
        assert!(wallet.is_stale());
    }

    #[test]
    fn percent_of_fiat_for_buy() {
        let s = snapshot(dec!(1000), &[]);
        let qty = s.quantity_for_percent(TradeAction::Buy, "BTC", dec!(30000), dec!(50));
        assert_eq!(qty, dec!(0.01666666));
    }

    #[test]
    fn percent_of_holding_for_sell() {
        let s = snapshot(dec!(0), &[("ETH", dec!(3))]);
        let sell = |symbol, percent| {
            s.quantity_for_percent(TradeAction::Sell, symbol, dec!(2000), percent)
        };
        assert_eq!(sell("ETH", dec!(25)), dec!(0.75));
        assert_eq!(sell("ETH", dec!(250)), dec!(3));
        assert_eq!(sell("BTC", dec!(100)), dec!(0));
    }

    #[test]
    fn percent_buy_with_no_funds_or_price_is_zero() {
        let broke = snapshot(dec!(-20), &[]);
        let broke_qty = broke.quantity_for_percent(TradeAction::Buy, "BTC", dec!(100), dec!(100));
        assert_eq!(broke_qty, Decimal::ZERO);

        let funded = snapshot(dec!(20), &[]);
        let free_qty = funded.quantity_for_percent(TradeAction::Buy, "BTC", dec!(0), dec!(100));
        assert_eq!(free_qty, Decimal::ZERO);
    }
}
