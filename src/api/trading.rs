//! Wallet and trade endpoints.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{ADD_MONEY_PATH, ApiClient, TRANSACTIONS_HISTORY_PATH, WALLET_BALANCE_PATH};
use crate::Result;
use crate::models::{TransactionRecord, TransactionsHistoryResponse, WalletBalanceResponse};
use crate::wallet::{PendingTransaction, WalletSnapshot};

impl ApiClient {
    /// Fetches the authoritative wallet, stamped with the time it arrived.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::NotAuthenticated`](crate::TradeDeskError::NotAuthenticated)
    /// without a key, a rejection or network error from the call, or
    /// [`TradeDeskError::MalformedMessage`](crate::TradeDeskError::MalformedMessage)
    /// if the balances cannot be read.
    pub async fn wallet_balance(&self) -> Result<WalletSnapshot> {
        let builder = self.authed(self.get(WALLET_BALANCE_PATH)?)?;
        let response = self.execute("wallet_balance", builder).await?;
        let body: WalletBalanceResponse = Self::json(response).await?;
        body.into_snapshot(Utc::now())
    }

    /// Credits the wallet with `amount` USD.
    ///
    /// # Errors
    ///
    /// Returns a rejection or network error from the call.
    pub async fn add_money(&self, amount: Decimal) -> Result<()> {
        let form = [("amount", amount.to_string())];
        let builder = self.authed(self.post(ADD_MONEY_PATH)?)?.form(&form);
        self.execute("add_money", builder).await?;
        info!(%amount, "added money");
        Ok(())
    }

    /// Asks the backend to execute a buy or sell.
    ///
    /// A successful return means the backend has durably applied the trade.
    /// Returns the backend's confirmation text, or an empty string when the
    /// status was 2xx but the body could not be read.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::Rejected`](crate::TradeDeskError::Rejected)
    /// when the backend refuses (e.g. insufficient funds) and
    /// [`TradeDeskError::Network`](crate::TradeDeskError::Network) when no
    /// answer arrived.
    pub async fn submit_transaction(&self, tx: &PendingTransaction) -> Result<String> {
        let path = format!("APIServices/{}", tx.action.as_str());
        let form = [
            ("id", tx.asset_id.to_string()),
            ("amount", tx.quantity.to_string()),
        ];
        let builder = self.authed(self.post(&path)?)?.form(&form);
        let response = self.execute("submit_transaction", builder).await?;
        // A 2xx means the trade is booked, even if the body is lost.
        let message = match response.text().await {
            Ok(message) => message,
            Err(e) => {
                warn!(tx = %tx.id, error = %e, "confirmation body unreadable");
                String::new()
            }
        };
        info!(
            tx = %tx.id,
            action = tx.action.as_str(),
            asset_id = tx.asset_id,
            quantity = %tx.quantity,
            "transaction accepted"
        );
        Ok(message)
    }

    /// Lists the account's past trades, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a rejection, network, or JSON error.
    pub async fn transactions_history(&self) -> Result<Vec<TransactionRecord>> {
        let builder = self.authed(self.get(TRANSACTIONS_HISTORY_PATH)?)?;
        let response = self.execute("transactions_history", builder).await?;
        let body: TransactionsHistoryResponse = Self::json(response).await?;
        Ok(body.transactions_history)
    }
}
