//! One logged-in user's client state.
//!
//! [`Session`] owns the only [`WalletReconciler`] for the session together
//! with the [`ApiClient`] that feeds it, so every screen that shows or
//! changes balances goes through the same cache. Trades run the
//! Submitted → Confirmed/Rejected state machine here: only a 2xx from the
//! backend leads to an optimistic delta, and nothing is retried.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::chat::{ChatTranscript, Speaker};
use crate::config::AppConfig;
use crate::models::{
    CurrencyDetail, LoginRequest, RegisterRequest, TradeAction, TransactionRecord,
    holding_key_for_symbol,
};
use crate::wallet::{ApplyOutcome, PendingTransaction, TxId, WalletReconciler, WalletSnapshot};
use crate::{Result, TradeDeskError};

/// A confirmed trade and what the wallet cache did with it.
#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub transaction: PendingTransaction,
    pub outcome: ApplyOutcome,
    /// Confirmation text returned by the backend.
    pub message: String,
}

pub struct Session {
    client: ApiClient,
    wallet: WalletReconciler,
    quotes: HashMap<u32, CurrencyDetail>,
    chat: ChatTranscript,
    next_tx_id: u64,
}

impl Session {
    /// Starts a session. If the configuration carries an API key the session
    /// is already authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_client(ApiClient::new(&config.backend)?, config.chat_history))
    }

    /// Starts a session around an existing client.
    pub fn with_client(client: ApiClient, chat_history: usize) -> Self {
        Self {
            client,
            wallet: WalletReconciler::new(),
            quotes: HashMap::new(),
            chat: ChatTranscript::new(chat_history),
            next_tx_id: 1,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_authenticated()
    }

    /// Logs in and starts from a fresh, never-synced wallet.
    ///
    /// # Errors
    ///
    /// Returns the login call's error; the session stays as it was.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let response = self.client.login(&LoginRequest::new(email, password)).await?;
        self.reset();
        self.client.set_api_key(response.api_key);
        Ok(())
    }

    /// Registers a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the registration call's error.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<()> {
        self.client
            .register(&RegisterRequest::new(email, username, password))
            .await
    }

    /// Forgets the API key and everything cached for it.
    pub fn logout(&mut self) {
        self.client.clear_api_key();
        self.reset();
        info!("logged out");
    }

    fn reset(&mut self) {
        self.wallet = WalletReconciler::new();
        self.quotes.clear();
        self.chat.clear();
    }

    /// Replaces the cached wallet with the server's.
    ///
    /// # Errors
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// returned; nothing is retried.
    pub async fn refresh_wallet(&mut self) -> Result<&WalletSnapshot> {
        let snapshot = self.client.wallet_balance().await?;
        self.wallet.sync(snapshot);
        Ok(self.wallet.current_snapshot())
    }

    /// The wallet for display, syncing first when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns the sync error; the stale cache remains readable through
    /// [`wallet_cached`](Self::wallet_cached).
    pub async fn wallet(&mut self) -> Result<&WalletSnapshot> {
        if self.wallet.is_stale() {
            return self.refresh_wallet().await;
        }
        Ok(self.wallet.current_snapshot())
    }

    /// The cached wallet without touching the network.
    pub fn wallet_cached(&self) -> &WalletSnapshot {
        self.wallet.current_snapshot()
    }

    pub fn wallet_is_stale(&self) -> bool {
        self.wallet.is_stale()
    }

    /// Opens a currency's detail view: fetches its quote and history, then
    /// resyncs the wallet.
    ///
    /// The quote is kept even if the wallet sync fails, in which case the
    /// sync error is returned.
    ///
    /// # Errors
    ///
    /// Returns the currency call's error, or the wallet sync error.
    pub async fn open_currency(&mut self, id: u32) -> Result<&CurrencyDetail> {
        let detail = self.client.currency_info(id).await?;
        self.quotes.insert(id, detail);
        self.refresh_wallet().await?;
        self.quotes
            .get(&id)
            .ok_or(TradeDeskError::UnknownCurrency(id))
    }

    /// The last detail fetched for a currency.
    pub fn quote(&self, id: u32) -> Option<&CurrencyDetail> {
        self.quotes.get(&id)
    }

    /// Buys or sells `quantity` of a currency at its last quoted price.
    ///
    /// The local delta lands on the holding the backend books the coin
    /// under, so coins without their own column move the `OTHER` balance.
    ///
    /// # Errors
    ///
    /// Fails without contacting the backend for a non-positive quantity or a
    /// currency that was never opened. Otherwise a rejection or network
    /// failure from the backend marks the transaction rejected, leaves the
    /// wallet untouched, and is returned.
    pub async fn trade(
        &mut self,
        id: u32,
        action: TradeAction,
        quantity: Decimal,
    ) -> Result<TradeReceipt> {
        if quantity <= Decimal::ZERO {
            return Err(TradeDeskError::InvalidQuantity(quantity));
        }
        let (symbol, unit_price) = match self.quotes.get(&id) {
            Some(quote) => (holding_key_for_symbol(quote.symbol()), quote.price()),
            None => return Err(TradeDeskError::UnknownCurrency(id)),
        };
        let mut tx = PendingTransaction::submitted(
            self.allocate_tx_id(),
            id,
            symbol,
            action,
            quantity,
            unit_price,
        );

        match self.client.submit_transaction(&tx).await {
            Ok(message) => {
                tx.confirm();
                let outcome = self.wallet.apply_confirmed(&tx);
                info!(tx = %tx.id, ?outcome, "transaction confirmed");
                Ok(TradeReceipt {
                    transaction: tx,
                    outcome,
                    message,
                })
            }
            Err(e) => {
                tx.reject();
                warn!(tx = %tx.id, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }

    /// Suggests a trade quantity from a percentage of the funding balance.
    ///
    /// # Errors
    ///
    /// Returns [`TradeDeskError::UnknownCurrency`] for a currency that was
    /// never opened.
    pub fn quantity_for_percent(
        &self,
        id: u32,
        action: TradeAction,
        percent: Decimal,
    ) -> Result<Decimal> {
        let quote = self
            .quotes
            .get(&id)
            .ok_or(TradeDeskError::UnknownCurrency(id))?;
        let key = holding_key_for_symbol(quote.symbol());
        Ok(self
            .wallet
            .current_snapshot()
            .quantity_for_percent(action, &key, quote.price(), percent))
    }

    /// Deposits USD and resyncs, since fiat is only ever replaced by a sync
    /// outside of trades.
    ///
    /// # Errors
    ///
    /// Returns the deposit error (nothing changes locally), or the resync
    /// error after a successful deposit.
    pub async fn deposit(&mut self, amount: Decimal) -> Result<&WalletSnapshot> {
        if amount <= Decimal::ZERO {
            return Err(TradeDeskError::InvalidQuantity(amount));
        }
        self.client.add_money(amount).await?;
        self.refresh_wallet().await
    }

    /// # Errors
    ///
    /// Returns the history call's error.
    pub async fn transaction_history(&self) -> Result<Vec<TransactionRecord>> {
        self.client.transactions_history().await
    }

    /// Sends a prompt to the agent and records both sides in the transcript.
    ///
    /// # Errors
    ///
    /// Returns the agent call's error; the prompt stays in the transcript.
    pub async fn ask_agent(&mut self, prompt: &str) -> Result<String> {
        self.chat.push(Speaker::User, prompt);
        let reply = self.client.ask_agent(prompt).await?;
        self.chat.push(Speaker::Agent, reply.clone());
        Ok(reply)
    }

    pub fn chat(&self) -> &ChatTranscript {
        &self.chat
    }

    fn allocate_tx_id(&mut self) -> TxId {
        let id = TxId(self.next_tx_id);
        self.next_tx_id += 1;
        id
    }
}
