//! Line-oriented command front end.
//!
//! Each input line parses into a [`Command`]; [`execute`] runs it against a
//! [`Session`] and returns the text to print.

use std::fmt::Write;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::Result;
use crate::chat::ChatTranscript;
use crate::models::{CATALOG, CurrencyDetail, TradeAction};
use crate::session::{Session, TradeReceipt};
use crate::wallet::{ApplyOutcome, WalletSnapshot};

pub const HELP: &str = "\
commands:
  login <email> <password>
  register <email> <username> <password>
  logout
  currencies                 list tradable currencies
  view <id>                  open a currency (quote, history, wallet sync)
  wallet                     show balances (syncs if stale)
  refresh                    force a wallet sync
  buy <id> <qty>
  sell <id> <qty>
  max <buy|sell> <id> <pct>  quantity for a percentage of your balance
  deposit <amount>
  history                    past transactions
  ask <prompt...>            chat with the AI agent
  chat                       show the conversation so far
  help
  quit";

/// A parsed user command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Register { email: String, username: String, password: String },
    Logout,
    Currencies,
    View(u32),
    Wallet,
    Refresh,
    Trade { action: TradeAction, id: u32, quantity: Decimal },
    Max { action: TradeAction, id: u32, percent: Decimal },
    Deposit(Decimal),
    History,
    Ask(String),
    Chat,
    Help,
    Quit,
}

/// Why a line did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, ParseError> {
    let line = line.trim();
    let Some((word, rest)) = split_word(line) else {
        return Ok(None);
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "login" => {
            let [email, password] = exact::<2>(&args, "login <email> <password>")?;
            Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }
        }
        "register" => {
            let [email, username, password] =
                exact::<3>(&args, "register <email> <username> <password>")?;
            Command::Register {
                email: email.to_string(),
                username: username.to_string(),
                password: password.to_string(),
            }
        }
        "logout" => Command::Logout,
        "currencies" | "list" => Command::Currencies,
        "view" => {
            let [id] = exact::<1>(&args, "view <id>")?;
            Command::View(number(id, "currency id")?)
        }
        "wallet" | "balance" => Command::Wallet,
        "refresh" => Command::Refresh,
        "buy" | "sell" => {
            let action = TradeAction::from_str(word).map_err(ParseError)?;
            let [id, qty] = exact::<2>(&args, "buy|sell <id> <qty>")?;
            Command::Trade {
                action,
                id: number(id, "currency id")?,
                quantity: number(qty, "quantity")?,
            }
        }
        "max" => {
            let [action, id, percent] = exact::<3>(&args, "max <buy|sell> <id> <pct>")?;
            Command::Max {
                action: TradeAction::from_str(action).map_err(ParseError)?,
                id: number(id, "currency id")?,
                percent: number(percent.trim_end_matches('%'), "percent")?,
            }
        }
        "deposit" => {
            let [amount] = exact::<1>(&args, "deposit <amount>")?;
            Command::Deposit(number(amount.trim_start_matches('$'), "amount")?)
        }
        "history" => Command::History,
        "ask" => {
            if rest.trim().is_empty() {
                return Err(ParseError("usage: ask <prompt...>".into()));
            }
            Command::Ask(rest.trim().to_string())
        }
        "chat" => Command::Chat,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(ParseError(format!(
                "unknown command {other:?}; try `help`"
            )));
        }
    };

    Ok(Some(command))
}

fn split_word(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    Some(line.split_once(char::is_whitespace).unwrap_or((line, "")))
}

fn exact<'a, const N: usize>(
    args: &[&'a str],
    usage: &str,
) -> std::result::Result<[&'a str; N], ParseError> {
    <[&str; N]>::try_from(args).map_err(|_| ParseError(format!("usage: {usage}")))
}

fn number<T: FromStr>(raw: &str, what: &str) -> std::result::Result<T, ParseError> {
    raw.parse()
        .map_err(|_| ParseError(format!("{what} must be a number, got {raw:?}")))
}

/// Runs a command and returns the text to show.
///
/// # Errors
///
/// Returns whatever the session operation returned; the caller reports it
/// and keeps going.
pub async fn execute(session: &mut Session, command: Command) -> Result<String> {
    let output = match command {
        Command::Login { email, password } => {
            session.login(&email, &password).await?;
            format!("logged in as {email}")
        }
        Command::Register {
            email,
            username,
            password,
        } => {
            session.register(&email, &username, &password).await?;
            "registered; you can log in now".to_string()
        }
        Command::Logout => {
            session.logout();
            "logged out".to_string()
        }
        Command::Currencies => {
            let mut out = String::new();
            for entry in &CATALOG {
                let _ = writeln!(out, "{:>4}  {} ({})", entry.id, entry.name, entry.symbol);
            }
            out
        }
        Command::View(id) => format_detail(session.open_currency(id).await?),
        Command::Wallet => format_wallet(session.wallet().await?, false),
        Command::Refresh => format_wallet(session.refresh_wallet().await?, false),
        Command::Trade {
            action,
            id,
            quantity,
        } => {
            let receipt = session.trade(id, action, quantity).await?;
            let mut out = format_receipt(&receipt);
            out.push('\n');
            out.push_str(&format_wallet(
                session.wallet_cached(),
                session.wallet_is_stale(),
            ));
            out
        }
        Command::Max {
            action,
            id,
            percent,
        } => {
            let quantity = session.quantity_for_percent(id, action, percent)?;
            format!("{action} up to {quantity} at {percent}% of balance")
        }
        Command::Deposit(amount) => {
            let wallet = session.deposit(amount).await?;
            format!("deposited ${amount}\n{}", format_wallet(wallet, false))
        }
        Command::History => {
            let records = session.transaction_history().await?;
            if records.is_empty() {
                return Ok("no transactions yet".to_string());
            }
            let mut out = String::new();
            for r in records {
                let _ = writeln!(
                    out,
                    "{}  {:<4} id={:<4} {} @ ${}",
                    r.date_time.format("%Y-%m-%d %H:%M"),
                    r.action,
                    r.crypto_id,
                    r.amount,
                    r.price_at_transaction
                );
            }
            out
        }
        Command::Ask(prompt) => {
            let reply = session.ask_agent(&prompt).await?;
            format!("AI Agent: {reply}")
        }
        Command::Chat => format_chat(session.chat()),
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}

/// Renders balances, flagging a cache that needs a resync.
pub fn format_wallet(wallet: &WalletSnapshot, stale: bool) -> String {
    let mut out = format!("Wallet: ${:.2}", wallet.fiat_balance);
    for (symbol, qty) in &wallet.asset_balances {
        let _ = write!(out, "\n  {symbol}: {qty}");
    }
    match (stale, wallet.last_synced_at) {
        (true, _) => out.push_str("\n  (out of date; run `wallet` to resync)"),
        (false, Some(at)) => {
            let _ = write!(out, "\n  synced {}", at.format("%H:%M:%S UTC"));
        }
        (false, None) => {}
    }
    out
}

/// Renders the agent conversation, one labelled line per message.
pub fn format_chat(chat: &ChatTranscript) -> String {
    if chat.is_empty() {
        return "no messages yet; try `ask <prompt>`".to_string();
    }
    let mut out = String::new();
    for line in chat.lines() {
        let _ = writeln!(out, "{}: {}", line.speaker.label(), line.text);
    }
    out
}

fn format_detail(detail: &CurrencyDetail) -> String {
    let t = &detail.ticker;
    let mut out = format!(
        "{} ({}) | Rank: {} | Current price: {}$",
        t.name, t.symbol, t.rank, t.price_usd
    );
    if let Some(change) = t.percent_change_24h {
        let _ = write!(out, " | 24h: {change}%");
    }
    if let Some((lo, hi)) = detail.history.range() {
        let _ = write!(
            out,
            "\nHistory: {} points, low {lo}, high {hi}",
            detail.history.points.len()
        );
    }
    out
}

fn format_receipt(receipt: &TradeReceipt) -> String {
    let tx = &receipt.transaction;
    let mut out = format!(
        "{} {} {} {} at ${} (total ${:.2})",
        tx.id,
        tx.action,
        tx.quantity,
        tx.symbol,
        tx.unit_price,
        tx.notional()
    );
    if !receipt.message.is_empty() {
        let _ = write!(out, "\n{}", receipt.message.trim_matches('"'));
    }
    if let ApplyOutcome::Clamped { symbol, .. } = &receipt.outcome {
        let _ = write!(
            out,
            "\nlocal {symbol} balance disagreed with the server; resync pending"
        );
    }
    out
}
