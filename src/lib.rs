//! Client session and wallet reconciliation for a crypto trading backend.
//!
//! Provides a typed REST client for the backend, a local wallet cache that
//! stays consistent with the server across optimistic trade updates, and a
//! [`Session`](session::Session) tying both to one login.

pub mod api;
pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod session;
pub mod wallet;

pub use error::{Result, TradeDeskError};
