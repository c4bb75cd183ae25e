//! Spendgate Authenticator - periodic spend-limit enforcement
//!
//! A pluggable authentication check that caps how much economic value an
//! account may move within a calendar period (day/week/month/year), valuing
//! spends in arbitrary assets against one reference denomination.
//!
//! # Protocol
//!
//! ```text
//! Initialize(payload) -> configured descriptor
//! Authenticate(account)      — snapshot pre-transfer balances; never blocks
//!   ... host executes the transfer ...
//! ConfirmExecution(account)  — value the spend, roll the window, decide
//! ```
//!
//! # Invariants
//!
//! 1. Confirmed accumulation never exceeds the configured allowance
//! 2. A new period window resets accumulation to zero before adding
//! 3. Valuation failures fail closed: Block, never a silent zero
//! 4. No partial ledger state on any failure or Block path

mod authenticator;
mod config;
mod value;

pub use authenticator::{BalanceReader, ConfirmationResult, EvalContext, SpendLimitAuthenticator};
pub use config::SpendLimitConfig;
pub use value::ValueMode;

// Collaborator surfaces hosts wire up alongside the authenticator
pub use spendgate_ledger::{MemoryStore, SledStore, StateStore};
pub use spendgate_oracle::{PoolPriceSource, PriceSource, ReferenceConverter};
pub use spendgate_types::{
    AccountId, Amount, Balances, Denom, Period, PeriodWindow, Result, SpendgateError,
};
