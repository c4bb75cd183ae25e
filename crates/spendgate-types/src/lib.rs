//! Spendgate Types - Canonical domain types for periodic spend limits
//!
//! This crate contains all foundational types for spendgate with zero
//! dependencies on other spendgate crates:
//!
//! - Identity types (`AccountId`, `Denom`)
//! - `Amount` and `Balances` with overflow-checked arithmetic
//! - `Period` and the pure calendar window calculator
//! - The error taxonomy shared across the workspace
//!
//! # Architectural Invariants
//!
//! 1. All amount arithmetic is checked — overflow is an explicit error
//! 2. Period windows are calendar-aligned, half-open, and UTC
//! 3. A spend that cannot be valued must never be treated as zero

pub mod amount;
pub mod error;
pub mod identity;
pub mod period;

pub use amount::*;
pub use error::*;
pub use identity::*;
pub use period::*;
