//! Error types for spendgate
//!
//! All failures are explicit. Setup problems surface as `Validation` and
//! never reach evaluation; valuation problems fail closed at the decision
//! point; host metering limits propagate unchanged.

use thiserror::Error;

/// Result type for spendgate operations
pub type Result<T> = std::result::Result<T, SpendgateError>;

/// Spendgate error types
#[derive(Debug, Clone, Error)]
pub enum SpendgateError {
    /// Bad configuration payload — rejected at setup time
    #[error("Invalid configuration: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// No liquidity route between two denominations
    #[error("No price route from {base} to {quote}")]
    RouteNotFound { base: String, quote: String },

    /// A route exists but a hop could not be priced
    #[error("No price for {base}/{quote} in pool {pool_id}")]
    PriceUnavailable {
        pool_id: u64,
        base: String,
        quote: String,
    },

    /// Overflow or underflow during checked arithmetic
    #[error("Arithmetic overflow during {operation}")]
    Arithmetic { operation: String },

    /// Host metering limit reached during collaborator access
    #[error("Resource budget exhausted: {message}")]
    ResourceExhausted { message: String },

    /// Persistence backend failure
    #[error("Store error: {message}")]
    Store { message: String },
}

impl SpendgateError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an arithmetic error
    pub fn arithmetic(operation: impl Into<String>) -> Self {
        Self::Arithmetic {
            operation: operation.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// True when the failure means a spend could not be valued.
    ///
    /// These errors convert into a Block decision instead of aborting the
    /// attempt: inability to compute a decision results in denial, never
    /// approval.
    pub fn is_fail_closed(&self) -> bool {
        matches!(
            self,
            Self::RouteNotFound { .. } | Self::PriceUnavailable { .. } | Self::Arithmetic { .. }
        )
    }
}
