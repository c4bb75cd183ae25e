//! Value-computation modes
//!
//! A mode turns the pre/post balance observation into a single reference-unit
//! spend value. Modes are a tagged variant, not a type hierarchy, so new
//! modes compose without touching the orchestration state machine.

use chrono::{DateTime, Utc};
use spendgate_oracle::ReferenceConverter;
use spendgate_types::{Amount, Balances, Result};

/// How a spend's reference value is computed from the observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Sum, per denomination, the reference value of every amount that left
    /// the account. Outflows are never netted against inflows in other
    /// denominations.
    AbsoluteValue,
}

impl ValueMode {
    /// Reference-unit value of the spend observed between `pre` and `post`.
    pub async fn compute(
        &self,
        pre: &Balances,
        post: &Balances,
        converter: &ReferenceConverter,
        at: DateTime<Utc>,
    ) -> Result<Amount> {
        match self {
            Self::AbsoluteValue => {
                let mut total = Amount::zero();
                for (denom, before) in pre.iter() {
                    let outgoing = before.saturating_sub(post.get(denom));
                    if outgoing.is_zero() {
                        continue;
                    }
                    let value = converter.value_in_reference(denom, outgoing, at).await?;
                    total = total.checked_add(value)?;
                }
                Ok(total)
            }
        }
    }
}
