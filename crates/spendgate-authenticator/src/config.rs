//! Configuration payload parsing
//!
//! The host hands us a loosely-typed JSON record at registration time. It is
//! mapped onto a strict typed structure with exhaustive field validation
//! here, once, so evaluation never sees a malformed configuration.

use serde::Deserialize;
use spendgate_types::{Amount, Period, Result, SpendgateError};

/// Validated spend-limit configuration
///
/// Immutable after creation. The reference denomination and value mode are
/// fixed by the authenticator template, not by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendLimitConfig {
    /// Maximum spend per period window, in reference units
    pub allowed: Amount,
    /// The calendar period the limit applies to
    pub period: Period,
}

/// Raw wire shape: both fields optional so their absence is reported as a
/// validation failure rather than a generic decode error. Unknown fields are
/// ignored.
#[derive(Debug, Deserialize)]
struct RawSpendLimitConfig {
    allowed: Option<i128>,
    period: Option<String>,
}

impl SpendLimitConfig {
    /// Parse and validate an initialization payload.
    ///
    /// Rejected: unparseable JSON, missing `allowed`, negative `allowed`,
    /// missing `period`, unrecognized `period`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw: RawSpendLimitConfig = serde_json::from_slice(data)
            .map_err(|e| SpendgateError::validation("payload", e.to_string()))?;

        let allowed = raw
            .allowed
            .ok_or_else(|| SpendgateError::validation("allowed", "missing required field"))?;
        if allowed < 0 {
            return Err(SpendgateError::validation(
                "allowed",
                "must be non-negative",
            ));
        }

        let period = raw
            .period
            .ok_or_else(|| SpendgateError::validation("period", "missing required field"))?;
        let period = match period.as_str() {
            "day" => Period::Day,
            "week" => Period::Week,
            "month" => Period::Month,
            "year" => Period::Year,
            other => {
                return Err(SpendgateError::validation(
                    "period",
                    format!("unrecognized period \"{other}\""),
                ))
            }
        };

        Ok(Self {
            allowed: Amount::new(allowed as u128),
            period,
        })
    }
}
