//! The spend-limit authenticator
//!
//! Two-phase protocol, per transaction:
//!
//! 1. `authenticate` observes the account's balances before the host
//!    executes the transfer — it never blocks.
//! 2. `confirm_execution` values what left the account, rolls the period
//!    window if needed, and confirms or blocks against the configured limit.
//!
//! The decision and the ledger mutation are atomic as a pair: a block never
//! leaves a partially updated ledger, a confirm never skips the update.

use std::sync::Arc;

use async_trait::async_trait;
use spendgate_ledger::{SpendLedger, StateStore};
use spendgate_oracle::{PriceSource, ReferenceConverter};
use spendgate_types::{AccountId, Amount, Balances, Denom, Result, SpendgateError};
use tracing::{debug, info, warn};

use crate::{SpendLimitConfig, ValueMode};

/// Scope under which the authenticator derives its ledger keys
const LEDGER_SCOPE: &str = "spend_limit";

/// Per-call evaluation context supplied by the host
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Evaluation time for window calculation and price lookups
    pub block_time: chrono::DateTime<chrono::Utc>,
}

impl EvalContext {
    pub fn at(block_time: chrono::DateTime<chrono::Utc>) -> Self {
        Self { block_time }
    }
}

/// Read access to an account's current balances
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn all_balances(&self, account: &AccountId) -> Result<Balances>;
}

/// Outcome of the confirmation phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// The transaction stays within the period limit
    Confirm,
    /// The transaction is denied; `reason` is human-readable
    Block { reason: String },
}

impl ConfirmationResult {
    pub fn block(reason: impl Into<String>) -> Self {
        Self::Block {
            reason: reason.into(),
        }
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self, Self::Confirm)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// Periodic spend-limit authenticator
///
/// Constructed once as an unconfigured template, then `initialize` produces
/// a configured descriptor per registration. The descriptor itself is
/// stateless; per-account state lives exclusively in the ledger.
#[derive(Clone)]
pub struct SpendLimitAuthenticator {
    ledger: SpendLedger,
    converter: ReferenceConverter,
    balances: Arc<dyn BalanceReader>,
    mode: ValueMode,
    config: Option<SpendLimitConfig>,
}

impl SpendLimitAuthenticator {
    pub fn new(
        store: Arc<dyn StateStore>,
        reference: Denom,
        mode: ValueMode,
        balances: Arc<dyn BalanceReader>,
        prices: Arc<dyn PriceSource>,
    ) -> Self {
        Self {
            ledger: SpendLedger::new(store, LEDGER_SCOPE),
            converter: ReferenceConverter::new(reference, prices),
            balances,
            mode,
            config: None,
        }
    }

    /// Parse and validate a registration payload, producing a configured
    /// authenticator. Fails with a validation error on a malformed payload;
    /// nothing invalid ever reaches evaluation.
    pub fn initialize(&self, data: &[u8]) -> Result<Self> {
        let config = SpendLimitConfig::parse(data)?;
        Ok(Self {
            config: Some(config),
            ..self.clone()
        })
    }

    fn config(&self) -> Result<SpendLimitConfig> {
        self.config.ok_or_else(|| {
            SpendgateError::validation("config", "authenticator has not been initialized")
        })
    }

    /// Observation phase: snapshot the account's balances before the host
    /// executes the transfer. Never blocks a transaction; collaborator
    /// failures (including resource exhaustion) propagate.
    pub async fn authenticate(&self, _ctx: &EvalContext, account: &AccountId) -> Result<()> {
        self.config()?;
        let balances = self.balances.all_balances(account).await?;
        debug!(%account, "recorded pre-execution balance snapshot");
        self.ledger.record_snapshot(account, balances).await
    }

    /// Confirmation phase: value the executed spend and decide.
    ///
    /// Valuation and accumulation failures fail closed (Block, ledger
    /// untouched). Store failures and resource exhaustion propagate as
    /// errors and abort the attempt. The snapshot is consumed up front, so
    /// it is cleared on every outcome.
    pub async fn confirm_execution(
        &self,
        ctx: &EvalContext,
        account: &AccountId,
    ) -> Result<ConfirmationResult> {
        let config = self.config()?;
        let now = ctx.block_time;
        let window = config.period.window_for(now);

        let post = self.balances.all_balances(account).await?;
        let pre = self.ledger.take_snapshot(account).await?.unwrap_or_default();

        let spend_value = match self.mode.compute(&pre, &post, &self.converter, now).await {
            Ok(value) => value,
            Err(err) if err.is_fail_closed() => {
                warn!(%account, error = %err, "spend valuation failed, blocking");
                return Ok(ConfirmationResult::block(format!(
                    "cannot value spend: {err}"
                )));
            }
            Err(err) => return Err(err),
        };

        let state = self.ledger.get(account).await?;
        let carried = if state.window_start == Some(window.start) {
            state.accumulated
        } else {
            Amount::zero()
        };
        let projected = match carried.checked_add(spend_value) {
            Ok(projected) => projected,
            Err(err) => {
                warn!(%account, error = %err, "spend accumulation overflow, blocking");
                return Ok(ConfirmationResult::block("spend accumulation overflow"));
            }
        };

        if projected > config.allowed {
            info!(
                %account, %projected, allowed = %config.allowed, period = %config.period,
                "period spend limit exceeded"
            );
            return Ok(ConfirmationResult::block("period spend limit exceeded"));
        }

        let state = self.ledger.apply_spend(account, &window, spend_value).await?;
        debug!(%account, accumulated = %state.accumulated, "spend confirmed");
        Ok(ConfirmationResult::Confirm)
    }
}
