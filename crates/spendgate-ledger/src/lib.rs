//! Spendgate Ledger - persisted per-account spend accumulation
//!
//! The ledger tracks, per account:
//! - the start of the period window the accumulation belongs to
//! - the spend accumulated within that window, in reference units
//! - a transient pre-execution balance snapshot, set by the observation
//!   phase and consumed by the confirmation phase
//!
//! # Invariants
//!
//! 1. Accumulation is overflow-checked; on overflow nothing is persisted
//! 2. The first write under a new window resets accumulation to zero
//! 3. `take_snapshot` clears the snapshot in the same round-trip that reads
//!    it, so it can never be read stale across transactions or periods
//! 4. State is created lazily (zero value) and never deleted

mod store;

pub use store::{MemoryStore, SledStore, StateStore};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendgate_types::{AccountId, Amount, Balances, PeriodWindow, Result, SpendgateError};
use tracing::debug;

/// Persisted per-account spend state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendState {
    /// Start instant of the window the accumulation belongs to
    pub window_start: Option<DateTime<Utc>>,
    /// Spend accumulated within the current window, in reference units
    pub accumulated: Amount,
    /// Pre-execution balances; set by the observation phase, cleared by the
    /// confirmation phase regardless of outcome
    pub snapshot: Option<Balances>,
}

/// Keyed access to per-account spend state
///
/// Keys are derived from the account identity under an instance scope, so
/// several authenticator instances can share one store without collisions.
#[derive(Clone)]
pub struct SpendLedger {
    store: Arc<dyn StateStore>,
    scope: String,
}

impl SpendLedger {
    pub fn new(store: Arc<dyn StateStore>, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    fn key(&self, account: &AccountId) -> Vec<u8> {
        format!("{}/spend_state/{}", self.scope, account).into_bytes()
    }

    /// Spend state for an account, zero value if absent.
    pub async fn get(&self, account: &AccountId) -> Result<SpendState> {
        match self.store.get(&self.key(account)).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SpendgateError::store(format!("corrupt spend state: {e}"))),
            None => Ok(SpendState::default()),
        }
    }

    async fn put(&self, account: &AccountId, state: &SpendState) -> Result<()> {
        let bytes = serde_json::to_vec(state)
            .map_err(|e| SpendgateError::store(format!("encode spend state: {e}")))?;
        self.store.put(&self.key(account), bytes).await
    }

    /// Store the pre-execution balances without touching accumulation or
    /// window. A later call overwrites any previous snapshot.
    pub async fn record_snapshot(&self, account: &AccountId, balances: Balances) -> Result<()> {
        let mut state = self.get(account).await?;
        state.snapshot = Some(balances);
        self.put(account, &state).await
    }

    /// Read and clear the snapshot in one round-trip.
    ///
    /// The clear persists even when the caller subsequently blocks, so a
    /// snapshot never leaks into an unrelated transaction.
    pub async fn take_snapshot(&self, account: &AccountId) -> Result<Option<Balances>> {
        let mut state = self.get(account).await?;
        let snapshot = state.snapshot.take();
        if snapshot.is_some() {
            self.put(account, &state).await?;
        }
        Ok(snapshot)
    }

    /// Add `delta` to the accumulation under `window`.
    ///
    /// A stored window different from `window` resets the accumulation to
    /// zero before adding. Overflow returns an arithmetic error and persists
    /// nothing.
    pub async fn apply_spend(
        &self,
        account: &AccountId,
        window: &PeriodWindow,
        delta: Amount,
    ) -> Result<SpendState> {
        let mut state = self.get(account).await?;

        let carried = if state.window_start == Some(window.start) {
            state.accumulated
        } else {
            if state.window_start.is_some() {
                debug!(%account, window = %window, "period rolled over, accumulation reset");
            }
            Amount::zero()
        };

        state.accumulated = carried.checked_add(delta)?;
        state.window_start = Some(window.start);
        self.put(account, &state).await?;
        Ok(state)
    }
}
