//! End-to-end spend-limit scenarios
//!
//! Each grid drives the full two-phase protocol: observe, execute a transfer
//! against the in-memory bank, confirm. Spends are in the reference
//! denomination unless a scenario says otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use spendgate_authenticator::{
    AccountId, Amount, BalanceReader, Balances, ConfirmationResult, Denom, EvalContext,
    MemoryStore, PoolPriceSource, Result, SpendLimitAuthenticator, ValueMode,
};
use tokio::sync::RwLock;

const REFERENCE: &str = "uusd";

fn account() -> AccountId {
    AccountId::from("cosmos1testaccount")
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// In-memory bank: the external transfer executor and balance collaborator
struct Bank {
    accounts: RwLock<HashMap<AccountId, Balances>>,
}

impl Bank {
    fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    async fn mint(&self, account: &AccountId, denom: &str, amount: u128) {
        let mut accounts = self.accounts.write().await;
        let balances = accounts.entry(account.clone()).or_default();
        let denom = Denom::from(denom);
        let current = balances.get(&denom);
        balances.set(denom, current.checked_add(Amount::new(amount)).unwrap());
    }

    /// Execute an outgoing transfer (the part of the pipeline between the
    /// two authenticator phases).
    async fn send_out(&self, account: &AccountId, denom: &str, amount: u128) {
        let mut accounts = self.accounts.write().await;
        let balances = accounts.entry(account.clone()).or_default();
        let denom = Denom::from(denom);
        let current = balances.get(&denom);
        balances.set(denom, current.checked_sub(Amount::new(amount)).unwrap());
    }
}

#[async_trait]
impl BalanceReader for Bank {
    async fn all_balances(&self, account: &AccountId) -> Result<Balances> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(account).cloned().unwrap_or_default())
    }
}

struct Suite {
    bank: Arc<Bank>,
    auth: SpendLimitAuthenticator,
}

impl Suite {
    async fn new(payload: &[u8]) -> Self {
        let bank = Arc::new(Bank::new());
        bank.mint(&account(), REFERENCE, 1_000_000).await;
        bank.mint(&account(), "uatom", 1_000_000).await;

        let prices = PoolPriceSource::new();
        prices
            .register_pool(Denom::from("uatom"), Denom::from(REFERENCE), dec!(10))
            .await;

        let auth = SpendLimitAuthenticator::new(
            Arc::new(MemoryStore::new()),
            Denom::from(REFERENCE),
            ValueMode::AbsoluteValue,
            bank.clone(),
            Arc::new(prices),
        )
        .initialize(payload)
        .unwrap();

        Self { bank, auth }
    }

    /// One full transaction: observe at `t`, transfer, confirm at `t`.
    async fn spend(&self, t: DateTime<Utc>, denom: &str, amount: u128) -> ConfirmationResult {
        let ctx = EvalContext::at(t);
        self.auth.authenticate(&ctx, &account()).await.unwrap();
        self.bank.send_out(&account(), denom, amount).await;
        self.auth.confirm_execution(&ctx, &account()).await.unwrap()
    }

    async fn run_grid(&self, steps: &[(DateTime<Utc>, u128, bool)]) {
        for (i, (t, amount, expect_confirm)) in steps.iter().enumerate() {
            let result = self.spend(*t, REFERENCE, *amount).await;
            assert_eq!(
                result.is_confirm(),
                *expect_confirm,
                "step {i}: spend {amount} at {t} -> {result:?}"
            );
        }
    }
}

#[tokio::test]
async fn day_limit_with_accumulated_spends() {
    let suite = Suite::new(br#"{"allowed": 100, "period": "day"}"#).await;
    suite
        .run_grid(&[
            (at(2024, 1, 1, 0, 0, 0), 150, false),
            (at(2024, 1, 1, 0, 0, 0), 30, true),
            (at(2024, 1, 1, 12, 0, 0), 40, true),
            // New day: accumulation reset, 31 fits
            (at(2024, 1, 2, 0, 0, 0), 31, true),
            (at(2024, 1, 2, 12, 0, 0), 50, true),
            (at(2024, 1, 3, 12, 0, 0), 50, true),
            // Exactly at the limit confirms; one more unit blocks
            (at(2024, 1, 3, 12, 0, 0), 50, true),
            (at(2024, 1, 3, 12, 0, 0), 1, false),
            (at(2024, 1, 4, 12, 0, 0), 1, true),
        ])
        .await;
}

#[tokio::test]
async fn week_limit_with_monday_anchoring() {
    let suite = Suite::new(br#"{"allowed": 200, "period": "week"}"#).await;
    suite
        .run_grid(&[
            // 2024-01-01 is a Monday; Jan 1..7 share a window
            (at(2024, 1, 1, 0, 0, 0), 100, true),
            (at(2024, 1, 4, 0, 0, 0), 50, true),
            (at(2024, 1, 7, 0, 0, 0), 51, false),
            // Monday Jan 8 starts a fresh window
            (at(2024, 1, 8, 0, 0, 0), 150, true),
            (at(2024, 2, 8, 0, 0, 0), 200, true),
            // Feb 11 (Sunday) is still the week of Feb 8
            (at(2024, 2, 11, 15, 0, 6), 200, false),
            (at(2024, 2, 12, 15, 0, 6), 200, true),
        ])
        .await;
}

#[tokio::test]
async fn month_limit_with_accumulated_spends() {
    let suite = Suite::new(br#"{"allowed": 300, "period": "month"}"#).await;
    suite
        .run_grid(&[
            (at(2024, 1, 1, 0, 0, 0), 100, true),
            (at(2024, 1, 15, 0, 0, 0), 100, true),
            (at(2024, 1, 31, 0, 0, 0), 101, false),
            (at(2024, 2, 1, 0, 0, 0), 150, true),
            (at(2025, 2, 1, 0, 0, 0), 300, true),
        ])
        .await;
}

#[tokio::test]
async fn year_limit_with_accumulated_spends() {
    let suite = Suite::new(br#"{"allowed": 500, "period": "year"}"#).await;
    suite
        .run_grid(&[
            (at(2024, 1, 1, 0, 0, 0), 200, true),
            (at(2024, 6, 1, 0, 0, 0), 200, true),
            (at(2024, 12, 31, 0, 0, 0), 101, false),
            (at(2024, 12, 31, 0, 0, 0), 300, false),
            // 200 + 200 + 99 lands exactly on the allowance
            (at(2024, 12, 31, 0, 0, 0), 99, true),
            (at(2025, 1, 1, 0, 0, 0), 300, true),
            // A multi-year gap still resets to a single fresh window
            (at(2028, 1, 1, 0, 0, 0), 500, true),
            (at(2028, 6, 10, 0, 0, 0), 1, false),
        ])
        .await;
}

#[tokio::test]
async fn sum_of_confirmed_spends_is_the_accumulation() {
    let suite = Suite::new(br#"{"allowed": 100, "period": "day"}"#).await;
    let t = at(2024, 1, 1, 9, 0, 0);

    for amount in [10, 20, 30] {
        assert!(suite.spend(t, REFERENCE, amount).await.is_confirm());
    }

    // 60 accumulated: 41 exceeds, 40 lands exactly on the limit
    assert!(suite.spend(t, REFERENCE, 41).await.is_block());
    assert!(suite.spend(t, REFERENCE, 40).await.is_confirm());
    assert!(suite.spend(t, REFERENCE, 1).await.is_block());
}

#[tokio::test]
async fn window_is_taken_at_confirmation_time() {
    // Observation just before midnight, confirmation just after: the spend
    // counts against the new day's window.
    let suite = Suite::new(br#"{"allowed": 100, "period": "day"}"#).await;

    let observe = EvalContext::at(at(2023, 12, 31, 23, 59, 59));
    let confirm = EvalContext::at(at(2024, 1, 1, 0, 0, 1));

    suite.auth.authenticate(&observe, &account()).await.unwrap();
    suite.bank.send_out(&account(), REFERENCE, 80).await;
    let result = suite
        .auth
        .confirm_execution(&confirm, &account())
        .await
        .unwrap();
    assert!(result.is_confirm());

    // The 80 belongs to Jan 1: only 20 of that day's budget remains
    assert!(suite
        .spend(at(2024, 1, 1, 6, 0, 0), REFERENCE, 21)
        .await
        .is_block());
    assert!(suite
        .spend(at(2024, 1, 1, 6, 0, 0), REFERENCE, 20)
        .await
        .is_confirm());
}

#[tokio::test]
async fn non_reference_spends_are_priced_through_pools() {
    // uatom is worth 10 uusd; allowed = 100 uusd per day
    let suite = Suite::new(br#"{"allowed": 100, "period": "day"}"#).await;
    let t = at(2024, 1, 1, 10, 0, 0);

    // 5 uatom = 50 uusd
    assert!(suite.spend(t, "uatom", 5).await.is_confirm());
    // 6 uatom = 60 uusd, projected 110: blocked
    assert!(suite.spend(t, "uatom", 6).await.is_block());
    // 5 uatom = 50 uusd, projected exactly 100: confirmed
    assert!(suite.spend(t, "uatom", 5).await.is_confirm());
    // The next day prices against a fresh window
    assert!(suite
        .spend(at(2024, 1, 2, 10, 0, 0), "uatom", 10)
        .await
        .is_confirm());
}

#[tokio::test]
async fn mixed_denomination_spend_values_every_outflow() {
    let suite = Suite::new(br#"{"allowed": 100, "period": "day"}"#).await;
    let t = at(2024, 1, 1, 10, 0, 0);

    // 30 uusd + 5 uatom (50 uusd) in one transaction = 80
    let ctx = EvalContext::at(t);
    suite.auth.authenticate(&ctx, &account()).await.unwrap();
    suite.bank.send_out(&account(), REFERENCE, 30).await;
    suite.bank.send_out(&account(), "uatom", 5).await;
    let result = suite
        .auth
        .confirm_execution(&ctx, &account())
        .await
        .unwrap();
    assert!(result.is_confirm());

    // 21 more would exceed the remaining 20
    assert!(suite.spend(t, REFERENCE, 21).await.is_block());
    assert!(suite.spend(t, REFERENCE, 20).await.is_confirm());
}

#[tokio::test]
async fn zero_allowance_blocks_any_spend() {
    let suite = Suite::new(br#"{"allowed": 0, "period": "day"}"#).await;
    let t = at(2024, 1, 1, 0, 0, 0);

    assert!(suite.spend(t, REFERENCE, 1).await.is_block());
    // A transaction that moves nothing is still fine
    assert!(suite.spend(t, REFERENCE, 0).await.is_confirm());
}
