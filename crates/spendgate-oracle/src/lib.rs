//! Spendgate Oracle - reference-unit valuation of spends
//!
//! Converts an amount of an arbitrary denomination into the reference
//! denomination at a given time. Routes are resolved against liquidity pool
//! pairings (direct or transitive); each hop is priced by the source, spot
//! or time-weighted.
//!
//! # Key Principle
//!
//! **A spend that cannot be valued must never pass as zero.**
//!
//! Every route or price failure surfaces as an error so the caller can fail
//! closed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use spendgate_types::{Amount, Denom, Result, SpendgateError};
use tokio::sync::RwLock;
use tracing::trace;

/// Identifier of a liquidity pool
pub type PoolId = u64;

/// Routes longer than this are not considered liquid enough to price against
pub const MAX_ROUTE_HOPS: usize = 4;

/// One hop of a resolved price route, oriented in travel direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolHop {
    pub pool_id: PoolId,
    pub base: Denom,
    pub quote: Denom,
}

/// Route and price lookups against a set of liquidity pairings
///
/// `price` returns the value of one unit of `base` in `quote` units. Whether
/// that is a spot or a time-weighted price is the source's decision; `at`
/// lets time-weighted sources anchor their window.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Resolve a route from `base` to `quote`, direct or transitive.
    async fn route(&self, base: &Denom, quote: &Denom) -> Result<Vec<PoolHop>>;

    /// Price of one unit of `base` in `quote` within `pool` at time `at`.
    async fn price(
        &self,
        pool: PoolId,
        base: &Denom,
        quote: &Denom,
        at: DateTime<Utc>,
    ) -> Result<Decimal>;
}

/// Converts amounts of arbitrary denominations into the reference denomination
#[derive(Clone)]
pub struct ReferenceConverter {
    reference: Denom,
    source: Arc<dyn PriceSource>,
}

impl ReferenceConverter {
    pub fn new(reference: Denom, source: Arc<dyn PriceSource>) -> Self {
        Self { reference, source }
    }

    pub fn reference(&self) -> &Denom {
        &self.reference
    }

    /// Value `amount` of `denom` in reference units at time `at`.
    ///
    /// Identity when `denom` is already the reference. The result is floored
    /// to an integer reference amount.
    pub async fn value_in_reference(
        &self,
        denom: &Denom,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> Result<Amount> {
        if denom == &self.reference {
            return Ok(amount);
        }
        if amount.is_zero() {
            return Ok(Amount::zero());
        }

        let hops = self.source.route(denom, &self.reference).await?;
        if hops.is_empty() {
            return Err(SpendgateError::RouteNotFound {
                base: denom.to_string(),
                quote: self.reference.to_string(),
            });
        }

        let mut rate = Decimal::ONE;
        for hop in &hops {
            let price = self
                .source
                .price(hop.pool_id, &hop.base, &hop.quote, at)
                .await?;
            rate = rate
                .checked_mul(price)
                .ok_or_else(|| SpendgateError::arithmetic("price route multiplication"))?;
        }
        trace!(%denom, reference = %self.reference, %rate, hops = hops.len(), "resolved price route");

        let quantity = Decimal::from_u128(amount.0)
            .ok_or_else(|| SpendgateError::arithmetic("amount to decimal conversion"))?;
        let value = quantity
            .checked_mul(rate)
            .ok_or_else(|| SpendgateError::arithmetic("spend valuation"))?;
        let floored = value
            .floor()
            .to_u128()
            .ok_or_else(|| SpendgateError::arithmetic("reference value conversion"))?;

        Ok(Amount::new(floored))
    }
}

/// A registered liquidity pairing
#[derive(Debug, Clone)]
struct Pool {
    id: PoolId,
    base: Denom,
    quote: Denom,
    /// Quote units per one base unit
    price: Decimal,
}

/// In-process price source over a registry of liquidity pairings
///
/// Prices are spot. Routes are resolved by breadth-first search over the
/// denomination graph, shortest route first, capped at [`MAX_ROUTE_HOPS`].
#[derive(Clone, Default)]
pub struct PoolPriceSource {
    pools: Arc<RwLock<Vec<Pool>>>,
}

impl PoolPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pairing priced at `price` quote units per base unit.
    pub async fn register_pool(&self, base: Denom, quote: Denom, price: Decimal) -> PoolId {
        let mut pools = self.pools.write().await;
        let id = pools.len() as PoolId;
        pools.push(Pool {
            id,
            base,
            quote,
            price,
        });
        id
    }
}

#[async_trait]
impl PriceSource for PoolPriceSource {
    async fn route(&self, base: &Denom, quote: &Denom) -> Result<Vec<PoolHop>> {
        let pools = self.pools.read().await;

        // BFS over denominations; pools are traversable in both directions.
        let mut visited: HashMap<Denom, Vec<PoolHop>> = HashMap::new();
        let mut queue: VecDeque<Denom> = VecDeque::new();
        visited.insert(base.clone(), Vec::new());
        queue.push_back(base.clone());

        while let Some(current) = queue.pop_front() {
            let path = visited[&current].clone();
            if path.len() >= MAX_ROUTE_HOPS {
                continue;
            }
            for pool in pools.iter() {
                let next = if pool.base == current {
                    pool.quote.clone()
                } else if pool.quote == current {
                    pool.base.clone()
                } else {
                    continue;
                };
                if visited.contains_key(&next) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(PoolHop {
                    pool_id: pool.id,
                    base: current.clone(),
                    quote: next.clone(),
                });
                if &next == quote {
                    return Ok(extended);
                }
                visited.insert(next.clone(), extended);
                queue.push_back(next);
            }
        }

        Err(SpendgateError::RouteNotFound {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    async fn price(
        &self,
        pool: PoolId,
        base: &Denom,
        quote: &Denom,
        _at: DateTime<Utc>,
    ) -> Result<Decimal> {
        let pools = self.pools.read().await;
        let unavailable = || SpendgateError::PriceUnavailable {
            pool_id: pool,
            base: base.to_string(),
            quote: quote.to_string(),
        };

        let found = pools.iter().find(|p| p.id == pool).ok_or_else(unavailable)?;
        if &found.base == base && &found.quote == quote {
            Ok(found.price)
        } else if &found.quote == base && &found.base == quote {
            // Reverse orientation: invert, guarding against a zero price
            Decimal::ONE.checked_div(found.price).ok_or_else(unavailable)
        } else {
            Err(unavailable())
        }
    }
}
