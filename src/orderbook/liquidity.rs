//! Swappable liquidity: a pool position or a limit order tranche.

use alloy_primitives::U256;

use crate::error::Result;
use crate::math::PrecDec;
use crate::store::KvStore;
use crate::types::{LimitOrderTranche, Pool, TradePairId};

/// A pool seen from one trade direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLiquidity {
    pub trade_pair_id: TradePairId,
    pub pool: Pool,
}

/// One unit of liquidity the matcher can trade against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liquidity {
    Pool(PoolLiquidity),
    Tranche(LimitOrderTranche),
}

impl Liquidity {
    /// Maker tokens paid per taker token.
    pub fn price(&self) -> &PrecDec {
        match self {
            Liquidity::Pool(p) => p.pool.price(&p.trade_pair_id),
            Liquidity::Tranche(t) => t.price(),
        }
    }

    pub fn tick_index(&self) -> i64 {
        match self {
            Liquidity::Pool(p) => {
                if p.trade_pair_id.is_maker_token0() {
                    p.pool.lower_tick0.tick_index()
                } else {
                    p.pool.upper_tick1.tick_index()
                }
            }
            Liquidity::Tranche(t) => t.tick_index(),
        }
    }

    /// Trade up to `max_in` taker tokens.
    ///
    /// # Returns
    ///
    /// `(amount_in, amount_out)`
    pub fn swap(&mut self, max_in: U256, max_out: Option<U256>) -> Result<(U256, U256)> {
        match self {
            Liquidity::Pool(p) => p.pool.swap(&p.trade_pair_id, max_in, max_out),
            Liquidity::Tranche(t) => t.swap(max_in, max_out),
        }
    }

    /// Write the liquidity back after a swap.
    pub fn save(&self, store: &mut KvStore) -> Result<()> {
        match self {
            Liquidity::Pool(p) => store.set_pool(&p.pool),
            Liquidity::Tranche(t) => save_tranche(store, t),
        }
    }
}

/// Persist an active tranche after a state change.
///
/// A tranche with maker reserves stays active. One with only taker proceeds
/// left moves to the inactive prefix. One with neither is deleted. Tranches
/// leaving the active set also drop their expiration record.
pub fn save_tranche(store: &mut KvStore, tranche: &LimitOrderTranche) -> Result<()> {
    if tranche.has_token_in() {
        return store.set_tranche(tranche);
    }
    if tranche.has_token_out() {
        store.set_inactive_tranche(tranche)?;
    }
    store.remove_tranche(&tranche.key);
    store.remove_tranche_expiration(tranche);
    Ok(())
}

/// Persist an inactive tranche, deleting it once nothing is left in it.
pub fn save_inactive_tranche(store: &mut KvStore, tranche: &LimitOrderTranche) -> Result<()> {
    if tranche.has_token_in() || tranche.has_token_out() {
        store.set_inactive_tranche(tranche)
    } else {
        store.remove_inactive_tranche(&tranche.key);
        Ok(())
    }
}
