//! Read-only queries over engine state.

use crate::bank::BankKeeper;
use crate::engine::DexEngine;
use crate::error::Result;
use crate::math::PrecDec;
use crate::orderbook::LiquidityIterator;
use crate::types::{
    LimitOrderExpiration, LimitOrderTranche, LimitOrderTrancheKey, LimitOrderTrancheUser, PairId,
    Pool, PoolMetadata, PoolReserves, PoolReservesKey, TickLiquidity, TradePairId,
    normalize_tick_index,
};

impl<B: BankKeeper> DexEngine<B> {
    /// Pool quoted as `token_a -> token_b` at `tick_index` with `fee`.
    pub fn pool(&self, token_a: &str, token_b: &str, tick_index: i64, fee: u64) -> Result<Option<Pool>> {
        let pair_id = PairId::new(token_a, token_b)?;
        let tick = normalize_tick_index(token_a, &pair_id.token0, tick_index);
        self.store.get_pool(&pair_id, tick, fee)
    }

    pub fn pool_by_id(&self, id: u64) -> Result<Option<Pool>> {
        self.store.get_pool_by_id(id)
    }

    pub fn pool_metadata(&self, id: u64) -> Result<Option<PoolMetadata>> {
        self.store.get_pool_metadata(id)
    }

    pub fn all_pool_metadata(&self) -> Result<Vec<PoolMetadata>> {
        self.store.all_pool_metadata()
    }

    pub fn pool_reserves(&self, key: &PoolReservesKey) -> Result<Option<PoolReserves>> {
        self.store.get_pool_reserves(key)
    }

    pub fn limit_order_tranche(&self, key: &LimitOrderTrancheKey) -> Result<Option<LimitOrderTranche>> {
        self.store.get_tranche(key)
    }

    pub fn inactive_limit_order_tranche(
        &self,
        key: &LimitOrderTrancheKey,
    ) -> Result<Option<LimitOrderTranche>> {
        self.store.get_inactive_tranche(key)
    }

    /// Active tranches selling `token_out` for `token_in`, in matching order.
    pub fn limit_order_tranches(&self, pair_id: &PairId, token_in: &str) -> Result<Vec<LimitOrderTranche>> {
        let trade_pair_id = pair_id.trade_pair_for_taker(token_in)?;
        Ok(self
            .store
            .tick_liquidity(&trade_pair_id)?
            .into_iter()
            .filter_map(|liquidity| match liquidity {
                TickLiquidity::LimitOrderTranche(tranche) => Some(tranche),
                TickLiquidity::PoolReserves(_) => None,
            })
            .collect())
    }

    pub fn inactive_limit_order_tranches(
        &self,
        pair_id: &PairId,
        token_in: &str,
    ) -> Result<Vec<LimitOrderTranche>> {
        let trade_pair_id = pair_id.trade_pair_for_taker(token_in)?;
        self.store.inactive_tranches(&trade_pair_id)
    }

    /// Every pool side and tranche a `token_in` taker can trade against.
    pub fn tick_liquidity(&self, pair_id: &PairId, token_in: &str) -> Result<Vec<TickLiquidity>> {
        let trade_pair_id = pair_id.trade_pair_for_taker(token_in)?;
        self.store.tick_liquidity(&trade_pair_id)
    }

    pub fn limit_order_tranche_user(
        &self,
        address: &str,
        tranche_key: &str,
    ) -> Result<Option<LimitOrderTrancheUser>> {
        self.store.get_tranche_user(address, tranche_key)
    }

    pub fn limit_order_tranche_users_by_address(&self, address: &str) -> Result<Vec<LimitOrderTrancheUser>> {
        self.store.tranche_users_by_address(address)
    }

    pub fn limit_order_expirations(&self) -> Result<Vec<LimitOrderExpiration>> {
        self.store.all_expirations()
    }

    /// Tick of the best tradable liquidity on `trade_pair_id`.
    pub fn best_tick(&self, trade_pair_id: &TradePairId) -> Result<Option<i64>> {
        let mut iter = LiquidityIterator::new(trade_pair_id.clone(), self.ctx.block_time);
        Ok(iter.next(&self.store)?.map(|liquidity| liquidity.tick_index()))
    }

    /// Maker-per-taker price of the best tradable liquidity on `trade_pair_id`.
    pub fn best_price(&self, trade_pair_id: &TradePairId) -> Result<Option<PrecDec>> {
        let mut iter = LiquidityIterator::new(trade_pair_id.clone(), self.ctx.block_time);
        Ok(iter.next(&self.store)?.map(|liquidity| *liquidity.price()))
    }
}
