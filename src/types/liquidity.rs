//! Tick liquidity: the tagged union stored under the tick-liquidity prefix.

use crate::math::PrecDec;
use crate::types::pair::TradePairId;
use crate::types::pool_reserves::PoolReserves;
use crate::types::tranche::LimitOrderTranche;

/// One entry of the ordered tick scan: pool reserves or a tranche.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickLiquidity {
    PoolReserves(PoolReserves),
    LimitOrderTranche(LimitOrderTranche),
}

impl TickLiquidity {
    /// Storage tag written before the SSZ payload.
    pub fn tag(&self) -> u8 {
        match self {
            TickLiquidity::PoolReserves(_) => 0,
            TickLiquidity::LimitOrderTranche(_) => 1,
        }
    }

    pub fn tick_index(&self) -> i64 {
        match self {
            TickLiquidity::PoolReserves(r) => r.key.tick_index_taker_to_maker,
            TickLiquidity::LimitOrderTranche(t) => t.key.tick_index_taker_to_maker,
        }
    }

    pub fn trade_pair_id(&self) -> &TradePairId {
        match self {
            TickLiquidity::PoolReserves(r) => &r.key.trade_pair_id,
            TickLiquidity::LimitOrderTranche(t) => &t.key.trade_pair_id,
        }
    }

    pub fn price_taker_to_maker(&self) -> &PrecDec {
        match self {
            TickLiquidity::PoolReserves(r) => &r.price_taker_to_maker,
            TickLiquidity::LimitOrderTranche(t) => &t.price_taker_to_maker,
        }
    }

    pub fn has_token(&self) -> bool {
        match self {
            TickLiquidity::PoolReserves(r) => r.has_token(),
            TickLiquidity::LimitOrderTranche(t) => t.has_token_in(),
        }
    }
}
