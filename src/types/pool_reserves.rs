//! One side of an AMM pool.
//!
//! A pool holds two [`PoolReserves`]: token1 resting at `center + fee` and
//! token0 resting at the counterpart position `-center + fee` of the reversed
//! trade pair. Each side is addressed by a [`PoolReservesKey`] and lives in
//! the tick-liquidity prefix next to limit order tranches at the same tick.

use alloy_primitives::U256;

use crate::error::{DexError, Result};
use crate::math::PrecDec;
use crate::types::pair::TradePairId;
use crate::types::price::calc_price;

/// Address of one pool side: `(trade pair, tick, fee)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PoolReservesKey {
    pub trade_pair_id: TradePairId,
    pub tick_index_taker_to_maker: i64,
    pub fee: u64,
}

impl PoolReservesKey {
    pub fn new(trade_pair_id: TradePairId, tick_index_taker_to_maker: i64, fee: u64) -> Self {
        Self {
            trade_pair_id,
            tick_index_taker_to_maker,
            fee,
        }
    }

    /// The other side of the same pool.
    ///
    /// # Returns
    ///
    /// `(reversed pair, -tick + 2*fee, fee)`, or an error if the fee does not
    /// fit a tick offset.
    pub fn counterpart(&self) -> Result<Self> {
        let fee = i64::try_from(self.fee).map_err(|_| DexError::InvalidFee(self.fee))?;
        let tick = fee
            .checked_mul(2)
            .and_then(|f| f.checked_sub(self.tick_index_taker_to_maker))
            .ok_or(DexError::TickOutsideRange(self.tick_index_taker_to_maker))?;
        Ok(Self::new(self.trade_pair_id.reversed(), tick, self.fee))
    }

    /// Maker tokens paid out per taker token at this position.
    pub fn price_taker_to_maker(&self) -> Result<PrecDec> {
        calc_price(-self.tick_index_taker_to_maker)
    }
}

/// Maker-side reserves of one pool position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolReserves {
    pub key: PoolReservesKey,
    pub reserves_maker_denom: U256,
    pub dec_reserves_maker_denom: PrecDec,
    pub price_taker_to_maker: PrecDec,
}

impl PoolReserves {
    /// Empty reserves at `key`, failing if the tick is outside the price range.
    pub fn new(key: PoolReservesKey) -> Result<Self> {
        let price_taker_to_maker = key.price_taker_to_maker()?;
        Ok(Self {
            key,
            reserves_maker_denom: U256::ZERO,
            dec_reserves_maker_denom: PrecDec::zero(),
            price_taker_to_maker,
        })
    }

    /// Empty reserves at the counterpart position of `other`.
    pub fn from_counterpart(other: &PoolReserves) -> Result<Self> {
        Self::new(other.key.counterpart()?)
    }

    pub fn has_token(&self) -> bool {
        !self.reserves_maker_denom.is_zero()
    }

    pub fn tick_index(&self) -> i64 {
        self.key.tick_index_taker_to_maker
    }

    /// Replace the reserves, keeping the decimal mirror in sync.
    pub fn set_reserves(&mut self, amount: U256) -> Result<()> {
        self.dec_reserves_maker_denom = PrecDec::from_int(amount)?;
        self.reserves_maker_denom = amount;
        Ok(())
    }
}
