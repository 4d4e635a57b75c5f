//! Two-sided AMM pool at `(pair, center tick, fee)`.
//!
//! ## Layout
//!
//! ```text
//!   token0 rests at  -center + fee   (lower_tick0, maker = token0)
//!   token1 rests at   center + fee   (upper_tick1, maker = token1)
//! ```
//!
//! Both positions are ordinary tick liquidity: the matcher swaps against
//! whichever side holds the token a taker wants.
//!
//! ## Share Accounting
//!
//! Shares are minted in proportion to value measured in token0 at the pool's
//! center price. A first deposit mints `trunc(value)` shares; later deposits
//! mint `trunc(value * existing_shares / existing_value)`.

use alloy_primitives::U256;

use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount, mul_div, PrecDec};
use crate::types::pair::{PairId, TradePairId};
use crate::types::pool_reserves::{PoolReserves, PoolReservesKey};
use crate::types::price::calc_price;

/// Prefix of every pool share denom.
pub const POOL_DENOM_PREFIX: &str = "dex/pool/";

/// Share denom of the pool with `id`.
pub fn pool_denom(id: u64) -> String {
    format!("{POOL_DENOM_PREFIX}{id}")
}

/// Pool id encoded in a share denom.
pub fn parse_pool_denom(denom: &str) -> Result<u64> {
    denom
        .strip_prefix(POOL_DENOM_PREFIX)
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| DexError::InvalidPoolDenom(denom.to_string()))
}

/// Outcome of a pool deposit. Zero amounts on both sides mean nothing was
/// deposited and the reserves are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepositResult {
    pub in_amount0: U256,
    pub in_amount1: U256,
    pub shares: U256,
}

/// Static description of a pool, stored once when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub id: u64,
    pub tick: i64,
    pub fee: u64,
    pub pair_id: PairId,
}

// ============================================================================
// Pool
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub id: u64,
    pub lower_tick0: PoolReserves,
    pub upper_tick1: PoolReserves,
}

impl Pool {
    /// Empty pool centered at `center_tick` (normalized to token0 -> token1).
    ///
    /// # Arguments
    ///
    /// * `pair_id` - Sorted market
    /// * `center_tick` - Normalized center tick
    /// * `fee` - Fee in ticks, the distance from center to each side
    /// * `id` - Sequential pool id
    pub fn new(pair_id: &PairId, center_tick: i64, fee: u64, id: u64) -> Result<Self> {
        let fee_ticks = i64::try_from(fee).map_err(|_| DexError::InvalidFee(fee))?;
        let upper_tick = center_tick
            .checked_add(fee_ticks)
            .ok_or(DexError::TickOutsideRange(center_tick))?;
        let upper_key = PoolReservesKey::new(
            pair_id.trade_pair_for_maker(&pair_id.token1)?,
            upper_tick,
            fee,
        );
        let upper_tick1 = PoolReserves::new(upper_key)?;
        let lower_tick0 = PoolReserves::from_counterpart(&upper_tick1)?;
        Ok(Self {
            id,
            lower_tick0,
            upper_tick1,
        })
    }

    /// Rebuild a pool from its two stored sides.
    pub fn from_reserves(id: u64, lower_tick0: PoolReserves, upper_tick1: PoolReserves) -> Self {
        Self {
            id,
            lower_tick0,
            upper_tick1,
        }
    }

    pub fn center_tick_index(&self) -> i64 {
        self.upper_tick1.key.tick_index_taker_to_maker - self.fee() as i64
    }

    pub fn fee(&self) -> u64 {
        self.upper_tick1.key.fee
    }

    pub fn reserve0(&self) -> U256 {
        self.lower_tick0.reserves_maker_denom
    }

    pub fn reserve1(&self) -> U256 {
        self.upper_tick1.reserves_maker_denom
    }

    pub fn pair_id(&self) -> Result<PairId> {
        self.upper_tick1.key.trade_pair_id.pair_id()
    }

    pub fn pool_denom(&self) -> String {
        pool_denom(self.id)
    }

    /// Maker tokens per taker token for a taker trading on `trade_pair_id`.
    pub fn price(&self, trade_pair_id: &TradePairId) -> &PrecDec {
        if trade_pair_id.is_maker_token0() {
            &self.lower_tick0.price_taker_to_maker
        } else {
            &self.upper_tick1.price_taker_to_maker
        }
    }

    /// Value of one token1 in token0 at the center tick.
    pub fn price1to0_center(&self) -> Result<PrecDec> {
        calc_price(self.center_tick_index())
    }

    // ------------------------------------------------------------------------
    // Swap
    // ------------------------------------------------------------------------

    /// Sell up to `max_in` taker tokens into the side holding the maker token.
    ///
    /// # Returns
    ///
    /// `(amount_in, amount_out)`. Both are zero when there is nothing to
    /// trade against.
    pub fn swap(
        &mut self,
        trade_pair_id: &TradePairId,
        max_in: U256,
        max_out: Option<U256>,
    ) -> Result<(U256, U256)> {
        let (maker, taker) = if trade_pair_id.is_maker_token0() {
            (&mut self.lower_tick0, &mut self.upper_tick1)
        } else {
            (&mut self.upper_tick1, &mut self.lower_tick0)
        };

        if max_in.is_zero() || maker.reserves_maker_denom.is_zero() {
            return Ok((U256::ZERO, U256::ZERO));
        }

        let price = maker.price_taker_to_maker;
        let max_out_given_in = price.mul_int(max_in)?.truncate_int()?;
        let mut amount_out = maker.reserves_maker_denom.min(max_out_given_in);
        if let Some(limit) = max_out {
            amount_out = amount_out.min(limit);
        }
        let amount_in = PrecDec::from_int(amount_out)?.quo(&price)?.truncate_int()?;

        taker.set_reserves(checked_add_amount(taker.reserves_maker_denom, amount_in)?)?;
        maker.set_reserves(checked_sub_amount(maker.reserves_maker_denom, amount_out)?)?;
        Ok((amount_in, amount_out))
    }

    // ------------------------------------------------------------------------
    // Deposit / withdraw
    // ------------------------------------------------------------------------

    /// Add liquidity, mutating the reserves in place.
    ///
    /// Without autoswap only the part of `(max_amount0, max_amount1)` that
    /// matches the current reserve ratio is taken. With autoswap the residual
    /// is also taken and credited at its fee-discounted value.
    pub fn deposit(
        &mut self,
        max_amount0: U256,
        max_amount1: U256,
        existing_shares: U256,
        autoswap: bool,
    ) -> Result<DepositResult> {
        let reserve0 = self.reserve0();
        let reserve1 = self.reserve1();
        let (mut in_amount0, mut in_amount1) =
            calc_greatest_matching_ratio(reserve0, reserve1, max_amount0, max_amount1)?;

        let price1to0 = self.price1to0_center()?;
        let mut value = calc_amount_as_token0(in_amount0, in_amount1, &price1to0)?;

        if autoswap {
            let residual0 = checked_sub_amount(max_amount0, in_amount0)?;
            let residual1 = checked_sub_amount(max_amount1, in_amount1)?;
            let fee = calc_fee(
                self.upper_tick1.tick_index(),
                -self.lower_tick0.tick_index(),
            );
            let residual_value = calc_residual_value(
                residual0,
                residual1,
                &self.lower_tick0.price_taker_to_maker,
                fee,
            )?;
            value = value.add(&residual_value)?;
            in_amount0 = max_amount0;
            in_amount1 = max_amount1;
        }

        if in_amount0.is_zero() && in_amount1.is_zero() {
            return Ok(DepositResult::default());
        }

        let existing_value = calc_amount_as_token0(reserve0, reserve1, &price1to0)?;
        let shares = if existing_value.is_positive() {
            value
                .mul_int(existing_shares)?
                .quo(&existing_value)?
                .truncate_int()?
        } else {
            value.truncate_int()?
        };

        self.lower_tick0
            .set_reserves(checked_add_amount(reserve0, in_amount0)?)?;
        self.upper_tick1
            .set_reserves(checked_add_amount(reserve1, in_amount1)?)?;

        Ok(DepositResult {
            in_amount0,
            in_amount1,
            shares,
        })
    }

    /// Pro-rata amounts `shares` would redeem, truncated on each side.
    pub fn redeem_value(&self, shares: U256, total_shares: U256) -> Result<(U256, U256)> {
        let out0 = mul_div(self.reserve0(), shares, total_shares)?;
        let out1 = mul_div(self.reserve1(), shares, total_shares)?;
        Ok((out0, out1))
    }

    /// Remove `shares` worth of reserves and return the amounts taken out.
    pub fn withdraw(&mut self, shares: U256, total_shares: U256) -> Result<(U256, U256)> {
        if shares > total_shares {
            return Err(DexError::InsufficientShares {
                requested: shares.to_string(),
                available: total_shares.to_string(),
            });
        }
        let (out0, out1) = self.redeem_value(shares, total_shares)?;
        self.lower_tick0
            .set_reserves(checked_sub_amount(self.reserve0(), out0)?)?;
        self.upper_tick1
            .set_reserves(checked_sub_amount(self.reserve1(), out1)?)?;
        Ok((out0, out1))
    }
}

// ============================================================================
// Pool math
// ============================================================================

/// Largest `(amount0, amount1)` not exceeding the inputs whose ratio matches
/// `(target0, target1)`. An empty side accepts its input in full.
pub fn calc_greatest_matching_ratio(
    target0: U256,
    target1: U256,
    amount0: U256,
    amount1: U256,
) -> Result<(U256, U256)> {
    let result0 = if target1.is_zero() {
        amount0
    } else {
        amount0.min(mul_div(amount1, target0, target1)?)
    };
    let result1 = if target0.is_zero() {
        amount1
    } else {
        amount1.min(mul_div(amount0, target1, target0)?)
    };
    Ok((result0, result1))
}

/// Token0 value of an autoswapped residual: token0 is discounted by the fee,
/// token1 is valued at the lower side's price.
pub fn calc_residual_value(
    amount0: U256,
    amount1: U256,
    price_lower_taker_to_maker: &PrecDec,
    fee: i64,
) -> Result<PrecDec> {
    let amount0_discount = calc_price(-fee)?;
    Ok(amount0_discount
        .mul_int(amount0)?
        .add(&price_lower_taker_to_maker.mul_int(amount1)?)?)
}

/// Fee of a pool recovered from its upper tick and its lower tick, both
/// normalized to token0 -> token1.
pub fn calc_fee(upper_tick_index: i64, lower_tick_index: i64) -> i64 {
    (upper_tick_index - lower_tick_index) / 2
}

/// `amount0 + price1to0 * amount1`.
pub fn calc_amount_as_token0(amount0: U256, amount1: U256, price1to0: &PrecDec) -> Result<PrecDec> {
    Ok(PrecDec::from_int(amount0)?.add(&price1to0.mul_int(amount1)?)?)
}

// ============================================================================
// Unit Tests
// ============================================================================
