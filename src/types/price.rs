//! Tick index to price conversion.
//!
//! ## Overview
//!
//! A tick index `t` stands for the price `1.0001^t`. Lower ticks are better
//! prices for the taker, and negating a tick inverts the direction of the
//! trade. Valid ticks lie in `[-MAX_TICK_EXP, MAX_TICK_EXP]`.
//!
//! ## The Price Ladder
//!
//! Prices are not evaluated with a closed formula. They come from a fixed
//! ladder that must agree bit for bit with prices already persisted in
//! state:
//!
//! 1. Start from `1` as a binary float with a 256-bit mantissa.
//! 2. For each positive tick multiply by the `f64` value of `1.0001`; for each
//!    negative tick divide by it. Every step rounds half to even.
//! 3. Convert each rung to [`PrecDec`] by a 256-bit rounded multiplication by
//!    `10^27` followed by truncation.
//!
//! The ladder is built once per process and cached.
//!
//! ## Examples
//!
//! ```
//! use tick_dex::types::price::{calc_price, calc_tick_index_from_price};
//!
//! let price = calc_price(-50).unwrap();
//! assert_eq!(price.to_string(), "0.995012727929251451735988834");
//! assert_eq!(calc_tick_index_from_price(&price).unwrap(), -50);
//! ```

use std::sync::OnceLock;

use alloy_primitives::{Uint, U256};

use crate::error::{DexError, Result};
use crate::math::{narrow, widen, PrecDec};

/// Largest supported absolute tick index.
pub const MAX_TICK_EXP: u64 = 529_750;

/// Price at tick `-MAX_TICK_EXP`.
pub const MIN_PRICE: &str = "0.000000000000000000000009871";

/// Price at tick `MAX_TICK_EXP`.
pub const MAX_PRICE: &str = "101297777749006516066611.914775584130706898691360168";

const PRICE_ARRAY_OFFSET: i64 = MAX_TICK_EXP as i64;

// ============================================================================
// Binary float ladder
// ============================================================================

/// Scratch integer wide enough for a 256-bit mantissa times `10^27`.
type Work = Uint<384, 6>;

const MANTISSA_BITS: usize = 256;

/// `f64` value of 1.0001 is `BASE_MANTISSA * 2^BASE_EXP`.
const BASE_MANTISSA: u64 = 4_504_049_987_333_233;
const BASE_EXP: i64 = -52;

/// Extra dividend bits so a quotient keeps guard bits for rounding.
const QUO_SHIFT: usize = 55;

const TEN_POW_27: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Binary float `mantissa * 2^exp` with a normalised 256-bit mantissa.
#[derive(Debug, Clone, Copy)]
struct LadderFloat {
    mantissa: Work,
    exp: i64,
}

impl LadderFloat {
    fn one() -> Self {
        Self {
            mantissa: Work::from(1u64) << (MANTISSA_BITS - 1),
            exp: -(MANTISSA_BITS as i64 - 1),
        }
    }

    /// Round `value * 2^exp` to a 256-bit mantissa, half to even.
    ///
    /// `sticky` marks nonzero bits below `value` that were already dropped.
    fn round(value: Work, exp: i64, sticky: bool) -> Self {
        let bits = value.bit_len();
        if bits <= MANTISSA_BITS {
            let shift = MANTISSA_BITS - bits;
            return Self {
                mantissa: value << shift,
                exp: exp - shift as i64,
            };
        }

        let one = Work::from(1u64);
        let mut shift = bits - MANTISSA_BITS;
        let mut mantissa = value >> shift;
        let rem = value & ((one << shift) - one);
        let half = one << (shift - 1);
        let odd = mantissa.as_limbs()[0] & 1 == 1;
        if rem > half || (rem == half && (sticky || odd)) {
            mantissa += one;
            if mantissa.bit_len() > MANTISSA_BITS {
                mantissa >>= 1usize;
                shift += 1;
            }
        }
        Self {
            mantissa,
            exp: exp + shift as i64,
        }
    }

    fn mul_base(&self) -> Self {
        Self::round(
            self.mantissa * Work::from(BASE_MANTISSA),
            self.exp + BASE_EXP,
            false,
        )
    }

    fn quo_base(&self) -> Self {
        let (quo, rem) = (self.mantissa << QUO_SHIFT).div_rem(Work::from(BASE_MANTISSA));
        Self::round(quo, self.exp - QUO_SHIFT as i64 - BASE_EXP, !rem.is_zero())
    }

    /// Raw 27-digit decimal magnitude, truncated.
    fn to_raw_dec(self) -> U256 {
        let scaled = Self::round(self.mantissa * Work::from(TEN_POW_27), self.exp, false);
        let int = if scaled.exp >= 0 {
            scaled.mantissa << scaled.exp as usize
        } else {
            scaled.mantissa >> scaled.exp.unsigned_abs() as usize
        };
        let mut limbs = [0u64; 4];
        limbs.copy_from_slice(&int.as_limbs()[..4]);
        U256::from_limbs(limbs)
    }
}

fn build_ladder() -> Vec<U256> {
    let span = MAX_TICK_EXP as usize;
    let mut prices = vec![U256::ZERO; 2 * span + 1];
    prices[span] = U256::from(TEN_POW_27);

    let mut up = LadderFloat::one();
    for i in 1..=span {
        up = up.mul_base();
        prices[span + i] = up.to_raw_dec();
    }

    let mut down = LadderFloat::one();
    for i in 1..=span {
        down = down.quo_base();
        prices[span - i] = down.to_raw_dec();
    }

    tracing::debug!(ticks = prices.len(), "built tick price ladder");
    prices
}

/// Raw magnitudes of every tick price, indexed by `tick + MAX_TICK_EXP`.
fn ladder() -> &'static [U256] {
    static LADDER: OnceLock<Vec<U256>> = OnceLock::new();
    LADDER.get_or_init(build_ladder)
}

fn ladder_price(index: usize) -> Result<PrecDec> {
    let raw = ladder()
        .get(index)
        .copied()
        .ok_or_else(|| DexError::invariant(format!("price ladder index {index}")))?;
    Ok(PrecDec::from_raw_parts(false, widen(raw))?)
}

// ============================================================================
// Public API
// ============================================================================

/// Price `1.0001^tick` for a tick index.
///
/// # Arguments
///
/// * `tick` - Relative tick index
///
/// # Returns
///
/// * `Ok(PrecDec)` - The price at that tick
/// * `Err(DexError::TickOutsideRange)` - If `|tick| > MAX_TICK_EXP`
pub fn calc_price(tick: i64) -> Result<PrecDec> {
    if is_tick_out_of_range(tick) {
        return Err(DexError::TickOutsideRange(tick));
    }
    ladder_price((tick + PRICE_ARRAY_OFFSET) as usize)
}

/// Tick index for a price inside `[MIN_PRICE, MAX_PRICE]`.
///
/// Exact ladder prices map back to their tick. Other prices map to the tick
/// where the search window closes, which is one of the two bracketing ticks.
///
/// # Example
///
/// ```
/// use tick_dex::math::PrecDec;
/// use tick_dex::types::price::calc_tick_index_from_price;
///
/// let two: PrecDec = "2".parse().unwrap();
/// assert_eq!(calc_tick_index_from_price(&two).unwrap(), 6931);
/// ```
pub fn calc_tick_index_from_price(price: &PrecDec) -> Result<i64> {
    if is_price_out_of_range(price)? {
        return Err(DexError::PriceOutsideRange(price.to_string()));
    }
    let target = narrow(price.magnitude())
        .ok_or_else(|| DexError::PriceOutsideRange(price.to_string()))?;
    let prices = ladder();

    let mut left: i64 = 0;
    let mut right: i64 = 2 * PRICE_ARRAY_OFFSET;
    while left < right {
        let mid = (left + right) / 2;
        let at_mid = prices[mid as usize];
        if at_mid == target {
            return Ok(mid - PRICE_ARRAY_OFFSET);
        } else if at_mid < target {
            left = mid + 1;
        } else {
            right = mid - 1;
        }
    }
    Ok(right - PRICE_ARRAY_OFFSET)
}

pub fn is_tick_out_of_range(tick: i64) -> bool {
    tick.unsigned_abs() > MAX_TICK_EXP
}

pub fn min_price() -> Result<PrecDec> {
    ladder_price(0)
}

pub fn max_price() -> Result<PrecDec> {
    ladder_price(2 * MAX_TICK_EXP as usize)
}

pub fn is_price_out_of_range(price: &PrecDec) -> Result<bool> {
    Ok(*price > max_price()? || *price < min_price()?)
}

/// Check that a pool at `tick` with `fee` keeps both positions in range.
///
/// # Returns
///
/// * `Err(DexError::InvalidFee)` - If `fee >= MAX_TICK_EXP`
/// * `Err(DexError::TickOutsideRange)` - If `|tick| + fee > MAX_TICK_EXP`
pub fn validate_tick_fee(tick: i64, fee: u64) -> Result<()> {
    if fee >= MAX_TICK_EXP {
        return Err(DexError::InvalidFee(fee));
    }
    if tick.unsigned_abs() > MAX_TICK_EXP - fee {
        return Err(DexError::TickOutsideRange(tick));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
