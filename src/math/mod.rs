//! Deterministic integer and decimal math.
//!
//! ## Overview
//!
//! Every amount handled by the Dex is an unsigned 256-bit integer
//! ([`U256`]). Prices, ratios and intermediate share math use [`PrecDec`],
//! a signed fixed-point decimal with 27 fractional digits whose magnitude
//! lives in a 1024-bit integer ([`Wide`]) so that products never wrap
//! before the bound check runs.
//!
//! ## No Floating Point
//!
//! Nothing in this module touches `f32`/`f64`. Results are identical on
//! every platform, which is what replaying a block requires.

use alloy_primitives::{Uint, U256};
use thiserror::Error;

pub mod prec_dec;

pub use prec_dec::{PrecDec, MAX_DEC_BIT_LEN, PRECISION};

/// Working integer for decimal magnitudes and intermediate products.
pub type Wide = Uint<1024, 16>;

// ============================================================================
// Errors
// ============================================================================

/// Failures of decimal arithmetic, parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Result magnitude needs more bits than a decimal may hold
    #[error("decimal overflow: result needs {bits} bits, limit is {limit}")]
    Overflow { bits: usize, limit: usize },

    #[error("division by zero")]
    DivisionByZero,

    /// Malformed decimal literal
    #[error("invalid decimal '{input}': {reason}")]
    Parse { input: String, reason: &'static str },

    /// A negative decimal was converted to an unsigned amount
    #[error("negative value {0} cannot be used as an amount")]
    Negative(String),

    /// Value does not fit the requested representation
    #[error("value {0} is out of range")]
    OutOfRange(String),
}

// ============================================================================
// Integer helpers
// ============================================================================

/// Widen a 256-bit amount into the working integer.
pub fn widen(value: U256) -> Wide {
    let mut limbs = [0u64; 16];
    limbs[..4].copy_from_slice(value.as_limbs());
    Wide::from_limbs(limbs)
}

/// Narrow a working integer back to 256 bits, `None` if it does not fit.
pub fn narrow(value: &Wide) -> Option<U256> {
    if value.bit_len() > 256 {
        return None;
    }
    let mut limbs = [0u64; 4];
    limbs.copy_from_slice(&value.as_limbs()[..4]);
    Some(U256::from_limbs(limbs))
}

/// `a - b` for amounts, reporting underflow instead of wrapping.
pub fn checked_sub_amount(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b)
        .ok_or_else(|| MathError::OutOfRange(format!("{a} - {b}")))
}

/// `a + b` for amounts, reporting overflow instead of wrapping.
pub fn checked_add_amount(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow {
        bits: 257,
        limit: 256,
    })
}

/// `a * b / c` over the wide integer, truncating toward zero.
pub fn mul_div(a: U256, b: U256, c: U256) -> Result<U256, MathError> {
    if c.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = widen(a)
        .checked_mul(widen(b))
        .ok_or(MathError::Overflow { bits: 512, limit: 1024 })?;
    let quotient = product / widen(c);
    narrow(&quotient).ok_or_else(|| MathError::OutOfRange(format!("{a} * {b} / {c}")))
}
