//! PrecDec: signed fixed-point decimal with 27 fractional digits.
//!
//! ## Representation
//!
//! A `PrecDec` is `magnitude / 10^27` with a separate sign flag. Zero is
//! never negative. The magnitude is held in a 1024-bit integer so that the
//! exact product of two decimals fits before it is rescaled; every result is
//! then checked against [`MAX_DEC_BIT_LEN`].
//!
//! ## Rounding
//!
//! Each operation names its rounding:
//!
//! | Operation | Rounding |
//! |---|---|
//! | `mul`, `quo`, `round_int` | half to even on the magnitude |
//! | `mul_truncate`, `quo_truncate`, `quo_int` | toward zero |
//! | `mul_round_up`, `quo_round_up` | away from zero when positive, toward zero when negative |
//!
//! ## Example
//!
//! ```
//! use tick_dex::math::PrecDec;
//!
//! let a: PrecDec = "2".parse().unwrap();
//! let b: PrecDec = "3".parse().unwrap();
//! assert_eq!(a.quo(&b).unwrap().to_string(), "0.666666666666666666666666667");
//! assert_eq!(a.quo_truncate(&b).unwrap().to_string(), "0.666666666666666666666666666");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use std::sync::OnceLock;

use alloy_primitives::U256;

use super::{narrow, widen, MathError, Wide};

/// Number of fractional decimal digits.
pub const PRECISION: u32 = 27;

/// Largest magnitude bit length a decimal may carry (256 integer bits plus
/// the bits of the 10^27 scale).
pub const MAX_DEC_BIT_LEN: usize = 256 + 89;

const MAX_APPROX_ROOT_ITERATIONS: usize = 300;

/// Highest power of ten kept in the lookup table (10^300 < 2^1000).
const MAX_POW10: usize = 300;

/// Largest positive exponent `from_scientific` accepts; 10^104 exceeds
/// every magnitude of `MAX_DEC_BIT_LEN` bits.
const MAX_SCIENTIFIC_EXPONENT: usize = 103;

/// Width of the zero-padded sortable form.
const SORTABLE_WIDTH: usize = PRECISION as usize * 2 + 1;

// ============================================================================
// Powers of ten
// ============================================================================

fn pow10_table() -> &'static [Wide] {
    static TABLE: OnceLock<Vec<Wide>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let ten = Wide::from(10u64);
        let mut table = Vec::with_capacity(MAX_POW10 + 1);
        let mut acc = Wide::from(1u64);
        for _ in 0..=MAX_POW10 {
            table.push(acc);
            acc *= ten;
        }
        table
    })
}

/// `10^exp` as a wide integer.
pub(crate) fn pow10(exp: usize) -> Result<Wide, MathError> {
    pow10_table()
        .get(exp)
        .copied()
        .ok_or(MathError::Overflow {
            bits: exp * 4,
            limit: MAX_DEC_BIT_LEN,
        })
}

fn scale() -> Wide {
    pow10_table()[PRECISION as usize]
}

fn wide_one() -> Wide {
    Wide::from(1u64)
}

fn is_odd(value: &Wide) -> bool {
    value.as_limbs()[0] & 1 == 1
}

// ============================================================================
// Rounding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    /// Round half to even on the magnitude
    HalfEven,
    /// Drop the remainder
    Truncate,
    /// Bump positive results with a remainder, truncate negative ones
    Up,
}

/// Divide a magnitude and round the quotient according to `mode`.
fn chop(negative: bool, value: Wide, divisor: Wide, mode: Rounding) -> Wide {
    let (quo, rem) = value.div_rem(divisor);
    if rem.is_zero() {
        return quo;
    }
    match mode {
        Rounding::Truncate => quo,
        Rounding::Up => {
            if negative {
                quo
            } else {
                quo + wide_one()
            }
        }
        Rounding::HalfEven => {
            let twice = rem << 1usize;
            match twice.cmp(&divisor) {
                Ordering::Less => quo,
                Ordering::Greater => quo + wide_one(),
                Ordering::Equal => {
                    if is_odd(&quo) {
                        quo + wide_one()
                    } else {
                        quo
                    }
                }
            }
        }
    }
}

fn wide_to_decimal(value: &Wide) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let chunk = Wide::from(10_000_000_000_000_000_000u64);
    let mut parts: Vec<u64> = Vec::new();
    let mut rest = *value;
    while !rest.is_zero() {
        let (q, r) = rest.div_rem(chunk);
        parts.push(r.as_limbs()[0]);
        rest = q;
    }
    let mut out = String::with_capacity(parts.len() * 19);
    let mut iter = parts.iter().rev();
    if let Some(first) = iter.next() {
        out.push_str(&first.to_string());
    }
    for part in iter {
        out.push_str(&format!("{part:019}"));
    }
    out
}

// ============================================================================
// PrecDec
// ============================================================================

/// Signed decimal with 27 fractional digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrecDec {
    negative: bool,
    magnitude: Wide,
}

impl PrecDec {
    fn raw(negative: bool, magnitude: Wide) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    fn bounded(negative: bool, magnitude: Wide) -> Result<Self, MathError> {
        let bits = magnitude.bit_len();
        if bits > MAX_DEC_BIT_LEN {
            return Err(MathError::Overflow {
                bits,
                limit: MAX_DEC_BIT_LEN,
            });
        }
        Ok(Self::raw(negative, magnitude))
    }

    /// Build from a sign and a raw magnitude (value * 10^27).
    pub fn from_raw_parts(negative: bool, magnitude: Wide) -> Result<Self, MathError> {
        Self::bounded(negative, magnitude)
    }

    pub fn zero() -> Self {
        Self::raw(false, Wide::ZERO)
    }

    pub fn one() -> Self {
        Self::raw(false, scale())
    }

    /// The smallest positive value, 10^-27.
    pub fn smallest() -> Self {
        Self::raw(false, wide_one())
    }

    /// Integer amount as a decimal.
    pub fn from_int(value: U256) -> Result<Self, MathError> {
        let magnitude = widen(value)
            .checked_mul(scale())
            .ok_or(MathError::Overflow {
                bits: 1024,
                limit: MAX_DEC_BIT_LEN,
            })?;
        Self::bounded(false, magnitude)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::raw(false, Wide::from(value) * scale())
    }

    pub fn from_i64(value: i64) -> Self {
        Self::raw(value < 0, Wide::from(value.unsigned_abs()) * scale())
    }

    /// `value * 10^-prec`, e.g. `new_with_prec(5, 1) == 0.5`.
    pub fn new_with_prec(value: i64, prec: u32) -> Result<Self, MathError> {
        if prec > PRECISION {
            return Err(MathError::OutOfRange(format!("precision {prec}")));
        }
        let factor = pow10((PRECISION - prec) as usize)?;
        Ok(Self::raw(value < 0, Wide::from(value.unsigned_abs()) * factor))
    }

    /// Raw magnitude, i.e. `|self| * 10^27`.
    pub fn magnitude(&self) -> &Wide {
        &self.magnitude
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_positive(&self) -> bool {
        !self.negative && !self.magnitude.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self::raw(false, self.magnitude)
    }

    // ------------------------------------------------------------------------
    // Addition
    // ------------------------------------------------------------------------

    pub fn add(&self, other: &Self) -> Result<Self, MathError> {
        let (negative, magnitude) = if self.negative == other.negative {
            (self.negative, self.magnitude + other.magnitude)
        } else if self.magnitude >= other.magnitude {
            (self.negative, self.magnitude - other.magnitude)
        } else {
            (other.negative, other.magnitude - self.magnitude)
        };
        Self::bounded(negative, magnitude)
    }

    pub fn sub(&self, other: &Self) -> Result<Self, MathError> {
        self.add(&-*other)
    }

    // ------------------------------------------------------------------------
    // Multiplication
    // ------------------------------------------------------------------------

    fn mul_with(&self, other: &Self, mode: Rounding) -> Result<Self, MathError> {
        let negative = self.negative != other.negative;
        let product = self
            .magnitude
            .checked_mul(other.magnitude)
            .ok_or(MathError::Overflow {
                bits: 1024,
                limit: MAX_DEC_BIT_LEN,
            })?;
        Self::bounded(negative, chop(negative, product, scale(), mode))
    }

    /// Product rounded half to even.
    pub fn mul(&self, other: &Self) -> Result<Self, MathError> {
        self.mul_with(other, Rounding::HalfEven)
    }

    pub fn mul_truncate(&self, other: &Self) -> Result<Self, MathError> {
        self.mul_with(other, Rounding::Truncate)
    }

    pub fn mul_round_up(&self, other: &Self) -> Result<Self, MathError> {
        self.mul_with(other, Rounding::Up)
    }

    /// Exact product with an integer amount.
    pub fn mul_int(&self, value: U256) -> Result<Self, MathError> {
        let product = self
            .magnitude
            .checked_mul(widen(value))
            .ok_or(MathError::Overflow {
                bits: 1024,
                limit: MAX_DEC_BIT_LEN,
            })?;
        Self::bounded(self.negative, product)
    }

    // ------------------------------------------------------------------------
    // Division
    // ------------------------------------------------------------------------

    /// Quotient rounded half to even.
    ///
    /// The scaled dividend is first divided with truncation and the result is
    /// then rounded back to 27 digits.
    pub fn quo(&self, other: &Self) -> Result<Self, MathError> {
        if other.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let negative = self.negative != other.negative;
        let numerator = self.magnitude * pow10(2 * PRECISION as usize)?;
        let truncated = numerator / other.magnitude;
        Self::bounded(negative, chop(negative, truncated, scale(), Rounding::HalfEven))
    }

    pub fn quo_truncate(&self, other: &Self) -> Result<Self, MathError> {
        self.quo_single(other, Rounding::Truncate)
    }

    pub fn quo_round_up(&self, other: &Self) -> Result<Self, MathError> {
        self.quo_single(other, Rounding::Up)
    }

    fn quo_single(&self, other: &Self, mode: Rounding) -> Result<Self, MathError> {
        if other.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let negative = self.negative != other.negative;
        let numerator = self.magnitude * scale();
        Self::bounded(negative, chop(negative, numerator, other.magnitude, mode))
    }

    /// Divide the raw value by an integer, truncating toward zero.
    pub fn quo_int(&self, value: U256) -> Result<Self, MathError> {
        if value.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self::raw(self.negative, self.magnitude / widen(value)))
    }

    pub fn quo_u64(&self, value: u64) -> Result<Self, MathError> {
        self.quo_int(U256::from(value))
    }

    // ------------------------------------------------------------------------
    // Powers and roots
    // ------------------------------------------------------------------------

    /// `self^power` by repeated squaring, each step rounded half to even.
    pub fn power(&self, power: u64) -> Result<Self, MathError> {
        if power == 0 {
            return Ok(Self::one());
        }
        let mut base = *self;
        let mut acc = Self::one();
        let mut i = power;
        while i > 1 {
            if i % 2 != 0 {
                acc = acc.mul(&base)?;
            }
            i /= 2;
            base = base.mul(&base)?;
        }
        base.mul(&acc)
    }

    /// Newton's method approximation of the `root`-th root.
    ///
    /// Stops once the correction is within one ulp or after 300 iterations.
    /// A negative input yields the negated root of its absolute value.
    pub fn approx_root(&self, root: u64) -> Result<Self, MathError> {
        if self.negative {
            return Ok(-self.abs().approx_root(root)?);
        }
        if root == 1 || self.is_zero() || *self == Self::one() {
            return Ok(*self);
        }
        if root == 0 {
            return Ok(Self::one());
        }

        let smallest = Self::smallest();
        let mut guess = Self::one();
        let mut delta = Self::one();
        let mut iter = 0;
        while iter < MAX_APPROX_ROOT_ITERATIONS && delta.abs() > smallest {
            let mut prev = if root == 2 {
                guess
            } else {
                guess.power(root - 1)?
            };
            if prev.is_zero() {
                prev = smallest;
            }
            delta = self.quo(&prev)?.sub(&guess)?;
            delta = if root == 2 {
                delta.half_floor()
            } else {
                delta.quo_u64(root)?
            };
            guess = guess.add(&delta)?;
            iter += 1;
        }
        Ok(guess)
    }

    pub fn approx_sqrt(&self) -> Result<Self, MathError> {
        self.approx_root(2)
    }

    /// Raw value halved with rounding toward negative infinity.
    fn half_floor(&self) -> Self {
        if self.negative {
            Self::raw(true, (self.magnitude + wide_one()) >> 1usize)
        } else {
            Self::raw(false, self.magnitude >> 1usize)
        }
    }

    // ------------------------------------------------------------------------
    // Integer conversions
    // ------------------------------------------------------------------------

    /// Smallest integer not below `self`; negative values truncate.
    pub fn ceil(&self) -> Result<Self, MathError> {
        let (quo, rem) = self.magnitude.div_rem(scale());
        let int = if rem.is_zero() || self.negative {
            quo
        } else {
            quo + wide_one()
        };
        Self::bounded(self.negative, int * scale())
    }

    /// Integer part as a decimal.
    pub fn truncate(&self) -> Self {
        Self::raw(self.negative, (self.magnitude / scale()) * scale())
    }

    /// Integer part as an amount. Fails for negative values.
    pub fn truncate_int(&self) -> Result<U256, MathError> {
        self.to_amount(self.magnitude / scale())
    }

    /// Nearest integer (half to even) as an amount. Fails for negative values.
    pub fn round_int(&self) -> Result<U256, MathError> {
        self.to_amount(chop(
            self.negative,
            self.magnitude,
            scale(),
            Rounding::HalfEven,
        ))
    }

    fn to_amount(&self, int: Wide) -> Result<U256, MathError> {
        if self.negative && !int.is_zero() {
            return Err(MathError::Negative(self.to_string()));
        }
        narrow(&int).ok_or_else(|| MathError::OutOfRange(self.to_string()))
    }

    pub fn is_integer(&self) -> bool {
        (self.magnitude % scale()).is_zero()
    }

    // ------------------------------------------------------------------------
    // Encodings
    // ------------------------------------------------------------------------

    /// Byte string whose lexicographic order matches numeric order for
    /// non-negative values up to 10^27.
    pub fn sortable_bytes(&self) -> Result<Vec<u8>, MathError> {
        let max = scale() * scale();
        match self.magnitude.cmp(&max) {
            Ordering::Greater => return Err(MathError::OutOfRange(self.to_string())),
            Ordering::Equal if self.negative => return Ok(b"--".to_vec()),
            Ordering::Equal => return Ok(b"max".to_vec()),
            Ordering::Less => {}
        }
        let padded = format!("{:0>width$}", self.abs().to_string(), width = SORTABLE_WIDTH);
        let mut out = Vec::with_capacity(padded.len() + 1);
        if self.negative {
            out.push(b'-');
        }
        out.extend_from_slice(padded.as_bytes());
        Ok(out)
    }

    /// Little-endian magnitude bytes (64 bytes hold the 345-bit bound).
    pub fn magnitude_le_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        for (i, limb) in self.magnitude.as_limbs()[..8].iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    /// Inverse of [`PrecDec::magnitude_le_bytes`].
    pub fn from_le_bytes(negative: bool, bytes: &[u8]) -> Result<Self, MathError> {
        if bytes.len() > 128 {
            return Err(MathError::OutOfRange(format!("{} magnitude bytes", bytes.len())));
        }
        let mut limbs = [0u64; 16];
        for (i, chunk) in bytes.chunks(8).enumerate() {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            limbs[i] = u64::from_le_bytes(buf);
        }
        Self::bounded(negative, Wide::from_limbs(limbs))
    }

    /// Parse `1.5`, `15E-1`, `0.015e+2` style literals.
    ///
    /// The mantissa is parsed as a plain decimal, then multiplied (positive
    /// exponent) or divided (negative exponent) by the power of ten.
    pub fn from_scientific(input: &str) -> Result<Self, MathError> {
        let fail = |reason| MathError::Parse {
            input: input.to_string(),
            reason,
        };
        let (base, exponent) = match input.find(['e', 'E']) {
            Some(pos) => (&input[..pos], Some(&input[pos + 1..])),
            None => (input, None),
        };
        if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Err(fail("mantissa must contain only digits and '.'"));
        }
        let mantissa: PrecDec = base.parse()?;
        let Some(exponent) = exponent else {
            return Ok(mantissa);
        };

        let (negative, digits) = match exponent.as_bytes().first() {
            Some(b'-') => (true, &exponent[1..]),
            Some(b'+') => (false, &exponent[1..]),
            _ => (false, exponent),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail("exponent must be an optionally signed integer"));
        }
        let power: usize = digits.parse().map_err(|_| fail("exponent too large"))?;
        if mantissa.is_zero() {
            return Ok(mantissa);
        }

        if negative {
            // Same rounding as `quo` by 10^power: truncate to 54 digits,
            // then round half to even back to 27.
            let precision = PRECISION as usize;
            let truncated = if power <= precision {
                mantissa.magnitude * pow10(precision - power)?
            } else {
                match pow10(power - precision) {
                    Ok(divisor) => mantissa.magnitude / divisor,
                    Err(_) => Wide::ZERO,
                }
            };
            Self::bounded(false, chop(false, truncated, scale(), Rounding::HalfEven))
        } else {
            if power > MAX_SCIENTIFIC_EXPONENT {
                return Err(fail("exponent too large"));
            }
            let magnitude = mantissa
                .magnitude
                .checked_mul(pow10(power)?)
                .ok_or_else(|| fail("value out of range"))?;
            Self::bounded(false, magnitude).map_err(|_| fail("value out of range"))
        }
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl Neg for PrecDec {
    type Output = PrecDec;

    fn neg(self) -> Self::Output {
        Self::raw(!self.negative, self.magnitude)
    }
}

impl Ord for PrecDec {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PrecDec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PrecDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = wide_to_decimal(&self.magnitude);
        let precision = PRECISION as usize;
        let (int_part, frac_part) = if digits.len() <= precision {
            ("0".to_string(), format!("{digits:0>precision$}"))
        } else {
            let split = digits.len() - precision;
            (digits[..split].to_string(), digits[split..].to_string())
        };
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{int_part}.{frac_part}")
    }
}

impl fmt::Debug for PrecDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrecDec({self})")
    }
}

impl FromStr for PrecDec {
    type Err = MathError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason| MathError::Parse {
            input: input.to_string(),
            reason,
        };
        if input.is_empty() {
            return Err(fail("empty string"));
        }
        let (negative, body) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        if body.is_empty() {
            return Err(fail("empty string"));
        }

        let mut parts = body.split('.');
        let int_part = parts.next().unwrap_or_default();
        let frac_part = parts.next();
        if parts.next().is_some() {
            return Err(fail("more than one decimal point"));
        }
        let frac_part = match frac_part {
            Some(frac) if frac.is_empty() || int_part.is_empty() => {
                return Err(fail("empty integer or fractional part"));
            }
            Some(frac) => frac,
            None => "",
        };
        if frac_part.len() > PRECISION as usize {
            return Err(fail("too many fractional digits"));
        }
        if int_part.is_empty() {
            return Err(fail("empty integer part"));
        }

        let ten = Wide::from(10u64);
        let mut magnitude = Wide::ZERO;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return Err(fail("non-digit character"));
            }
            magnitude = magnitude * ten + Wide::from(u64::from(b - b'0'));
            if magnitude.bit_len() > MAX_DEC_BIT_LEN {
                return Err(fail("value out of range"));
            }
        }
        let magnitude = magnitude * pow10(PRECISION as usize - frac_part.len())?;
        Self::bounded(negative, magnitude).map_err(|_| fail("value out of range"))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
