//! Module parameters loaded from TOML.
//!
//! ## Example
//!
//! ```
//! use tick_dex::config::Params;
//!
//! let params = Params::from_toml_str(r#"
//! fee_tiers = [0, 1, 5]
//! max_jits_per_block = 4
//! "#).unwrap();
//! assert_eq!(params.fee_tiers, vec![0, 1, 5]);
//! assert!(!params.paused);
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DexError, Result};
use crate::math::PrecDec;
use crate::types::price::MAX_TICK_EXP;

/// Fee tiers, in ticks, that pools may be created with.
pub const DEFAULT_FEE_TIERS: [u64; 12] = [0, 1, 2, 3, 4, 5, 10, 20, 50, 100, 150, 200];

pub const DEFAULT_MAX_JITS_PER_BLOCK: u64 = 25;

/// Good-til-time records the expiration sweep may retire per block.
pub const DEFAULT_GOOD_TIL_PURGE_ALLOWANCE: u64 = 540_000;

/// Dex module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Allowed pool fees in ticks
    pub fee_tiers: Vec<u64>,

    /// Largest tolerated gap between limit price and realized taker price
    #[serde(with = "prec_dec_str")]
    pub max_true_taker_spread: PrecDec,

    /// Just-in-time placements allowed per block
    pub max_jits_per_block: u64,

    /// Good-til-time expirations processed per sweep
    pub good_til_purge_allowance: u64,

    /// When set, every message is rejected
    pub paused: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            fee_tiers: DEFAULT_FEE_TIERS.to_vec(),
            // 0.005
            max_true_taker_spread: PrecDec::new_with_prec(5, 3).unwrap_or_default(),
            max_jits_per_block: DEFAULT_MAX_JITS_PER_BLOCK,
            good_til_purge_allowance: DEFAULT_GOOD_TIL_PURGE_ALLOWANCE,
            paused: false,
        }
    }
}

impl Params {
    /// Parse and validate parameters from TOML text. Missing keys take their
    /// default values.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let params: Self = toml::from_str(input).map_err(|e| DexError::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DexError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DexError::Config(e.to_string()))
    }

    /// Check parameter consistency.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::InvalidParams)` - If the fee tiers are empty, repeat a
    ///   value or hold a fee of `MAX_TICK_EXP` or more, or the taker spread
    ///   is outside `[0, 1)`
    pub fn validate(&self) -> Result<()> {
        if self.fee_tiers.is_empty() {
            return Err(DexError::InvalidParams("fee tiers must not be empty".into()));
        }
        let mut seen = BTreeSet::new();
        for &fee in &self.fee_tiers {
            if fee >= MAX_TICK_EXP {
                return Err(DexError::InvalidParams(format!(
                    "fee tier {fee} must be below {MAX_TICK_EXP}"
                )));
            }
            if !seen.insert(fee) {
                return Err(DexError::InvalidParams(format!("duplicate fee tier {fee}")));
            }
        }
        if self.max_true_taker_spread.is_negative() || self.max_true_taker_spread >= PrecDec::one() {
            return Err(DexError::InvalidParams(format!(
                "max true taker spread {} must be in [0, 1)",
                self.max_true_taker_spread
            )));
        }
        Ok(())
    }

    pub fn is_valid_fee(&self, fee: u64) -> bool {
        self.fee_tiers.contains(&fee)
    }
}

/// Decimal strings in TOML, e.g. `max_true_taker_spread = "0.005"`.
mod prec_dec_str {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::math::PrecDec;

    pub fn serialize<S: Serializer>(value: &PrecDec, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PrecDec, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|e| D::Error::custom(format!("{raw}: {e}")))
    }
}
