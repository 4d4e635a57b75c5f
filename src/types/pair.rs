//! Trading pair identifiers.
//!
//! ## PairId vs TradePairId
//!
//! A [`PairId`] names a market without direction: its two tokens are sorted
//! so that `token0 < token1`. A [`TradePairId`] names one side of that
//! market: the token resting on the book (`maker_denom`) and the token a
//! taker pays with (`taker_denom`).
//!
//! ```
//! use tick_dex::types::{PairId, TradePairId};
//!
//! let pair = PairId::new("uatom", "untrn").unwrap();
//! assert_eq!(pair.to_string(), "uatom<>untrn");
//!
//! let tp = TradePairId::new("untrn", "uatom");
//! assert_eq!(tp.pair_id().unwrap(), pair);
//! assert_eq!(tp.reversed().maker_denom, "uatom");
//! ```

use std::fmt;

use crate::error::{DexError, Result};

/// Order the two denoms of a market, rejecting identical or empty tokens.
pub fn sort_tokens(token_a: &str, token_b: &str) -> Result<(String, String)> {
    if token_a.is_empty() || token_b.is_empty() || token_a == token_b {
        return Err(DexError::InvalidTradingPair(
            token_a.to_string(),
            token_b.to_string(),
        ));
    }
    if token_a < token_b {
        Ok((token_a.to_string(), token_b.to_string()))
    } else {
        Ok((token_b.to_string(), token_a.to_string()))
    }
}

/// Convert a tick quoted as `token_a -> token_b` into the `token0 -> token1`
/// orientation of the sorted pair.
pub fn normalize_tick_index(token_a: &str, token0: &str, tick_index_a_to_b: i64) -> i64 {
    if token_a == token0 {
        tick_index_a_to_b
    } else {
        -tick_index_a_to_b
    }
}

// ============================================================================
// PairId
// ============================================================================

/// Direction-free market identifier with sorted tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId {
    pub token0: String,
    pub token1: String,
}

impl PairId {
    pub fn new(token_a: &str, token_b: &str) -> Result<Self> {
        let (token0, token1) = sort_tokens(token_a, token_b)?;
        Ok(Self { token0, token1 })
    }

    /// Trade pair where `maker_denom` rests and the other token is paid in.
    pub fn trade_pair_for_maker(&self, maker_denom: &str) -> Result<TradePairId> {
        let taker = self.opposite(maker_denom)?;
        Ok(TradePairId::new(maker_denom, taker))
    }

    /// Trade pair where `taker_denom` is paid in.
    pub fn trade_pair_for_taker(&self, taker_denom: &str) -> Result<TradePairId> {
        let maker = self.opposite(taker_denom)?;
        Ok(TradePairId::new(maker, taker_denom))
    }

    fn opposite(&self, denom: &str) -> Result<&str> {
        if denom == self.token0 {
            Ok(&self.token1)
        } else if denom == self.token1 {
            Ok(&self.token0)
        } else {
            Err(DexError::InvalidTradingPair(
                denom.to_string(),
                self.to_string(),
            ))
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<>{}", self.token0, self.token1)
    }
}

// ============================================================================
// TradePairId
// ============================================================================

/// Directional market side: the maker token rests, the taker token pays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TradePairId {
    pub maker_denom: String,
    pub taker_denom: String,
}

impl TradePairId {
    pub fn new(maker_denom: impl Into<String>, taker_denom: impl Into<String>) -> Self {
        Self {
            maker_denom: maker_denom.into(),
            taker_denom: taker_denom.into(),
        }
    }

    /// Trade pair for an order paying `token_in` to receive `token_out`.
    pub fn from_tokens(token_in: &str, token_out: &str) -> Self {
        Self::new(token_out, token_in)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.taker_denom.clone(), self.maker_denom.clone())
    }

    pub fn pair_id(&self) -> Result<PairId> {
        PairId::new(&self.maker_denom, &self.taker_denom)
    }

    /// True when the maker token is `token0` of the sorted pair.
    pub fn is_maker_token0(&self) -> bool {
        self.maker_denom < self.taker_denom
    }
}

impl fmt::Display for TradePairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.taker_denom, self.maker_denom)
    }
}
