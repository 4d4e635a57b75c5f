//! Limit order types.
//!
//! ## Representation
//!
//! Order types are persisted as a single `u8` inside SSZ records:
//!
//! | Value | Type | Rests on book | Expires |
//! |---|---|---|---|
//! | 0 | `GoodTilCancelled` | yes | never |
//! | 1 | `FillOrKill` | no | - |
//! | 2 | `ImmediateOrCancel` | no | - |
//! | 3 | `JustInTime` | yes | end of the placing block |
//! | 4 | `GoodTilTime` | yes | at its expiration time |

/// Expiration time stored for just-in-time tranches. Sorts before every
/// real block time so the sweep always reaches them first.
pub const JIT_EXPIRATION_TIME: i64 = 0;

// ============================================================================
// LimitOrderType enum
// ============================================================================

/// Lifetime policy of a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LimitOrderType {
    /// Rests until fully filled or cancelled
    #[default]
    GoodTilCancelled,
    /// Must fill completely or the whole message fails
    FillOrKill,
    /// Fills what it can, the remainder is never debited
    ImmediateOrCancel,
    /// Rests for the current block only
    JustInTime,
    /// Rests until the given expiration time
    GoodTilTime,
}

impl LimitOrderType {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            LimitOrderType::GoodTilCancelled => 0,
            LimitOrderType::FillOrKill => 1,
            LimitOrderType::ImmediateOrCancel => 2,
            LimitOrderType::JustInTime => 3,
            LimitOrderType::GoodTilTime => 4,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LimitOrderType::GoodTilCancelled),
            1 => Some(LimitOrderType::FillOrKill),
            2 => Some(LimitOrderType::ImmediateOrCancel),
            3 => Some(LimitOrderType::JustInTime),
            4 => Some(LimitOrderType::GoodTilTime),
            _ => None,
        }
    }

    pub fn is_gtc(self) -> bool {
        self == LimitOrderType::GoodTilCancelled
    }

    pub fn is_fok(self) -> bool {
        self == LimitOrderType::FillOrKill
    }

    pub fn is_ioc(self) -> bool {
        self == LimitOrderType::ImmediateOrCancel
    }

    pub fn is_jit(self) -> bool {
        self == LimitOrderType::JustInTime
    }

    pub fn is_good_til(self) -> bool {
        self == LimitOrderType::GoodTilTime
    }

    /// Orders that only take liquidity and never rest.
    pub fn is_taker_only(self) -> bool {
        self.is_fok() || self.is_ioc()
    }

    /// Resting orders that register an expiration record.
    pub fn has_expiration(self) -> bool {
        self.is_jit() || self.is_good_til()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LimitOrderType::GoodTilCancelled => "GOOD_TIL_CANCELLED",
            LimitOrderType::FillOrKill => "FILL_OR_KILL",
            LimitOrderType::ImmediateOrCancel => "IMMEDIATE_OR_CANCEL",
            LimitOrderType::JustInTime => "JUST_IN_TIME",
            LimitOrderType::GoodTilTime => "GOOD_TIL_TIME",
        }
    }
}

impl std::fmt::Display for LimitOrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
