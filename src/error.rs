//! Error types for the Dex core.
//!
//! Every failure a message handler can report is a [`DexError`] variant.
//! Handlers validate before they mutate, and the engine rolls back the store
//! and bank journals whenever a handler returns `Err`, so any error leaves
//! state untouched.

use thiserror::Error;

use crate::math::MathError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DexError>;

/// Encoding failures of stored records and keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("ssz serialize failed: {0}")]
    Serialize(String),

    #[error("ssz deserialize failed: {0}")]
    Deserialize(String),

    /// Tick liquidity value with a tag that is neither pool nor tranche
    #[error("unknown tick liquidity tag {0}")]
    UnknownLiquidityTag(u8),

    #[error("unknown order type {0}")]
    UnknownOrderType(u8),

    /// Record still in a pre-migration layout
    #[error("legacy record layout, run migrations first")]
    LegacyRecord,

    #[error("invalid utf-8 in field {0}")]
    InvalidUtf8(&'static str),

    #[error("field too long: {0}")]
    FieldTooLong(String),

    #[error("malformed key: {0}")]
    MalformedKey(String),
}

/// Errors returned by Dex operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexError {
    // ------------------------------------------------------------------------
    // Deposit / withdraw
    // ------------------------------------------------------------------------
    #[error("deposit amounts are both zero after matching the pool ratio")]
    ZeroTrueDeposit,

    #[error("withdrawal of zero shares")]
    ZeroWithdraw,

    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: String, available: String },

    #[error("input arrays must all have the same length")]
    UnbalancedTxArray,

    #[error("deposit amount must be positive on at least one side")]
    ZeroDeposit,

    #[error("duplicate pool deposit at tick {tick} fee {fee}")]
    DuplicatePoolDeposit { tick: i64, fee: u64 },

    #[error("deposit would mint zero shares")]
    DepositShareUnderflow,

    #[error("deposit at tick {tick} fee {fee} is behind enemy lines")]
    DepositBehindEnemyLines { tick: i64, fee: u64 },

    #[error("swap on deposit cannot swap both tokens")]
    DoubleSidedSwapOnDeposit,

    #[error("swap on deposit requires autoswap")]
    SwapOnDepositWithoutAutoswap,

    // ------------------------------------------------------------------------
    // Limit orders
    // ------------------------------------------------------------------------
    #[error("limit order tranche not found for user: {0}")]
    ValidLimitOrderTrancheNotFound(String),

    #[error("active limit order not found: {0}")]
    ActiveLimitOrderNotFound(String),

    #[error("fill-or-kill limit order could not be filled")]
    FoKLimitOrderNotFilled,

    #[error("nothing to withdraw from limit order")]
    WithdrawEmptyLimitOrder,

    #[error("nothing to cancel for limit order {0}")]
    CancelEmptyLimitOrder(String),

    #[error("limit order amount must be positive")]
    ZeroLimitOrder,

    #[error("trade is too small to produce any output")]
    TradeTooSmall,

    #[error("no liquidity available at the requested price")]
    NoLiquidity,

    #[error("good-til-time order requires an expiration time")]
    GoodTilOrderWithoutExpiration,

    #[error("only good-til-time orders may set an expiration time")]
    ExpirationOnWrongOrderType,

    #[error("expiration time {expiration} is not after block time {block_time}")]
    ExpirationTimeInPast { expiration: i64, block_time: i64 },

    #[error("max amount out is only valid for taker orders")]
    InvalidMaxAmountOutForMaker,

    #[error("max amount out must be positive")]
    ZeroMaxAmountOut,

    #[error("maximum just-in-time orders per block ({0}) exceeded")]
    OverJITPerBlockLimit(u64),

    #[error("specify exactly one of tick index and limit sell price")]
    InvalidPriceAndTick,

    // ------------------------------------------------------------------------
    // Ticks, fees, pairs
    // ------------------------------------------------------------------------
    #[error("tick {0} is outside the valid range")]
    TickOutsideRange(i64),

    #[error("price {0} is outside the valid range")]
    PriceOutsideRange(String),

    #[error("fee {0} is not a valid fee tier")]
    InvalidFee(u64),

    #[error("invalid trading pair {0}<>{1}")]
    InvalidTradingPair(String, String),

    #[error("invalid pool denom {0}")]
    InvalidPoolDenom(String),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    // ------------------------------------------------------------------------
    // Module level
    // ------------------------------------------------------------------------
    #[error("dex is paused")]
    DexPaused,

    #[error("insufficient funds: {address} has {available} {denom}, needs {required}")]
    InsufficientFunds {
        address: String,
        denom: String,
        available: String,
        required: String,
    },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A condition the engine guarantees can never hold was observed
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl DexError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        DexError::InvariantViolation(msg.into())
    }
}
