//! Core data types of the Dex.
//!
//! ## Types
//!
//! - [`PairId`] / [`TradePairId`]: markets and their directional sides
//! - [`LimitOrderType`]: order lifetime policy
//! - [`PoolReserves`] / [`Pool`]: AMM liquidity
//! - [`LimitOrderTranche`] / [`LimitOrderTrancheUser`]: limit order liquidity
//! - [`TickLiquidity`]: either of the above at a tick
//! - [`LimitOrderExpiration`]: expiry pointer to a tranche
//! - [`BlockReceipt`]: per-block summary with state root
//!
//! ## Amounts
//!
//! Token amounts are `U256` integers. Prices and ratios are [`PrecDec`]
//! (27 fractional digits); see [`price`] for the tick ladder.
//!
//! [`PrecDec`]: crate::math::PrecDec

mod order;
mod pair;
mod pool_reserves;
mod pool;
mod tranche;
mod tranche_user;
mod liquidity;
mod receipt;
pub mod price;

pub use order::{LimitOrderType, JIT_EXPIRATION_TIME};
pub use pair::{normalize_tick_index, sort_tokens, PairId, TradePairId};
pub use pool_reserves::{PoolReserves, PoolReservesKey};
pub use pool::{
    calc_amount_as_token0, calc_fee, calc_greatest_matching_ratio, calc_residual_value,
    parse_pool_denom, pool_denom, DepositResult, Pool, PoolMetadata, POOL_DENOM_PREFIX,
};
pub use tranche::{LimitOrderExpiration, LimitOrderTranche, LimitOrderTrancheKey};
pub use tranche_user::LimitOrderTrancheUser;
pub use liquidity::TickLiquidity;
pub use receipt::BlockReceipt;
