//! Order book view over the tick-liquidity store.
//!
//! ## Architecture
//!
//! Pools and limit order tranches for a trade pair share one ordered prefix:
//!
//! - **Ticks**: ascending tick = best price for the taker first
//! - **Within a tick**: pool reserves (`A_PoolDeposit`) before tranches
//!   (`B_LODeposit`)
//! - **Tranches**: FIFO by tranche key (block height, then sequence)
//!
//! ## Components
//!
//! - [`Liquidity`]: a pool or a tranche, with a uniform `swap` and `save`
//! - [`LiquidityIterator`]: cursor that yields tradable liquidity in price
//!   order and tolerates writes between steps
//!
//! ## Example
//!
//! ```
//! use alloy_primitives::U256;
//! use tick_dex::orderbook::LiquidityIterator;
//! use tick_dex::store::KvStore;
//! use tick_dex::types::{PairId, TradePairId};
//!
//! let mut store = KvStore::new();
//! let pair = PairId::new("TokenA", "TokenB").unwrap();
//! let mut pool = store.get_or_init_pool(&pair, 0, 1).unwrap();
//! pool.deposit(U256::from(100u64), U256::from(100u64), U256::ZERO, false).unwrap();
//! store.set_pool(&pool).unwrap();
//!
//! let mut iter = LiquidityIterator::new(TradePairId::new("TokenB", "TokenA"), 0);
//! let best = iter.next(&store).unwrap().unwrap();
//! assert_eq!(best.tick_index(), 1);
//! ```

pub mod iterator;
pub mod liquidity;

pub use iterator::LiquidityIterator;
pub use liquidity::{save_inactive_tranche, save_tranche, Liquidity, PoolLiquidity};
