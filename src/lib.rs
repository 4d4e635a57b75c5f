//! # Tick Dex
//!
//! Tick-indexed liquidity and matching core of a deterministic Dex module:
//! constant-price AMM pools and price-time-priority limit orders sharing one
//! tick ladder.
//!
//! ## Architecture
//!
//! The core consists of:
//! - **Math**: [`PrecDec`], a signed 27-digit fixed-point decimal
//! - **Types**: pairs, pools, tranches, the tick/price codec and receipts
//! - **Store**: ordered key-value store with journaled frames and SSZ records
//! - **Bank**: coin movements between accounts and the module account
//! - **OrderBook**: tick liquidity iteration and persistence rules
//! - **Engine**: message handlers, block lifecycle and queries
//! - **Migrations**: versioned rewrites of stored records
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical messages in identical order give identical state roots
//! 2. **No Floating Point**: Amounts are `U256`, prices are [`PrecDec`]
//! 3. **Atomicity**: A failed message leaves the store and the bank untouched
//! 4. **Conservation**: Module balances always equal pool plus tranche reserves
//!
//! [`PrecDec`]: math::PrecDec

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// 27-digit decimal and amount helpers
pub mod math;

/// Core data types: pairs, pools, tranches, prices
pub mod types;

/// Journaled key-value store and record codec
pub mod store;

/// Bank capability and in-memory implementation
pub mod bank;

/// Tick liquidity iteration
pub mod orderbook;

/// Module parameters
pub mod config;

/// Message execution engine
pub mod engine;

/// Store migrations
pub mod migrations;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use bank::{BankKeeper, Coin, MemoryBank, MODULE_ACCOUNT};
pub use config::Params;
pub use engine::{BlockContext, DexEngine, Msg, MsgResponse, SwapResult};
pub use error::{DexError, Result};
pub use math::PrecDec;
pub use migrations::{Migrator, SCHEMA_VERSION};
pub use types::{BlockReceipt, LimitOrderType, PairId, TradePairId};
