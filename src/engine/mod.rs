//! Message execution engine for the Dex.
//!
//! ## Design Principles
//!
//! The engine is designed for:
//!
//! 1. **Determinism**: Same messages in the same order produce the same state root
//! 2. **Fixed-Point Math**: Prices are [`PrecDec`], amounts are `U256`; no floats
//! 3. **Atomicity**: Every message runs inside a store and a bank journal frame
//! 4. **Price-Time Priority**: Best tick first, pools before tranches, tranches FIFO
//!
//! ## Block Lifecycle
//!
//! ```text
//! begin_block(height, time)   purge expired orders, reset per-block counters
//! execute(msg) ...            one atomic frame per message
//! end_block()                 BlockReceipt with the state root
//! ```
//!
//! ## Example
//!
//! ```
//! use alloy_primitives::U256;
//! use tick_dex::bank::MemoryBank;
//! use tick_dex::config::Params;
//! use tick_dex::engine::{DexEngine, Msg, MsgDeposit};
//!
//! let mut bank = MemoryBank::new();
//! bank.fund("alice", "TokenA", U256::from(1_000u64)).unwrap();
//! let mut engine = DexEngine::new(Params::default(), bank).unwrap();
//!
//! engine.begin_block(1, 1_700_000_000).unwrap();
//! let deposit = MsgDeposit::single("alice", "TokenA", "TokenB", U256::from(100u64), U256::ZERO, 0, 1);
//! engine.execute(&Msg::Deposit(deposit)).unwrap();
//! let receipt = engine.end_block();
//!
//! assert_eq!(receipt.messages_processed, 1);
//! assert_eq!(receipt.messages_failed, 0);
//! ```
//!
//! [`PrecDec`]: crate::math::PrecDec

mod cancel;
mod deposit;
mod expiration;
mod limit_order;
mod matcher;
pub mod msg;
mod query;
mod withdraw;
mod withdraw_filled;

use tracing::{debug, warn};

use crate::bank::{BankKeeper, MemoryBank};
use crate::config::Params;
use crate::error::{DexError, Result};
use crate::migrations::{Migrator, SCHEMA_VERSION};
use crate::store::keys::new_tranche_key;
use crate::store::KvStore;
use crate::types::BlockReceipt;

pub use matcher::SwapResult;
pub use msg::{
    DepositOptions, FailedDeposit, Msg, MsgCancelLimitOrder, MsgCancelLimitOrderResponse,
    MsgDeposit, MsgDepositResponse, MsgPlaceLimitOrder, MsgPlaceLimitOrderResponse, MsgResponse,
    MsgWithdrawFilledLimitOrder, MsgWithdrawFilledLimitOrderResponse, MsgWithdrawal,
    MsgWithdrawalResponse,
};

/// Height and time of the block being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockContext {
    pub height: u64,
    /// Unix seconds
    pub block_time: i64,
}

/// Transient per-block counters. Restored together with the journals when
/// a message is rolled back.
#[derive(Debug, Clone, Copy, Default)]
struct BlockCounters {
    jits_placed: u64,
    tranches_opened: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct BlockStats {
    messages_processed: u64,
    messages_failed: u64,
    orders_purged: u64,
}

/// Dex state machine over a [`KvStore`] and a [`BankKeeper`].
#[derive(Debug, Clone)]
pub struct DexEngine<B: BankKeeper = MemoryBank> {
    store: KvStore,
    bank: B,
    params: Params,
    ctx: BlockContext,
    counters: BlockCounters,
    stats: BlockStats,
}

impl<B: BankKeeper> DexEngine<B> {
    /// Engine over an empty store at the current schema version.
    pub fn new(params: Params, bank: B) -> Result<Self> {
        let mut store = KvStore::new();
        store.set_schema_version(SCHEMA_VERSION)?;
        Self::with_store(store, params, bank)
    }

    /// Engine over existing state, e.g. a store awaiting migrations.
    pub fn with_store(store: KvStore, params: Params, bank: B) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            store,
            bank,
            params,
            ctx: BlockContext::default(),
            counters: BlockCounters::default(),
            stats: BlockStats::default(),
        })
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Direct bank access for funding accounts outside of messages.
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn context(&self) -> BlockContext {
        self.ctx
    }

    pub fn into_parts(self) -> (KvStore, B) {
        (self.store, self.bank)
    }

    // ========================================================================
    // Block lifecycle
    // ========================================================================

    /// Start a block: reset per-block counters and retire expired orders.
    ///
    /// # Returns
    ///
    /// Number of tranches moved to the inactive set.
    pub fn begin_block(&mut self, height: u64, block_time: i64) -> Result<u64> {
        self.ctx = BlockContext { height, block_time };
        self.counters = BlockCounters::default();
        self.stats = BlockStats::default();

        let purged = self.atomic(|engine| engine.purge_expired_limit_orders(block_time))?;
        self.stats.orders_purged = purged;
        debug!(height, block_time, purged, "begin block");
        Ok(purged)
    }

    /// Close the block and summarize it.
    pub fn end_block(&mut self) -> BlockReceipt {
        BlockReceipt::new(
            self.ctx.height,
            u64::try_from(self.ctx.block_time).unwrap_or_default(),
            self.stats.messages_processed,
            self.stats.messages_failed,
            self.stats.orders_purged,
            self.store.state_root(),
        )
    }

    /// Apply pending store migrations.
    ///
    /// # Returns
    ///
    /// The schema version after migrating.
    pub fn run_migrations(&mut self) -> Result<u64> {
        Migrator::run_migrations(&mut self.store, &mut self.bank)
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Execute one message atomically.
    pub fn execute(&mut self, msg: &Msg) -> Result<MsgResponse> {
        match msg {
            Msg::Deposit(m) => self.deposit(m).map(MsgResponse::Deposit),
            Msg::Withdrawal(m) => self.withdraw(m).map(MsgResponse::Withdrawal),
            Msg::PlaceLimitOrder(m) => self.place_limit_order(m).map(MsgResponse::PlaceLimitOrder),
            Msg::CancelLimitOrder(m) => self.cancel_limit_order(m).map(MsgResponse::CancelLimitOrder),
            Msg::WithdrawFilledLimitOrder(m) => self
                .withdraw_filled_limit_order(m)
                .map(MsgResponse::WithdrawFilledLimitOrder),
        }
    }

    pub fn deposit(&mut self, msg: &MsgDeposit) -> Result<MsgDepositResponse> {
        self.run_message("deposit", &msg.creator, |engine| engine.handle_deposit(msg))
    }

    pub fn withdraw(&mut self, msg: &MsgWithdrawal) -> Result<MsgWithdrawalResponse> {
        self.run_message("withdrawal", &msg.creator, |engine| engine.handle_withdrawal(msg))
    }

    pub fn place_limit_order(&mut self, msg: &MsgPlaceLimitOrder) -> Result<MsgPlaceLimitOrderResponse> {
        self.run_message("place_limit_order", &msg.creator, |engine| {
            engine.handle_place_limit_order(msg)
        })
    }

    pub fn cancel_limit_order(&mut self, msg: &MsgCancelLimitOrder) -> Result<MsgCancelLimitOrderResponse> {
        self.run_message("cancel_limit_order", &msg.creator, |engine| {
            engine.handle_cancel_limit_order(msg)
        })
    }

    pub fn withdraw_filled_limit_order(
        &mut self,
        msg: &MsgWithdrawFilledLimitOrder,
    ) -> Result<MsgWithdrawFilledLimitOrderResponse> {
        self.run_message("withdraw_filled_limit_order", &msg.creator, |engine| {
            engine.handle_withdraw_filled_limit_order(msg)
        })
    }

    /// Run a deposit and discard its effects.
    pub fn simulate_deposit(&mut self, msg: &MsgDeposit) -> Result<MsgDepositResponse> {
        self.simulate(|engine| engine.handle_deposit(msg))
    }

    /// Run a limit order placement and discard its effects.
    pub fn simulate_place_limit_order(
        &mut self,
        msg: &MsgPlaceLimitOrder,
    ) -> Result<MsgPlaceLimitOrderResponse> {
        self.simulate(|engine| engine.handle_place_limit_order(msg))
    }

    // ========================================================================
    // Journals
    // ========================================================================

    fn run_message<T>(
        &mut self,
        name: &'static str,
        creator: &str,
        handler: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.stats.messages_processed += 1;
        let result = self.atomic(handler);
        if let Err(err) = &result {
            self.stats.messages_failed += 1;
            warn!(msg = name, creator, error = %err, "message rolled back");
        }
        result
    }

    /// Commit `f`'s writes if it succeeds, otherwise roll everything back.
    fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let counters = self.counters;
        self.store.begin();
        self.bank.begin();
        match f(self) {
            Ok(value) => {
                self.store.commit();
                self.bank.commit();
                Ok(value)
            }
            Err(err) => {
                self.store.rollback();
                self.bank.rollback();
                self.counters = counters;
                Err(err)
            }
        }
    }

    /// Run `f` and roll back regardless of its outcome.
    fn simulate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let counters = self.counters;
        self.store.begin();
        self.bank.begin();
        let result = f(self);
        self.store.rollback();
        self.bank.rollback();
        self.counters = counters;
        result
    }

    // ========================================================================
    // Shared checks
    // ========================================================================

    fn assert_not_paused(&self) -> Result<()> {
        if self.params.paused {
            return Err(DexError::DexPaused);
        }
        Ok(())
    }

    fn validate_fee(&self, fee: u64) -> Result<()> {
        if !self.params.is_valid_fee(fee) {
            return Err(DexError::InvalidFee(fee));
        }
        Ok(())
    }

    /// Key for the next tranche opened in this block.
    fn next_tranche_key(&mut self) -> String {
        let key = new_tranche_key(self.ctx.height, self.counters.tranches_opened);
        self.counters.tranches_opened += 1;
        key
    }

    fn assert_can_place_jit(&self) -> Result<()> {
        if self.counters.jits_placed >= self.params.max_jits_per_block {
            return Err(DexError::OverJITPerBlockLimit(self.params.max_jits_per_block));
        }
        Ok(())
    }

    fn increment_jits_placed(&mut self) {
        self.counters.jits_placed += 1;
    }
}
