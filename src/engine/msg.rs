//! Messages accepted by the engine and their responses.
//!
//! ## Validation
//!
//! Each message has a stateless `validate` that runs before any state is
//! read. Checks that need the block context (expiration times) or the
//! module parameters (fee tiers, pause flag) run inside the handlers.

use alloy_primitives::U256;

use crate::bank::Coin;
use crate::error::{DexError, Result};
use crate::math::PrecDec;
use crate::types::price::{is_price_out_of_range, is_tick_out_of_range, validate_tick_fee};
use crate::types::LimitOrderType;

/// Reject empty addresses and characters that would break store keys.
pub fn validate_address(address: &str) -> Result<()> {
    let valid = !address.is_empty()
        && address.len() <= 128
        && address
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    if valid {
        Ok(())
    } else {
        Err(DexError::InvalidAddress(address.to_string()))
    }
}

// ============================================================================
// Deposit
// ============================================================================

/// Per-deposit switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepositOptions {
    /// Only take the part of the deposit matching the pool ratio
    pub disable_autoswap: bool,
    /// Fail the whole message instead of skipping a behind-enemy-lines deposit
    pub fail_tx_on_bel: bool,
    /// Trade against opposing liquidity that is better than the deposit first
    pub swap_on_deposit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgDeposit {
    pub creator: String,
    pub receiver: String,
    pub token_a: String,
    pub token_b: String,
    pub amounts_a: Vec<U256>,
    pub amounts_b: Vec<U256>,
    pub tick_indexes_a_to_b: Vec<i64>,
    pub fees: Vec<u64>,
    pub options: Vec<DepositOptions>,
}

impl MsgDeposit {
    /// Single deposit with default options, credited to `creator`.
    pub fn single(
        creator: &str,
        token_a: &str,
        token_b: &str,
        amount_a: U256,
        amount_b: U256,
        tick_index_a_to_b: i64,
        fee: u64,
    ) -> Self {
        Self {
            creator: creator.to_string(),
            receiver: creator.to_string(),
            token_a: token_a.to_string(),
            token_b: token_b.to_string(),
            amounts_a: vec![amount_a],
            amounts_b: vec![amount_b],
            tick_indexes_a_to_b: vec![tick_index_a_to_b],
            fees: vec![fee],
            options: vec![DepositOptions::default()],
        }
    }

    pub fn with_options(mut self, options: DepositOptions) -> Self {
        self.options = vec![options; self.amounts_a.len()];
        self
    }

    pub fn len(&self) -> usize {
        self.amounts_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts_a.is_empty()
    }

    /// Stateless checks.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::UnbalancedTxArray)` - If the per-deposit arrays differ in length
    /// * `Err(DexError::ZeroDeposit)` - If there are no deposits or one deposits nothing
    /// * `Err(DexError::DuplicatePoolDeposit)` - If a `(tick, fee)` repeats
    pub fn validate(&self) -> Result<()> {
        validate_address(&self.creator)?;
        validate_address(&self.receiver)?;

        let n = self.amounts_a.len();
        if n != self.amounts_b.len()
            || n != self.tick_indexes_a_to_b.len()
            || n != self.fees.len()
            || n != self.options.len()
        {
            return Err(DexError::UnbalancedTxArray);
        }
        if n == 0 {
            return Err(DexError::ZeroDeposit);
        }

        let mut seen = std::collections::BTreeSet::new();
        for i in 0..n {
            let (tick, fee) = (self.tick_indexes_a_to_b[i], self.fees[i]);
            if !seen.insert((tick, fee)) {
                return Err(DexError::DuplicatePoolDeposit { tick, fee });
            }
            if self.amounts_a[i].is_zero() && self.amounts_b[i].is_zero() {
                return Err(DexError::ZeroDeposit);
            }
            validate_tick_fee(tick, fee)?;
        }
        Ok(())
    }
}

/// A deposit skipped because it sat behind enemy lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDeposit {
    pub deposit_idx: usize,
    pub error: DexError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgDepositResponse {
    pub reserve0_deposited: Vec<U256>,
    pub reserve1_deposited: Vec<U256>,
    pub shares_issued: Vec<Coin>,
    pub failed_deposits: Vec<FailedDeposit>,
}

// ============================================================================
// Withdrawal
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgWithdrawal {
    pub creator: String,
    pub receiver: String,
    pub token_a: String,
    pub token_b: String,
    pub shares_to_remove: Vec<U256>,
    pub tick_indexes_a_to_b: Vec<i64>,
    pub fees: Vec<u64>,
}

impl MsgWithdrawal {
    pub fn single(
        creator: &str,
        token_a: &str,
        token_b: &str,
        shares: U256,
        tick_index_a_to_b: i64,
        fee: u64,
    ) -> Self {
        Self {
            creator: creator.to_string(),
            receiver: creator.to_string(),
            token_a: token_a.to_string(),
            token_b: token_b.to_string(),
            shares_to_remove: vec![shares],
            tick_indexes_a_to_b: vec![tick_index_a_to_b],
            fees: vec![fee],
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_address(&self.creator)?;
        validate_address(&self.receiver)?;

        let n = self.fees.len();
        if n != self.tick_indexes_a_to_b.len() || n != self.shares_to_remove.len() {
            return Err(DexError::UnbalancedTxArray);
        }
        if n == 0 {
            return Err(DexError::ZeroWithdraw);
        }
        for i in 0..n {
            if self.shares_to_remove[i].is_zero() {
                return Err(DexError::ZeroWithdraw);
            }
            validate_tick_fee(self.tick_indexes_a_to_b[i], self.fees[i])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgWithdrawalResponse {
    pub reserve0_withdrawn: U256,
    pub reserve1_withdrawn: U256,
    pub shares_burned: Vec<Coin>,
}

// ============================================================================
// Limit orders
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgPlaceLimitOrder {
    pub creator: String,
    pub receiver: String,
    pub token_in: String,
    pub token_out: String,
    /// Ignored when `limit_sell_price` is set; must then be zero
    pub tick_index_in_to_out: i64,
    /// Minimum `token_out` per `token_in`
    pub limit_sell_price: Option<PrecDec>,
    pub amount_in: U256,
    pub order_type: LimitOrderType,
    pub max_amount_out: Option<U256>,
    /// Unix seconds, good-til-time orders only
    pub expiration_time: Option<i64>,
}

impl MsgPlaceLimitOrder {
    pub fn new(
        creator: &str,
        token_in: &str,
        token_out: &str,
        tick_index_in_to_out: i64,
        amount_in: U256,
        order_type: LimitOrderType,
    ) -> Self {
        Self {
            creator: creator.to_string(),
            receiver: creator.to_string(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            tick_index_in_to_out,
            limit_sell_price: None,
            amount_in,
            order_type,
            max_amount_out: None,
            expiration_time: None,
        }
    }

    pub fn with_expiration(mut self, expiration_time: i64) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    pub fn with_max_amount_out(mut self, max_amount_out: U256) -> Self {
        self.max_amount_out = Some(max_amount_out);
        self
    }

    pub fn with_limit_sell_price(mut self, price: PrecDec) -> Self {
        self.limit_sell_price = Some(price);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_address(&self.creator)?;
        validate_address(&self.receiver)?;

        if self.amount_in.is_zero() {
            return Err(DexError::ZeroLimitOrder);
        }
        if self.order_type.is_good_til() && self.expiration_time.is_none() {
            return Err(DexError::GoodTilOrderWithoutExpiration);
        }
        if !self.order_type.is_good_til() && self.expiration_time.is_some() {
            return Err(DexError::ExpirationOnWrongOrderType);
        }
        if let Some(max_out) = self.max_amount_out {
            if max_out.is_zero() {
                return Err(DexError::ZeroMaxAmountOut);
            }
            if !self.order_type.is_taker_only() {
                return Err(DexError::InvalidMaxAmountOutForMaker);
            }
        }
        if is_tick_out_of_range(self.tick_index_in_to_out) {
            return Err(DexError::TickOutsideRange(self.tick_index_in_to_out));
        }
        if let Some(price) = &self.limit_sell_price {
            if is_price_out_of_range(price)? {
                return Err(DexError::PriceOutsideRange(price.to_string()));
            }
            if self.tick_index_in_to_out != 0 {
                return Err(DexError::InvalidPriceAndTick);
            }
        }
        Ok(())
    }

    /// Good-til-time orders must expire strictly after `block_time`.
    pub fn validate_good_til_expiration(&self, block_time: i64) -> Result<()> {
        if !self.order_type.is_good_til() {
            return Ok(());
        }
        match self.expiration_time {
            Some(expiration) if expiration > block_time => Ok(()),
            Some(expiration) => Err(DexError::ExpirationTimeInPast {
                expiration,
                block_time,
            }),
            None => Err(DexError::GoodTilOrderWithoutExpiration),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgPlaceLimitOrderResponse {
    /// Tranche the remainder rested in, if any
    pub tranche_key: Option<String>,
    /// Total `token_in` taken from the creator
    pub coin_in: U256,
    /// Proceeds of the taker leg paid to the receiver
    pub taker_coin_out: U256,
    /// `token_in` consumed by the taker leg
    pub taker_coin_in: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgCancelLimitOrder {
    pub creator: String,
    pub tranche_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgCancelLimitOrderResponse {
    pub taker_coin_out: U256,
    pub maker_coin_out: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgWithdrawFilledLimitOrder {
    pub creator: String,
    pub tranche_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MsgWithdrawFilledLimitOrderResponse {
    pub taker_coin_out: U256,
    pub maker_coin_out: U256,
}

// ============================================================================
// Envelope
// ============================================================================

/// Any message the engine executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Deposit(MsgDeposit),
    Withdrawal(MsgWithdrawal),
    PlaceLimitOrder(MsgPlaceLimitOrder),
    CancelLimitOrder(MsgCancelLimitOrder),
    WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrder),
}

impl Msg {
    pub fn name(&self) -> &'static str {
        match self {
            Msg::Deposit(_) => "deposit",
            Msg::Withdrawal(_) => "withdrawal",
            Msg::PlaceLimitOrder(_) => "place_limit_order",
            Msg::CancelLimitOrder(_) => "cancel_limit_order",
            Msg::WithdrawFilledLimitOrder(_) => "withdraw_filled_limit_order",
        }
    }

    pub fn creator(&self) -> &str {
        match self {
            Msg::Deposit(m) => &m.creator,
            Msg::Withdrawal(m) => &m.creator,
            Msg::PlaceLimitOrder(m) => &m.creator,
            Msg::CancelLimitOrder(m) => &m.creator,
            Msg::WithdrawFilledLimitOrder(m) => &m.creator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgResponse {
    Deposit(MsgDepositResponse),
    Withdrawal(MsgWithdrawalResponse),
    PlaceLimitOrder(MsgPlaceLimitOrderResponse),
    CancelLimitOrder(MsgCancelLimitOrderResponse),
    WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrderResponse),
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_deposit_validation() {
        let msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(10), int(0), 0, 1);
        assert!(msg.validate().is_ok());

        let mut unbalanced = msg.clone();
        unbalanced.fees.push(2);
        assert_eq!(unbalanced.validate(), Err(DexError::UnbalancedTxArray));

        let mut duplicate = msg.clone();
        duplicate.amounts_a.push(int(1));
        duplicate.amounts_b.push(int(1));
        duplicate.tick_indexes_a_to_b.push(0);
        duplicate.fees.push(1);
        duplicate.options.push(DepositOptions::default());
        assert_eq!(
            duplicate.validate(),
            Err(DexError::DuplicatePoolDeposit { tick: 0, fee: 1 })
        );

        let zero = MsgDeposit::single("alice", "TokenA", "TokenB", int(0), int(0), 0, 1);
        assert_eq!(zero.validate(), Err(DexError::ZeroDeposit));

        let out_of_range = MsgDeposit::single("alice", "TokenA", "TokenB", int(1), int(0), 529_750, 1);
        assert_eq!(out_of_range.validate(), Err(DexError::TickOutsideRange(529_750)));
    }

    #[test]
    fn test_withdrawal_validation() {
        let msg = MsgWithdrawal::single("alice", "TokenA", "TokenB", int(0), 0, 1);
        assert_eq!(msg.validate(), Err(DexError::ZeroWithdraw));

        let mut empty = msg.clone();
        empty.shares_to_remove.clear();
        empty.tick_indexes_a_to_b.clear();
        empty.fees.clear();
        assert_eq!(empty.validate(), Err(DexError::ZeroWithdraw));
    }

    #[test]
    fn test_place_validation() {
        let gtc = MsgPlaceLimitOrder::new(
            "alice",
            "TokenA",
            "TokenB",
            0,
            int(10),
            LimitOrderType::GoodTilCancelled,
        );
        assert!(gtc.validate().is_ok());

        let gtt = MsgPlaceLimitOrder { order_type: LimitOrderType::GoodTilTime, ..gtc.clone() };
        assert_eq!(gtt.validate(), Err(DexError::GoodTilOrderWithoutExpiration));
        let gtt = gtt.with_expiration(100);
        assert!(gtt.validate().is_ok());
        assert!(matches!(
            gtt.validate_good_til_expiration(100),
            Err(DexError::ExpirationTimeInPast { .. })
        ));
        assert!(gtt.validate_good_til_expiration(99).is_ok());

        let wrong = gtc.clone().with_expiration(100);
        assert_eq!(wrong.validate(), Err(DexError::ExpirationOnWrongOrderType));

        let maker_max_out = gtc.clone().with_max_amount_out(int(5));
        assert_eq!(maker_max_out.validate(), Err(DexError::InvalidMaxAmountOutForMaker));

        let zero_max_out = MsgPlaceLimitOrder {
            order_type: LimitOrderType::FillOrKill,
            ..gtc.clone()
        }
        .with_max_amount_out(int(0));
        assert_eq!(zero_max_out.validate(), Err(DexError::ZeroMaxAmountOut));

        let both = MsgPlaceLimitOrder { tick_index_in_to_out: 5, ..gtc.clone() }
            .with_limit_sell_price(PrecDec::one());
        assert_eq!(both.validate(), Err(DexError::InvalidPriceAndTick));

        let zero = MsgPlaceLimitOrder { amount_in: U256::ZERO, ..gtc };
        assert_eq!(zero.validate(), Err(DexError::ZeroLimitOrder));
    }

    #[test]
    fn test_address_rules() {
        assert!(validate_address("neutron1abc").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("a/b").is_err());
    }
}
