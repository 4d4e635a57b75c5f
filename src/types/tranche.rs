//! Limit order tranches.
//!
//! A tranche pools every maker order placed at the same `(trade pair, tick)`
//! between two fills. Makers own shares equal to the amount they deposited;
//! fills are shared pro rata through [`LimitOrderTranche::ratio_filled`].
//!
//! ## Accounting
//!
//! ```text
//! total_maker_denom    shares of the makers still in the tranche
//! reserves_maker_denom deposits not yet sold (or refunded)
//! total_taker_denom    taker tokens received for those shares
//! reserves_taker_denom taker tokens not yet withdrawn
//! ```
//!
//! The decimal mirrors (`dec_*`) always equal their integer counterparts
//! once a tranche has been written by this crate; older records may carry
//! zero mirrors until the backfill migration runs.

use alloy_primitives::U256;

use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount, PrecDec};
use crate::types::order::{LimitOrderType, JIT_EXPIRATION_TIME};
use crate::types::pair::TradePairId;
use crate::types::price::calc_price;
use crate::types::tranche_user::LimitOrderTrancheUser;

/// Address of a tranche: `(trade pair, tick, tranche key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LimitOrderTrancheKey {
    pub trade_pair_id: TradePairId,
    pub tick_index_taker_to_maker: i64,
    pub tranche_key: String,
}

impl LimitOrderTrancheKey {
    pub fn new(
        trade_pair_id: TradePairId,
        tick_index_taker_to_maker: i64,
        tranche_key: impl Into<String>,
    ) -> Self {
        Self {
            trade_pair_id,
            tick_index_taker_to_maker,
            tranche_key: tranche_key.into(),
        }
    }

    pub fn price_taker_to_maker(&self) -> Result<PrecDec> {
        calc_price(-self.tick_index_taker_to_maker)
    }

    pub fn maker_price(&self) -> Result<PrecDec> {
        calc_price(self.tick_index_taker_to_maker)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LimitOrderTranche {
    pub key: LimitOrderTrancheKey,
    pub reserves_maker_denom: U256,
    pub reserves_taker_denom: U256,
    pub total_maker_denom: U256,
    pub total_taker_denom: U256,
    pub dec_reserves_maker_denom: PrecDec,
    pub dec_reserves_taker_denom: PrecDec,
    pub dec_total_taker_denom: PrecDec,
    /// Unix seconds; `None` for orders that never expire
    pub expiration_time: Option<i64>,
    pub order_type: LimitOrderType,
    pub maker_price: PrecDec,
    pub price_taker_to_maker: PrecDec,
}

impl LimitOrderTranche {
    /// Empty tranche at `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Tranche address
    /// * `order_type` - Type of the order that opened the tranche
    /// * `expiration_time` - Good-til time; ignored unless the type expires
    pub fn new(
        key: LimitOrderTrancheKey,
        order_type: LimitOrderType,
        expiration_time: Option<i64>,
    ) -> Result<Self> {
        let price_taker_to_maker = key.price_taker_to_maker()?;
        let maker_price = key.maker_price()?;
        let expiration_time = match order_type {
            LimitOrderType::JustInTime => Some(JIT_EXPIRATION_TIME),
            LimitOrderType::GoodTilTime => {
                Some(expiration_time.ok_or(DexError::GoodTilOrderWithoutExpiration)?)
            }
            _ => None,
        };
        Ok(Self {
            key,
            expiration_time,
            order_type,
            maker_price,
            price_taker_to_maker,
            ..Self::default()
        })
    }

    pub fn tick_index(&self) -> i64 {
        self.key.tick_index_taker_to_maker
    }

    pub fn tranche_key(&self) -> &str {
        &self.key.tranche_key
    }

    /// Nothing has been filled yet.
    pub fn is_place_tranche(&self) -> bool {
        self.reserves_maker_denom == self.total_maker_denom
    }

    pub fn is_filled(&self) -> bool {
        self.reserves_maker_denom.is_zero()
    }

    pub fn is_jit(&self) -> bool {
        self.order_type.is_jit()
    }

    pub fn has_expiration(&self) -> bool {
        self.expiration_time.is_some()
    }

    /// Good-til-time tranche whose expiration is at or before `block_time`.
    pub fn is_expired(&self, block_time: i64) -> bool {
        match self.expiration_time {
            Some(time) => !self.is_jit() && time <= block_time,
            None => false,
        }
    }

    pub fn has_token_in(&self) -> bool {
        !self.reserves_maker_denom.is_zero()
    }

    pub fn has_token_out(&self) -> bool {
        !self.reserves_taker_denom.is_zero()
    }

    pub fn price(&self) -> &PrecDec {
        &self.price_taker_to_maker
    }

    // ------------------------------------------------------------------------
    // Fill accounting
    // ------------------------------------------------------------------------

    /// Share of deposits that has been sold, `price * total_taker / total_maker`.
    pub fn ratio_filled(&self) -> Result<PrecDec> {
        if self.total_maker_denom.is_zero() {
            return Ok(PrecDec::zero());
        }
        let amount_filled = self.price_taker_to_maker.mul_int(self.total_taker_denom)?;
        Ok(amount_filled.quo_int(self.total_maker_denom)?)
    }

    /// Deposits not yet sold, `total_maker - price * total_taker`.
    pub fn amount_unfilled(&self) -> Result<PrecDec> {
        let amount_filled = self.price_taker_to_maker.mul_int(self.total_taker_denom)?;
        Ok(PrecDec::from_int(self.total_maker_denom)?.sub(&amount_filled)?)
    }

    /// Remove the user's pro-rata share of unsold deposits from the tranche.
    ///
    /// # Returns
    ///
    /// The maker-denom amount to refund, net of anything the user already
    /// had refunded and capped at the tranche reserves.
    pub fn remove_token_in(&mut self, user: &LimitOrderTrancheUser) -> Result<U256> {
        if self.total_maker_denom.is_zero() {
            return Ok(U256::ZERO);
        }
        let unfilled = self.amount_unfilled()?;
        if unfilled.is_negative() {
            return Ok(U256::ZERO);
        }
        let max_to_remove = unfilled
            .mul_int(user.shares_owned)?
            .quo_int(self.total_maker_denom)?
            .truncate_int()?;
        let amount = max_to_remove
            .saturating_sub(user.shares_cancelled)
            .min(self.reserves_maker_denom);
        self.set_reserves_maker(checked_sub_amount(self.reserves_maker_denom, amount)?)?;
        Ok(amount)
    }

    /// Settle the user's newly filled shares.
    ///
    /// # Returns
    ///
    /// `(shares_delta, taker_out)`: the maker-denom shares newly counted as
    /// withdrawn and the taker-denom amount paid for them.
    pub fn withdraw(&mut self, user: &LimitOrderTrancheUser) -> Result<(U256, U256)> {
        let max_allowed = self
            .ratio_filled()?
            .mul_int(user.shares_owned)?
            .truncate_int()?
            .min(user.shares_owned);
        let delta = max_allowed.saturating_sub(user.shares_withdrawn);
        if delta.is_zero() {
            return Ok((U256::ZERO, U256::ZERO));
        }
        let taker_out = PrecDec::from_int(delta)?
            .quo(&self.price_taker_to_maker)?
            .truncate_int()?
            .min(self.reserves_taker_denom);
        self.set_reserves_taker(checked_sub_amount(self.reserves_taker_denom, taker_out)?)?;
        Ok((delta, taker_out))
    }

    /// Settle a maker's whole position and take it out of the tranche.
    ///
    /// Refunds the user's share of unsold deposits and pays their
    /// unwithdrawn proceeds. Their shares then leave `total_maker_denom` and
    /// the taker value of their sold shares, rounded up, leaves
    /// `total_taker_denom`, so the fill ratio seen by the remaining makers
    /// never rises. A user holding every share is paid whatever reserves are
    /// left.
    ///
    /// # Returns
    ///
    /// `(maker_out, taker_out)`
    pub fn cancel(&mut self, user: &LimitOrderTrancheUser) -> Result<(U256, U256)> {
        let mut maker_out = self.remove_token_in(user)?;
        let (delta, mut taker_out) = self.withdraw(user)?;

        if user.shares_owned >= self.total_maker_denom {
            maker_out = checked_add_amount(maker_out, self.reserves_maker_denom)?;
            taker_out = checked_add_amount(taker_out, self.reserves_taker_denom)?;
            self.set_reserves_maker(U256::ZERO)?;
            self.set_reserves_taker(U256::ZERO)?;
            self.total_maker_denom = U256::ZERO;
            self.set_total_taker(U256::ZERO)?;
            return Ok((maker_out, taker_out));
        }

        // The larger of the filled shares and the unrefunded principal, so
        // price * total_taker never exceeds what the tranche sold
        let filled = checked_add_amount(user.shares_withdrawn, delta)?;
        let sold = user
            .shares_owned
            .saturating_sub(user.shares_cancelled)
            .saturating_sub(maker_out);
        let filled_taker = self
            .taker_value_round_up(filled.max(sold))?
            .min(self.total_taker_denom);
        self.total_maker_denom = checked_sub_amount(self.total_maker_denom, user.shares_owned)?;
        self.set_total_taker(checked_sub_amount(self.total_taker_denom, filled_taker)?)?;
        Ok((maker_out, taker_out))
    }

    fn taker_value_round_up(&self, maker_amount: U256) -> Result<U256> {
        Ok(PrecDec::from_int(maker_amount)?
            .quo_round_up(&self.price_taker_to_maker)?
            .ceil()?
            .truncate_int()?)
    }

    /// Sell maker reserves for up to `max_in` taker tokens.
    ///
    /// # Returns
    ///
    /// `(amount_in, amount_out)` with `amount_out = min(reserves, price * max_in,
    /// max_out)` and `amount_in = trunc(amount_out / price)`.
    pub fn swap(&mut self, max_in: U256, max_out: Option<U256>) -> Result<(U256, U256)> {
        if max_in.is_zero() || self.reserves_maker_denom.is_zero() {
            return Ok((U256::ZERO, U256::ZERO));
        }
        let max_out_given_in = self.price_taker_to_maker.mul_int(max_in)?.truncate_int()?;
        let mut amount_out = self.reserves_maker_denom.min(max_out_given_in);
        if let Some(limit) = max_out {
            amount_out = amount_out.min(limit);
        }
        let amount_in = PrecDec::from_int(amount_out)?
            .quo(&self.price_taker_to_maker)?
            .truncate_int()?;

        self.set_reserves_taker(checked_add_amount(self.reserves_taker_denom, amount_in)?)?;
        self.set_total_taker(checked_add_amount(self.total_taker_denom, amount_in)?)?;
        self.set_reserves_maker(checked_sub_amount(self.reserves_maker_denom, amount_out)?)?;
        Ok((amount_in, amount_out))
    }

    /// Add a maker deposit.
    pub fn place_maker_limit_order(&mut self, amount_in: U256) -> Result<()> {
        self.set_reserves_maker(checked_add_amount(self.reserves_maker_denom, amount_in)?)?;
        self.total_maker_denom = checked_add_amount(self.total_maker_denom, amount_in)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Mirrors
    // ------------------------------------------------------------------------

    pub fn set_reserves_maker(&mut self, amount: U256) -> Result<()> {
        self.dec_reserves_maker_denom = PrecDec::from_int(amount)?;
        self.reserves_maker_denom = amount;
        Ok(())
    }

    pub fn set_reserves_taker(&mut self, amount: U256) -> Result<()> {
        self.dec_reserves_taker_denom = PrecDec::from_int(amount)?;
        self.reserves_taker_denom = amount;
        Ok(())
    }

    pub fn set_total_taker(&mut self, amount: U256) -> Result<()> {
        self.dec_total_taker_denom = PrecDec::from_int(amount)?;
        self.total_taker_denom = amount;
        Ok(())
    }
}

// ============================================================================
// Expiration record
// ============================================================================

/// Pointer from an expiration time to the tranche it retires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LimitOrderExpiration {
    /// Unix seconds; [`JIT_EXPIRATION_TIME`] for just-in-time tranches
    pub expiration_time: i64,
    /// Tranche address relative to the tick-liquidity prefix
    pub tranche_ref: Vec<u8>,
}

// ============================================================================
// Unit Tests
// ============================================================================
