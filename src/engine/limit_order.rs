//! Limit order placement.
//!
//! ## Order Types
//!
//! | Type | Swaps | Rests remainder | Tranche |
//! |------|-------|-----------------|---------|
//! | `GOOD_TIL_CANCELLED` | up to limit | yes | shared unfilled, non-expiring tranche |
//! | `GOOD_TIL_TIME` | up to limit | yes, until expiration | always fresh |
//! | `JUST_IN_TIME` | up to limit | yes, for this block | always fresh |
//! | `FILL_OR_KILL` | all or nothing | no | none |
//! | `IMMEDIATE_OR_CANCEL` | up to limit | no | none |

use alloy_primitives::U256;
use tracing::info;

use crate::bank::{BankKeeper, Coin};
use crate::engine::matcher::validate_fair_output;
use crate::engine::msg::{MsgPlaceLimitOrder, MsgPlaceLimitOrderResponse};
use crate::engine::DexEngine;
use crate::error::Result;
use crate::math::{checked_add_amount, checked_sub_amount};
use crate::orderbook::save_tranche;
use crate::types::price::{calc_price, calc_tick_index_from_price};
use crate::types::{
    LimitOrderTranche, LimitOrderTrancheKey, LimitOrderTrancheUser, LimitOrderType, TradePairId,
};

impl<B: BankKeeper> DexEngine<B> {
    pub(crate) fn handle_place_limit_order(
        &mut self,
        msg: &MsgPlaceLimitOrder,
    ) -> Result<MsgPlaceLimitOrderResponse> {
        msg.validate()?;
        self.assert_not_paused()?;
        msg.validate_good_til_expiration(self.ctx.block_time)?;

        let tick_index_in_to_out = match &msg.limit_sell_price {
            // Round the sell price up to a tick that pays at least as much
            Some(price) => -calc_tick_index_from_price(price)?,
            None => msg.tick_index_in_to_out,
        };
        let taker_trade_pair_id = TradePairId::from_tokens(&msg.token_in, &msg.token_out);
        taker_trade_pair_id.pair_id()?;

        let response = self.execute_place_limit_order(&taker_trade_pair_id, tick_index_in_to_out, msg)?;

        if !response.taker_coin_out.is_zero() {
            self.bank.send_from_module_to_account(
                &msg.receiver,
                &[Coin::new(&msg.token_out, response.taker_coin_out)],
            )?;
        }
        if !response.coin_in.is_zero() {
            self.bank.send_from_account_to_module(
                &msg.creator,
                &[Coin::new(&msg.token_in, response.coin_in)],
            )?;
        }

        info!(
            creator = %msg.creator,
            order_type = %msg.order_type,
            tick = tick_index_in_to_out,
            amount_in = %msg.amount_in,
            taker_in = %response.taker_coin_in,
            taker_out = %response.taker_coin_out,
            rested = response.tranche_key.is_some(),
            "place limit order"
        );
        Ok(response)
    }

    fn execute_place_limit_order(
        &mut self,
        taker_trade_pair_id: &TradePairId,
        tick_index_in_to_out: i64,
        msg: &MsgPlaceLimitOrder,
    ) -> Result<MsgPlaceLimitOrderResponse> {
        let order_type = msg.order_type;
        let amount_in = msg.amount_in;
        let limit_price = calc_price(-tick_index_in_to_out)?;
        validate_fair_output(amount_in, &limit_price)?;

        let swap = if order_type.is_taker_only() {
            self.taker_limit_order_swap(
                taker_trade_pair_id,
                amount_in,
                msg.max_amount_out,
                &limit_price,
                order_type,
            )?
        } else {
            self.maker_limit_order_swap(taker_trade_pair_id, amount_in, &limit_price)?
        };

        let mut response = MsgPlaceLimitOrderResponse {
            tranche_key: None,
            coin_in: swap.amount_in,
            taker_coin_out: swap.amount_out,
            taker_coin_in: swap.amount_in,
        };

        let amount_left = checked_sub_amount(amount_in, swap.amount_in)?;
        if order_type.is_taker_only() || swap.order_filled || amount_left.is_zero() {
            if order_type.is_jit() {
                self.assert_can_place_jit()?;
                self.increment_jits_placed();
            }
            return Ok(response);
        }

        validate_fair_output(amount_left, &limit_price)?;

        let maker_trade_pair_id = taker_trade_pair_id.reversed();
        let maker_tick = -tick_index_in_to_out;
        let mut tranche = self.get_or_init_place_tranche(
            &maker_trade_pair_id,
            maker_tick,
            msg.expiration_time,
            order_type,
        )?;
        let mut user = self.get_or_init_tranche_user(&tranche, &msg.receiver, order_type)?;

        tranche.place_maker_limit_order(amount_left)?;
        user.shares_owned = checked_add_amount(user.shares_owned, amount_left)?;
        if tranche.has_expiration() {
            self.store.set_tranche_expiration(&tranche)?;
        }
        save_tranche(&mut self.store, &tranche)?;
        self.store.set_tranche_user(&user)?;

        if order_type.is_jit() {
            self.assert_can_place_jit()?;
            self.increment_jits_placed();
        }

        response.coin_in = checked_add_amount(response.coin_in, amount_left)?;
        response.tranche_key = Some(tranche.key.tranche_key);
        Ok(response)
    }

    /// Tranche a new order at `tick` rests in.
    ///
    /// Good-til-cancelled orders join the first unfilled, non-expiring
    /// tranche at the tick. Expiring orders always open a fresh tranche.
    fn get_or_init_place_tranche(
        &mut self,
        trade_pair_id: &TradePairId,
        tick: i64,
        expiration_time: Option<i64>,
        order_type: LimitOrderType,
    ) -> Result<LimitOrderTranche> {
        if order_type.is_gtc() {
            let existing = self
                .store
                .tranches_at_tick(trade_pair_id, tick)?
                .into_iter()
                .find(|t| t.is_place_tranche() && !t.has_expiration());
            if let Some(tranche) = existing {
                return Ok(tranche);
            }
        }
        let key = LimitOrderTrancheKey::new(trade_pair_id.clone(), tick, self.next_tranche_key());
        LimitOrderTranche::new(key, order_type, expiration_time)
    }

    fn get_or_init_tranche_user(
        &self,
        tranche: &LimitOrderTranche,
        address: &str,
        order_type: LimitOrderType,
    ) -> Result<LimitOrderTrancheUser> {
        match self.store.get_tranche_user(address, tranche.tranche_key())? {
            Some(user) => Ok(user),
            None => Ok(LimitOrderTrancheUser::new(
                tranche.key.trade_pair_id.clone(),
                tranche.tick_index(),
                tranche.tranche_key(),
                address,
                order_type,
            )),
        }
    }
}
