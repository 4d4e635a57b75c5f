//! Settlement of filled limit orders.
//!
//! ## Cases
//!
//! - Active tranche: pay the newly filled share, keep the position open
//! - Inactive tranche (filled out or expired): pay the filled share plus the
//!   unsold principal and close the position
//! - Tranche gone: the position is closed with nothing to pay

use alloy_primitives::U256;
use tracing::info;

use crate::bank::{coins, BankKeeper};
use crate::engine::msg::{
    validate_address, MsgWithdrawFilledLimitOrder, MsgWithdrawFilledLimitOrderResponse,
};
use crate::engine::DexEngine;
use crate::error::{DexError, Result};
use crate::math::checked_add_amount;
use crate::orderbook::{save_inactive_tranche, save_tranche};
use crate::types::LimitOrderTrancheKey;

impl<B: BankKeeper> DexEngine<B> {
    pub(crate) fn handle_withdraw_filled_limit_order(
        &mut self,
        msg: &MsgWithdrawFilledLimitOrder,
    ) -> Result<MsgWithdrawFilledLimitOrderResponse> {
        validate_address(&msg.creator)?;
        self.assert_not_paused()?;

        let mut user = self
            .store
            .get_tranche_user(&msg.creator, &msg.tranche_key)?
            .ok_or_else(|| DexError::ValidLimitOrderTrancheNotFound(msg.tranche_key.clone()))?;
        let key = LimitOrderTrancheKey::new(
            user.trade_pair_id.clone(),
            user.tick_index_taker_to_maker,
            user.tranche_key.clone(),
        );

        let active = self.store.get_tranche(&key)?;
        let found = match active {
            Some(tranche) => Some((tranche, false)),
            None => self.store.get_inactive_tranche(&key)?.map(|t| (t, true)),
        };

        let Some((mut tranche, was_filled)) = found else {
            // Nothing left to claim against
            self.store.remove_tranche_user(&user.address, &user.tranche_key);
            info!(
                creator = %msg.creator,
                tranche_key = %msg.tranche_key,
                "withdraw filled: tranche gone, position closed"
            );
            return Ok(MsgWithdrawFilledLimitOrderResponse::default());
        };

        let (delta, taker_out) = tranche.withdraw(&user)?;
        let mut maker_out = U256::ZERO;
        if was_filled {
            maker_out = tranche.remove_token_in(&user)?;
            save_inactive_tranche(&mut self.store, &tranche)?;
            user.set_shares_withdrawn(user.shares_owned)?;
        } else {
            save_tranche(&mut self.store, &tranche)?;
            user.set_shares_withdrawn(checked_add_amount(user.shares_withdrawn, delta)?)?;
        }

        if user.is_empty() {
            self.store.remove_tranche_user(&user.address, &user.tranche_key);
        } else {
            self.store.set_tranche_user(&user)?;
        }

        if taker_out.is_zero() && maker_out.is_zero() {
            return Err(DexError::WithdrawEmptyLimitOrder);
        }

        let payout = coins([
            (key.trade_pair_id.taker_denom.as_str(), taker_out),
            (key.trade_pair_id.maker_denom.as_str(), maker_out),
        ]);
        self.bank.send_from_module_to_account(&msg.creator, &payout)?;

        info!(
            creator = %msg.creator,
            tranche_key = %msg.tranche_key,
            taker_out = %taker_out,
            maker_out = %maker_out,
            "withdraw filled limit order"
        );
        Ok(MsgWithdrawFilledLimitOrderResponse {
            taker_coin_out: taker_out,
            maker_coin_out: maker_out,
        })
    }
}
