//! Limit order cancellation.

use tracing::info;

use crate::bank::{coins, BankKeeper};
use crate::engine::msg::{validate_address, MsgCancelLimitOrder, MsgCancelLimitOrderResponse};
use crate::engine::DexEngine;
use crate::error::{DexError, Result};
use crate::orderbook::save_tranche;
use crate::types::LimitOrderTrancheKey;

impl<B: BankKeeper> DexEngine<B> {
    /// Refund the caller's unsold principal and pay out any unwithdrawn
    /// proceeds, then drop their position from the tranche.
    ///
    /// Only tranches still on the book can be cancelled. Expired and fully
    /// filled tranches are settled through withdraw-filled.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::ActiveLimitOrderNotFound)` - If the caller has no
    ///   position in the tranche or the tranche is no longer active
    /// * `Err(DexError::CancelEmptyLimitOrder)` - If there is nothing to pay
    pub(crate) fn handle_cancel_limit_order(
        &mut self,
        msg: &MsgCancelLimitOrder,
    ) -> Result<MsgCancelLimitOrderResponse> {
        validate_address(&msg.creator)?;
        self.assert_not_paused()?;

        let not_found = || DexError::ActiveLimitOrderNotFound(msg.tranche_key.clone());
        let user = self
            .store
            .get_tranche_user(&msg.creator, &msg.tranche_key)?
            .ok_or_else(not_found)?;
        let key = LimitOrderTrancheKey::new(
            user.trade_pair_id.clone(),
            user.tick_index_taker_to_maker,
            user.tranche_key.clone(),
        );
        let mut tranche = self.store.get_tranche(&key)?.ok_or_else(not_found)?;

        let (maker_out, taker_out) = tranche.cancel(&user)?;
        if taker_out.is_zero() && maker_out.is_zero() {
            return Err(DexError::CancelEmptyLimitOrder(msg.tranche_key.clone()));
        }

        self.store.remove_tranche_user(&user.address, &user.tranche_key);
        save_tranche(&mut self.store, &tranche)?;

        let payout = coins([
            (key.trade_pair_id.maker_denom.as_str(), maker_out),
            (key.trade_pair_id.taker_denom.as_str(), taker_out),
        ]);
        self.bank.send_from_module_to_account(&msg.creator, &payout)?;

        info!(
            creator = %msg.creator,
            tranche_key = %msg.tranche_key,
            maker_out = %maker_out,
            taker_out = %taker_out,
            "cancel limit order"
        );
        Ok(MsgCancelLimitOrderResponse {
            taker_coin_out: taker_out,
            maker_coin_out: maker_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use crate::bank::{BankKeeper, MemoryBank, MODULE_ACCOUNT};
    use crate::config::Params;
    use crate::engine::{DexEngine, MsgCancelLimitOrder, MsgPlaceLimitOrder, MsgWithdrawFilledLimitOrder};
    use crate::error::DexError;
    use crate::types::{LimitOrderTrancheKey, LimitOrderType, TradePairId};

    fn int(v: u64) -> U256 {
        U256::from(v)
    }

    fn setup() -> (DexEngine, String) {
        let mut bank = MemoryBank::new();
        bank.fund("alice", "TokenB", int(1_000)).unwrap();
        bank.fund("bob", "TokenA", int(1_000)).unwrap();
        let mut engine = DexEngine::new(Params::default(), bank).unwrap();
        let placed = engine
            .place_limit_order(&MsgPlaceLimitOrder::new(
                "alice",
                "TokenB",
                "TokenA",
                0,
                int(100),
                LimitOrderType::GoodTilCancelled,
            ))
            .unwrap();
        (engine, placed.tranche_key.unwrap())
    }

    fn cancel(who: &str, key: &str) -> MsgCancelLimitOrder {
        MsgCancelLimitOrder {
            creator: who.to_string(),
            tranche_key: key.to_string(),
        }
    }

    #[test]
    fn test_cancel_unfilled_refunds_principal() {
        let (mut engine, key) = setup();
        let resp = engine.cancel_limit_order(&cancel("alice", &key)).unwrap();
        assert_eq!(resp.maker_coin_out, int(100));
        assert_eq!(resp.taker_coin_out, U256::ZERO);
        assert_eq!(engine.bank().balance("alice", "TokenB"), int(1_000));
        assert_eq!(engine.limit_order_tranche_user("alice", &key).unwrap(), None);

        let tranche_key = LimitOrderTrancheKey::new(TradePairId::new("TokenB", "TokenA"), 0, key.clone());
        assert_eq!(engine.limit_order_tranche(&tranche_key).unwrap(), None);
        assert_eq!(engine.bank().balance(MODULE_ACCOUNT, "TokenB"), U256::ZERO);
    }

    #[test]
    fn test_cancel_partially_filled_pays_both_sides() {
        let (mut engine, key) = setup();
        engine
            .place_limit_order(&MsgPlaceLimitOrder::new(
                "bob",
                "TokenA",
                "TokenB",
                0,
                int(40),
                LimitOrderType::ImmediateOrCancel,
            ))
            .unwrap();

        let resp = engine.cancel_limit_order(&cancel("alice", &key)).unwrap();
        assert_eq!(resp.taker_coin_out, int(40));
        assert_eq!(resp.maker_coin_out, int(60));
        assert_eq!(engine.bank().balance("alice", "TokenA"), int(40));
        assert_eq!(engine.bank().balance("alice", "TokenB"), int(960));
    }

    #[test]
    fn test_cancel_after_partial_fill_leaves_other_maker_whole() {
        let (mut engine, key) = setup();
        engine.bank_mut().fund("carol", "TokenB", int(1_000)).unwrap();
        // Carol joins alice's tranche, then bob takes 40 of the 200
        engine
            .place_limit_order(&MsgPlaceLimitOrder::new(
                "carol",
                "TokenB",
                "TokenA",
                0,
                int(100),
                LimitOrderType::GoodTilCancelled,
            ))
            .unwrap();
        let take = |amount| {
            MsgPlaceLimitOrder::new("bob", "TokenA", "TokenB", 0, int(amount), LimitOrderType::ImmediateOrCancel)
        };
        engine.place_limit_order(&take(40)).unwrap();

        let resp = engine.cancel_limit_order(&cancel("alice", &key)).unwrap();
        assert_eq!((resp.taker_coin_out, resp.maker_coin_out), (int(20), int(80)));

        let tranche_key = LimitOrderTrancheKey::new(TradePairId::new("TokenB", "TokenA"), 0, key.clone());
        let tranche = engine.limit_order_tranche(&tranche_key).unwrap().unwrap();
        assert_eq!(tranche.total_maker_denom, int(100));
        assert_eq!(tranche.total_taker_denom, int(20));

        // Bob buys out the rest and carol is paid for all of her shares
        engine.place_limit_order(&take(500)).unwrap();
        let withdrawn = engine
            .withdraw_filled_limit_order(&MsgWithdrawFilledLimitOrder {
                creator: "carol".to_string(),
                tranche_key: key,
            })
            .unwrap();
        assert_eq!(withdrawn.taker_coin_out, int(100));
        assert_eq!(engine.bank().balance("carol", "TokenA"), int(100));
        assert_eq!(engine.bank().balance(MODULE_ACCOUNT, "TokenA"), U256::ZERO);
        assert_eq!(engine.bank().balance(MODULE_ACCOUNT, "TokenB"), U256::ZERO);
    }

    #[test]
    fn test_cancel_rejects_tranche_off_the_book() {
        let (mut engine, key) = setup();
        // Bob fills the whole tranche, which moves it to the inactive set
        engine
            .place_limit_order(&MsgPlaceLimitOrder::new(
                "bob",
                "TokenA",
                "TokenB",
                0,
                int(100),
                LimitOrderType::ImmediateOrCancel,
            ))
            .unwrap();
        assert_eq!(
            engine.cancel_limit_order(&cancel("alice", &key)),
            Err(DexError::ActiveLimitOrderNotFound(key.clone()))
        );
        // The position survives and is settled by withdraw-filled
        assert!(engine.limit_order_tranche_user("alice", &key).unwrap().is_some());
        let withdrawn = engine
            .withdraw_filled_limit_order(&MsgWithdrawFilledLimitOrder {
                creator: "alice".to_string(),
                tranche_key: key,
            })
            .unwrap();
        assert_eq!(withdrawn.taker_coin_out, int(100));
    }

    #[test]
    fn test_cancel_unknown_or_repeated() {
        let (mut engine, key) = setup();
        assert_eq!(
            engine.cancel_limit_order(&cancel("bob", &key)),
            Err(DexError::ActiveLimitOrderNotFound(key.clone()))
        );
        engine.cancel_limit_order(&cancel("alice", &key)).unwrap();
        assert_eq!(
            engine.cancel_limit_order(&cancel("alice", &key)),
            Err(DexError::ActiveLimitOrderNotFound(key))
        );
    }

    #[test]
    fn test_cancel_gtt_drops_expiration() {
        let mut bank = MemoryBank::new();
        bank.fund("alice", "TokenB", int(1_000)).unwrap();
        let mut engine = DexEngine::new(Params::default(), bank).unwrap();
        let placed = engine
            .place_limit_order(
                &MsgPlaceLimitOrder::new("alice", "TokenB", "TokenA", 0, int(100), LimitOrderType::GoodTilTime)
                    .with_expiration(50),
            )
            .unwrap();
        assert_eq!(engine.limit_order_expirations().unwrap().len(), 1);
        engine
            .cancel_limit_order(&cancel("alice", &placed.tranche_key.unwrap()))
            .unwrap();
        assert!(engine.limit_order_expirations().unwrap().is_empty());
    }
}
