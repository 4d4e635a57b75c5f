//! Pool deposits.
//!
//! ## Flow
//!
//! For every `(tick, fee)` entry of a [`MsgDeposit`]:
//!
//! 1. Sort the pair and orient the amounts and tick to `token0 -> token1`
//! 2. Check the fee tier, then optionally swap against better opposing
//!    liquidity (`swap_on_deposit`)
//! 3. Skip (or fail on) deposits that would sit behind enemy lines
//! 4. Deposit into the pool and record the shares to mint
//!
//! Coins move only after every entry succeeded: swap legs first, then the
//! deposited amounts, then the minted shares.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use tracing::{debug, info};

use crate::bank::{coins, BankKeeper, Coin};
use crate::engine::msg::{FailedDeposit, MsgDeposit, MsgDepositResponse};
use crate::engine::DexEngine;
use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount};
use crate::types::price::calc_price;
use crate::types::{normalize_tick_index, PairId, TradePairId};

/// Amounts left to deposit after `swap_on_deposit`, plus the swap legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SwappedDeposit {
    amount0: U256,
    amount1: U256,
    /// `(token0, token1)` paid into the book
    swapped_in: (U256, U256),
    /// `(token0, token1)` received from the book
    swapped_out: (U256, U256),
}

/// Running totals of a deposit message.
#[derive(Debug, Default)]
struct DepositTotals {
    token0_in: U256,
    token1_in: U256,
    swap_in0: U256,
    swap_in1: U256,
    swap_out0: U256,
    swap_out1: U256,
    shares: BTreeMap<String, U256>,
}

impl<B: BankKeeper> DexEngine<B> {
    pub(crate) fn handle_deposit(&mut self, msg: &MsgDeposit) -> Result<MsgDepositResponse> {
        msg.validate()?;
        self.assert_not_paused()?;

        let pair_id = PairId::new(&msg.token_a, &msg.token_b)?;
        let a_is_token0 = msg.token_a == pair_id.token0;

        let mut response = MsgDepositResponse::default();
        let mut totals = DepositTotals::default();

        for i in 0..msg.len() {
            let (mut amount0, mut amount1) = if a_is_token0 {
                (msg.amounts_a[i], msg.amounts_b[i])
            } else {
                (msg.amounts_b[i], msg.amounts_a[i])
            };
            let tick = normalize_tick_index(&msg.token_a, &pair_id.token0, msg.tick_indexes_a_to_b[i]);
            let fee = msg.fees[i];
            let options = msg.options[i];
            let autoswap = !options.disable_autoswap;

            self.validate_fee(fee)?;

            if options.swap_on_deposit {
                if !autoswap {
                    return Err(DexError::SwapOnDepositWithoutAutoswap);
                }
                let swapped = self.swap_on_deposit(&pair_id, tick, fee, amount0, amount1)?;
                amount0 = swapped.amount0;
                amount1 = swapped.amount1;
                totals.swap_in0 = checked_add_amount(totals.swap_in0, swapped.swapped_in.0)?;
                totals.swap_in1 = checked_add_amount(totals.swap_in1, swapped.swapped_in.1)?;
                totals.swap_out0 = checked_add_amount(totals.swap_out0, swapped.swapped_out.0)?;
                totals.swap_out1 = checked_add_amount(totals.swap_out1, swapped.swapped_out.1)?;
            }

            if self.is_pool_behind_enemy_lines(&pair_id, tick, fee, amount0, amount1)? {
                let error = DexError::DepositBehindEnemyLines { tick, fee };
                if options.fail_tx_on_bel {
                    return Err(error);
                }
                debug!(pair = %pair_id, tick, fee, "deposit behind enemy lines skipped");
                response.failed_deposits.push(FailedDeposit {
                    deposit_idx: i,
                    error,
                });
                continue;
            }

            let mut pool = self.store.get_or_init_pool(&pair_id, tick, fee)?;
            let denom = pool.pool_denom();
            let existing_shares = self.bank.supply(&denom);

            let result = pool.deposit(amount0, amount1, existing_shares, autoswap)?;
            if result.in_amount0.is_zero() && result.in_amount1.is_zero() {
                return Err(DexError::ZeroTrueDeposit);
            }
            if result.shares.is_zero() {
                return Err(DexError::DepositShareUnderflow);
            }
            self.store.set_pool(&pool)?;

            totals.token0_in = checked_add_amount(totals.token0_in, result.in_amount0)?;
            totals.token1_in = checked_add_amount(totals.token1_in, result.in_amount1)?;
            let minted = totals.shares.entry(denom.clone()).or_default();
            *minted = checked_add_amount(*minted, result.shares)?;

            response.reserve0_deposited.push(result.in_amount0);
            response.reserve1_deposited.push(result.in_amount1);
            response.shares_issued.push(Coin::new(denom, result.shares));

            info!(
                creator = %msg.creator,
                pool_id = pool.id,
                tick,
                fee,
                amount0 = %result.in_amount0,
                amount1 = %result.in_amount1,
                shares = %result.shares,
                "deposit"
            );
        }

        self.settle_deposit(msg, &pair_id, &totals)?;
        Ok(response)
    }

    fn settle_deposit(&mut self, msg: &MsgDeposit, pair_id: &PairId, totals: &DepositTotals) -> Result<()> {
        let token0 = pair_id.token0.as_str();
        let token1 = pair_id.token1.as_str();

        let swap_in = coins([(token0, totals.swap_in0), (token1, totals.swap_in1)]);
        if !swap_in.is_empty() {
            self.bank.send_from_account_to_module(&msg.creator, &swap_in)?;
        }
        let swap_out = coins([(token0, totals.swap_out0), (token1, totals.swap_out1)]);
        if !swap_out.is_empty() {
            self.bank.send_from_module_to_account(&msg.creator, &swap_out)?;
        }

        let deposited = coins([(token0, totals.token0_in), (token1, totals.token1_in)]);
        if !deposited.is_empty() {
            self.bank.send_from_account_to_module(&msg.creator, &deposited)?;
        }

        let shares: Vec<Coin> = totals
            .shares
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
            .collect();
        if !shares.is_empty() {
            self.bank.mint_to_module(&shares)?;
            self.bank.send_from_module_to_account(&msg.receiver, &shares)?;
        }
        Ok(())
    }

    /// Trade the deposit against opposing liquidity priced better than the
    /// position the deposit would open.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::DoubleSidedSwapOnDeposit)` - If both tokens traded
    fn swap_on_deposit(
        &mut self,
        pair_id: &PairId,
        tick: i64,
        fee: u64,
        amount0: U256,
        amount1: U256,
    ) -> Result<SwappedDeposit> {
        let fee_ticks = fee as i64;
        let mut out = SwappedDeposit {
            amount0,
            amount1,
            ..SwappedDeposit::default()
        };

        if !amount0.is_zero() {
            // token0 buys resting token1 at least as good as the lower position
            let limit = calc_price(fee_ticks - tick)?;
            let trade_pair_id = TradePairId::new(&pair_id.token1, &pair_id.token0);
            let result = self.swap(&trade_pair_id, amount0, None, Some(&limit))?;
            out.amount0 = checked_sub_amount(out.amount0, result.amount_in)?;
            out.amount1 = checked_add_amount(out.amount1, result.amount_out)?;
            out.swapped_in.0 = result.amount_in;
            out.swapped_out.1 = result.amount_out;
        }

        if !amount1.is_zero() {
            let limit = calc_price(tick + fee_ticks)?;
            let trade_pair_id = TradePairId::new(&pair_id.token0, &pair_id.token1);
            let result = self.swap(&trade_pair_id, amount1, None, Some(&limit))?;
            out.amount1 = checked_sub_amount(out.amount1, result.amount_in)?;
            out.amount0 = checked_add_amount(out.amount0, result.amount_out)?;
            out.swapped_in.1 = result.amount_in;
            out.swapped_out.0 = result.amount_out;
        }

        let traded0 = !out.swapped_in.0.is_zero() || !out.swapped_out.1.is_zero();
        let traded1 = !out.swapped_in.1.is_zero() || !out.swapped_out.0.is_zero();
        if traded0 && traded1 {
            return Err(DexError::DoubleSidedSwapOnDeposit);
        }
        if traded0 || traded1 {
            debug!(
                pair = %pair_id,
                tick,
                fee,
                swapped_in0 = %out.swapped_in.0,
                swapped_in1 = %out.swapped_in.1,
                "swap on deposit"
            );
        }
        Ok(out)
    }

    /// A side of the pool would rest at a price the opposing book already
    /// beats.
    fn is_pool_behind_enemy_lines(
        &self,
        pair_id: &PairId,
        tick: i64,
        fee: u64,
        amount0: U256,
        amount1: U256,
    ) -> Result<bool> {
        let fee_ticks = fee as i64;
        if !amount0.is_zero() {
            let lower = pair_id.trade_pair_for_maker(&pair_id.token0)?;
            if self.is_behind_enemy_lines(&lower, fee_ticks - tick)? {
                return Ok(true);
            }
        }
        if !amount1.is_zero() {
            let upper = pair_id.trade_pair_for_maker(&pair_id.token1)?;
            if self.is_behind_enemy_lines(&upper, tick + fee_ticks)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Maker liquidity at `tick` on `trade_pair_id` would cross the best
    /// opposing tick.
    pub(crate) fn is_behind_enemy_lines(&self, trade_pair_id: &TradePairId, tick: i64) -> Result<bool> {
        match self.best_tick(&trade_pair_id.reversed())? {
            Some(opposite) => Ok(-tick > opposite),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MemoryBank;
    use crate::config::Params;
    use crate::engine::msg::DepositOptions;
    use crate::engine::MsgPlaceLimitOrder;
    use crate::types::{pool_denom, LimitOrderType};

    fn int(v: u64) -> U256 {
        U256::from(v)
    }

    fn funded() -> DexEngine {
        let mut bank = MemoryBank::new();
        for who in ["alice", "bob"] {
            bank.fund(who, "TokenA", int(10_000)).unwrap();
            bank.fund(who, "TokenB", int(10_000)).unwrap();
        }
        DexEngine::new(Params::default(), bank).unwrap()
    }

    #[test]
    fn test_deposit_mints_shares_to_receiver() {
        let mut engine = funded();
        let mut msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(50), 0, 1);
        msg.receiver = "bob".to_string();
        let resp = engine.deposit(&msg).unwrap();

        assert_eq!(resp.reserve0_deposited, vec![int(100)]);
        assert_eq!(resp.reserve1_deposited, vec![int(50)]);
        assert_eq!(resp.shares_issued, vec![Coin::new(pool_denom(0), int(150))]);
        assert_eq!(engine.bank().balance("bob", &pool_denom(0)), int(150));
        assert_eq!(engine.bank().balance("alice", "TokenA"), int(9_900));
    }

    #[test]
    fn test_deposit_orients_reversed_tokens() {
        let mut engine = funded();
        // TokenB -> TokenA at tick 3 is the TokenA -> TokenB pool at tick -3
        let msg = MsgDeposit::single("alice", "TokenB", "TokenA", int(7), int(11), 3, 1);
        let resp = engine.deposit(&msg).unwrap();
        assert_eq!(resp.reserve0_deposited, vec![int(11)]);
        assert_eq!(resp.reserve1_deposited, vec![int(7)]);

        let pair = PairId::new("TokenA", "TokenB").unwrap();
        let pool = engine.store().get_pool(&pair, -3, 1).unwrap().unwrap();
        assert_eq!((pool.reserve0(), pool.reserve1()), (int(11), int(7)));
    }

    #[test]
    fn test_invalid_fee_tier() {
        let mut engine = funded();
        let msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(0), 0, 7);
        assert_eq!(engine.deposit(&msg), Err(DexError::InvalidFee(7)));
    }

    #[test]
    fn test_zero_true_deposit_without_autoswap() {
        let mut engine = funded();
        engine
            .deposit(&MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(0), 0, 1))
            .unwrap();
        let one_sided = MsgDeposit::single("bob", "TokenA", "TokenB", int(0), int(100), 0, 1)
            .with_options(DepositOptions {
                disable_autoswap: true,
                ..DepositOptions::default()
            });
        assert_eq!(engine.deposit(&one_sided), Err(DexError::ZeroTrueDeposit));
    }

    fn rest_token_b_at(engine: &mut DexEngine, tick_in_to_out: i64) {
        // Selling TokenB for TokenA: rests TokenB at maker tick -tick_in_to_out
        let order = MsgPlaceLimitOrder::new(
            "bob",
            "TokenB",
            "TokenA",
            tick_in_to_out,
            int(100),
            LimitOrderType::GoodTilCancelled,
        );
        engine.place_limit_order(&order).unwrap();
    }

    #[test]
    fn test_behind_enemy_lines_is_skipped_or_fails() {
        let mut engine = funded();
        // TokenB resting at maker tick -20 (TokenA buys it cheaply)
        rest_token_b_at(&mut engine, 20);

        // TokenA deposited at center 0 fee 1 rests at lower tick 1, crossing -20
        let msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(0), 0, 1);
        let resp = engine.deposit(&msg).unwrap();
        assert_eq!(resp.failed_deposits.len(), 1);
        assert_eq!(
            resp.failed_deposits[0].error,
            DexError::DepositBehindEnemyLines { tick: 0, fee: 1 }
        );
        assert!(resp.shares_issued.is_empty());

        let strict = msg.with_options(DepositOptions {
            fail_tx_on_bel: true,
            ..DepositOptions::default()
        });
        assert_eq!(
            engine.deposit(&strict),
            Err(DexError::DepositBehindEnemyLines { tick: 0, fee: 1 })
        );
    }

    #[test]
    fn test_swap_on_deposit_clears_crossing_liquidity() {
        let mut engine = funded();
        rest_token_b_at(&mut engine, 20);

        let msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(1_000), int(0), 0, 1)
            .with_options(DepositOptions {
                swap_on_deposit: true,
                ..DepositOptions::default()
            });
        let resp = engine.deposit(&msg).unwrap();
        assert!(resp.failed_deposits.is_empty());
        // Bought the 100 TokenB, deposited the rest of TokenA plus the proceeds
        assert_eq!(resp.reserve1_deposited, vec![int(100)]);
        assert!(resp.reserve0_deposited[0] < int(1_000));
        let tp = TradePairId::new("TokenB", "TokenA");
        assert_eq!(engine.best_tick(&tp).unwrap(), Some(1));
    }

    #[test]
    fn test_swap_on_deposit_requires_autoswap() {
        let mut engine = funded();
        let msg = MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(0), 0, 1)
            .with_options(DepositOptions {
                swap_on_deposit: true,
                disable_autoswap: true,
                ..DepositOptions::default()
            });
        assert_eq!(engine.deposit(&msg), Err(DexError::SwapOnDepositWithoutAutoswap));
    }

    #[test]
    fn test_second_depositor_gets_pro_rata_shares() {
        let mut engine = funded();
        engine
            .deposit(&MsgDeposit::single("alice", "TokenA", "TokenB", int(100), int(100), 0, 1))
            .unwrap();
        let resp = engine
            .deposit(&MsgDeposit::single("bob", "TokenA", "TokenB", int(50), int(50), 0, 1))
            .unwrap();
        assert_eq!(resp.shares_issued, vec![Coin::new(pool_denom(0), int(100))]);
        assert_eq!(engine.bank().supply(&pool_denom(0)), int(300));
    }
}
