//! Taker matching against tick liquidity.
//!
//! ## Matching Rules
//!
//! - Liquidity is consumed in ascending tick order (best price first)
//! - Pool reserves at a tick trade before tranches; tranches trade FIFO
//! - The walk stops when the remaining input cannot buy a single unit, when
//!   `max_amount_out` is reached, or when the next price is below the limit
//! - Every touched pool and tranche is written back immediately

use alloy_primitives::U256;
use tracing::debug;

use crate::bank::BankKeeper;
use crate::engine::DexEngine;
use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount, PrecDec};
use crate::orderbook::LiquidityIterator;
use crate::types::{LimitOrderType, TradePairId};

/// Outcome of a swap through the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapResult {
    /// Taker tokens consumed
    pub amount_in: U256,
    /// Maker tokens received
    pub amount_out: U256,
    /// Input exhausted or `max_amount_out` reached
    pub order_filled: bool,
}

impl<B: BankKeeper> DexEngine<B> {
    /// Swap up to `max_in` taker tokens on `trade_pair_id`.
    ///
    /// # Arguments
    ///
    /// * `trade_pair_id` - Side of the book to consume
    /// * `max_in` - Taker tokens available
    /// * `max_out` - Optional cap on maker tokens received
    /// * `limit_price` - Worst acceptable maker-per-taker price
    pub(crate) fn swap(
        &mut self,
        trade_pair_id: &TradePairId,
        max_in: U256,
        max_out: Option<U256>,
        limit_price: Option<&PrecDec>,
    ) -> Result<SwapResult> {
        let mut remaining_in = max_in;
        let mut remaining_out = max_out;
        let mut total_out = U256::ZERO;
        let mut order_filled = false;

        let mut iter = LiquidityIterator::new(trade_pair_id.clone(), self.ctx.block_time);
        while let Some(mut liquidity) = iter.next(&self.store)? {
            if let Some(limit) = limit_price {
                if liquidity.price() < limit {
                    break;
                }
            }

            let (amount_in, amount_out) = liquidity.swap(remaining_in, remaining_out)?;
            liquidity.save(&mut self.store)?;

            remaining_in = checked_sub_amount(remaining_in, amount_in)?;
            total_out = checked_add_amount(total_out, amount_out)?;

            if liquidity.price().mul_int(remaining_in)? < PrecDec::one() {
                order_filled = true;
                break;
            }
            if let Some(out_left) = remaining_out.as_mut() {
                *out_left = checked_sub_amount(*out_left, amount_out)?;
                if out_left.is_zero() {
                    order_filled = true;
                    break;
                }
            }
        }

        let result = SwapResult {
            amount_in: checked_sub_amount(max_in, remaining_in)?,
            amount_out: total_out,
            order_filled,
        };
        debug!(
            pair = %trade_pair_id,
            amount_in = %result.amount_in,
            amount_out = %result.amount_out,
            filled = result.order_filled,
            "swap"
        );
        Ok(result)
    }

    /// Swap leg of a fill-or-kill or immediate-or-cancel order.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::NoLiquidity)` - If nothing could be bought
    /// * `Err(DexError::FoKLimitOrderNotFilled)` - If a fill-or-kill order
    ///   misses both its input and its `max_amount_out` by more than one unit
    /// * `Err(DexError::TradeTooSmall)` - If the realized price undercuts the
    ///   limit by more than `max_true_taker_spread`
    pub(crate) fn taker_limit_order_swap(
        &mut self,
        trade_pair_id: &TradePairId,
        amount_in: U256,
        max_out: Option<U256>,
        limit_price: &PrecDec,
        order_type: LimitOrderType,
    ) -> Result<SwapResult> {
        let result = self.swap(trade_pair_id, amount_in, max_out, Some(limit_price))?;
        if result.amount_out.is_zero() {
            return Err(DexError::NoLiquidity);
        }

        if order_type.is_fok() {
            let in_filled = abs_diff(amount_in, result.amount_in) <= U256::from(1u64);
            let out_filled = max_out
                .map(|max| abs_diff(max, result.amount_out) <= U256::from(1u64))
                .unwrap_or(false);
            if !in_filled && !out_filled {
                return Err(DexError::FoKLimitOrderNotFilled);
            }
        }

        self.check_true_taker_price(&result, limit_price)?;
        Ok(result)
    }

    /// Swap leg of a resting order: consume crossing liquidity up to the limit.
    pub(crate) fn maker_limit_order_swap(
        &mut self,
        trade_pair_id: &TradePairId,
        amount_in: U256,
        limit_price: &PrecDec,
    ) -> Result<SwapResult> {
        self.swap(trade_pair_id, amount_in, None, Some(limit_price))
    }

    /// `amount_out / amount_in >= limit_price * (1 - max_true_taker_spread)`
    fn check_true_taker_price(&self, result: &SwapResult, limit_price: &PrecDec) -> Result<()> {
        if result.amount_in.is_zero() {
            return Ok(());
        }
        let true_price = PrecDec::from_int(result.amount_out)?.quo_int(result.amount_in)?;
        let tolerance = PrecDec::one().sub(&self.params.max_true_taker_spread)?;
        let floor = limit_price.mul(&tolerance)?;
        if true_price < floor {
            return Err(DexError::TradeTooSmall);
        }
        Ok(())
    }
}

fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// `amount_in * price` must buy at least one unit.
pub(crate) fn validate_fair_output(amount_in: U256, price: &PrecDec) -> Result<()> {
    if price.mul_int(amount_in)? < PrecDec::one() {
        return Err(DexError::TradeTooSmall);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MemoryBank;
    use crate::config::Params;
    use crate::types::price::calc_price;
    use crate::types::{LimitOrderTranche, LimitOrderTrancheKey, PairId};

    fn int(v: u64) -> U256 {
        U256::from(v)
    }

    fn engine_with_book() -> DexEngine {
        let mut engine = DexEngine::new(Params::default(), MemoryBank::new()).unwrap();
        // TokenB resting at ticks 0 and 10, plus a pool at center 5 fee 1
        for (tick, key) in [(0, "a"), (10, "b")] {
            let k = LimitOrderTrancheKey::new(TradePairId::new("TokenB", "TokenA"), tick, key);
            let mut t = LimitOrderTranche::new(k, LimitOrderType::GoodTilCancelled, None).unwrap();
            t.place_maker_limit_order(int(100)).unwrap();
            engine.store.set_tranche(&t).unwrap();
        }
        let pair = PairId::new("TokenA", "TokenB").unwrap();
        let mut pool = engine.store.get_or_init_pool(&pair, 5, 1).unwrap();
        pool.deposit(U256::ZERO, int(100), U256::ZERO, false).unwrap();
        engine.store.set_pool(&pool).unwrap();
        engine
    }

    #[test]
    fn test_swap_walks_ticks_in_price_order() {
        let mut engine = engine_with_book();
        let tp = TradePairId::new("TokenB", "TokenA");
        let result = engine.swap(&tp, int(150), None, None).unwrap();

        // All of tick 0 at price 1, then the pool at tick 6
        assert_eq!(result.amount_out, int(100) + int(49));
        assert!(result.order_filled);
        let book = engine.store.tick_liquidity(&tp).unwrap();
        assert!(book.iter().all(|t| t.tick_index() != 0));
    }

    #[test]
    fn test_swap_stops_at_limit_price() {
        let mut engine = engine_with_book();
        let tp = TradePairId::new("TokenB", "TokenA");
        let limit = calc_price(-1).unwrap();
        let result = engine.swap(&tp, int(1_000), None, Some(&limit)).unwrap();
        assert_eq!(result.amount_out, int(100));
        assert!(!result.order_filled);
    }

    #[test]
    fn test_swap_respects_max_out() {
        let mut engine = engine_with_book();
        let tp = TradePairId::new("TokenB", "TokenA");
        let result = engine.swap(&tp, int(1_000), Some(int(30)), None).unwrap();
        assert_eq!(result.amount_out, int(30));
        assert_eq!(result.amount_in, int(30));
        assert!(result.order_filled);
    }

    #[test]
    fn test_fill_or_kill_requires_full_fill() {
        let mut engine = engine_with_book();
        let tp = TradePairId::new("TokenB", "TokenA");
        let limit = calc_price(-1).unwrap();
        let err = engine
            .taker_limit_order_swap(&tp, int(500), None, &limit, LimitOrderType::FillOrKill)
            .unwrap_err();
        assert_eq!(err, DexError::FoKLimitOrderNotFilled);
    }

    #[test]
    fn test_taker_swap_without_liquidity() {
        let mut engine = DexEngine::new(Params::default(), MemoryBank::new()).unwrap();
        let tp = TradePairId::new("TokenB", "TokenA");
        let err = engine
            .taker_limit_order_swap(&tp, int(10), None, &PrecDec::one(), LimitOrderType::ImmediateOrCancel)
            .unwrap_err();
        assert_eq!(err, DexError::NoLiquidity);
    }

    #[test]
    fn test_fair_output() {
        assert!(validate_fair_output(int(1), &PrecDec::one()).is_ok());
        let half = PrecDec::new_with_prec(5, 1).unwrap();
        assert_eq!(validate_fair_output(int(1), &half), Err(DexError::TradeTooSmall));
    }
}
