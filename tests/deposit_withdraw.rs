//! Pool liquidity tests: deposits, autoswap, withdrawals and trading
//! against pools.

mod common;

use tick_dex::engine::{DepositOptions, MsgDeposit, MsgPlaceLimitOrder, MsgWithdrawal};
use tick_dex::types::price::MAX_TICK_EXP;
use tick_dex::types::{pool_denom, TradePairId};
use tick_dex::{BankKeeper, Coin, DexEngine, DexError, LimitOrderType, Params};

use common::{assert_conservation, funded_engine, int};

const START: u64 = 10_000;

fn engine() -> DexEngine {
    funded_engine(&["alice", "bob"], START)
}

fn deposit(who: &str, amount_a: u64, amount_b: u64, tick: i64, fee: u64) -> MsgDeposit {
    MsgDeposit::single(who, "TokenA", "TokenB", int(amount_a), int(amount_b), tick, fee)
}

fn withdrawal(who: &str, shares: u64, tick: i64, fee: u64) -> MsgWithdrawal {
    MsgWithdrawal::single(who, "TokenA", "TokenB", int(shares), tick, fee)
}

#[test]
fn test_deposit_then_withdraw_everything() {
    let mut engine = engine();
    let resp = engine.deposit(&deposit("alice", 100, 50, 0, 1)).unwrap();
    assert_eq!(resp.shares_issued, vec![Coin::new(pool_denom(0), int(150))]);
    assert_conservation(&engine);

    let out = engine.withdraw(&withdrawal("alice", 150, 0, 1)).unwrap();
    assert_eq!(out.reserve0_withdrawn, int(100));
    assert_eq!(out.reserve1_withdrawn, int(50));
    assert_eq!(engine.bank().balance("alice", "TokenA"), int(START));
    assert_eq!(engine.bank().balance("alice", "TokenB"), int(START));
    assert!(engine.bank().supply(&pool_denom(0)).is_zero());

    // The pool keeps its id after being emptied
    let pool = engine.pool("TokenA", "TokenB", 0, 1).unwrap().unwrap();
    assert_eq!(pool.id, 0);
    assert!(pool.reserve0().is_zero() && pool.reserve1().is_zero());
    assert_conservation(&engine);
}

#[test]
fn test_pool_ids_are_sequential() {
    let mut engine = engine();
    let mut msg = deposit("alice", 10, 10, 0, 1);
    msg.amounts_a.push(int(5));
    msg.amounts_b.push(int(0));
    msg.tick_indexes_a_to_b.push(-40);
    msg.fees.push(5);
    msg.options.push(DepositOptions::default());

    let resp = engine.deposit(&msg).unwrap();
    assert_eq!(resp.shares_issued.len(), 2);
    assert_eq!(resp.shares_issued[1].denom, pool_denom(1));

    let meta = engine.pool_metadata(1).unwrap().unwrap();
    assert_eq!((meta.tick, meta.fee), (-40, 5));
    assert_eq!(engine.all_pool_metadata().unwrap().len(), 2);
    assert_eq!(engine.pool_by_id(1).unwrap().unwrap().reserve0(), int(5));
}

#[test]
fn test_without_autoswap_only_the_pool_ratio_is_taken() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 100, 100, 0, 1)).unwrap();

    let msg = deposit("bob", 50, 30, 0, 1).with_options(DepositOptions {
        disable_autoswap: true,
        ..DepositOptions::default()
    });
    let resp = engine.deposit(&msg).unwrap();
    assert_eq!(resp.reserve0_deposited, vec![int(30)]);
    assert_eq!(resp.reserve1_deposited, vec![int(30)]);
    assert_eq!(resp.shares_issued[0].amount, int(60));
    assert_eq!(engine.bank().balance("bob", "TokenA"), int(START - 30));
    assert_conservation(&engine);
}

#[test]
fn test_autoswap_residual_is_discounted() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 100, 100, 0, 1)).unwrap();

    let resp = engine.deposit(&deposit("bob", 50, 0, 0, 1)).unwrap();
    assert_eq!(resp.reserve0_deposited, vec![int(50)]);
    let shares = resp.shares_issued[0].amount;
    assert!(shares > int(0) && shares < int(50));

    // Redeeming right away returns no more than was put in
    let out = engine
        .withdraw(&MsgWithdrawal::single("bob", "TokenA", "TokenB", shares, 0, 1))
        .unwrap();
    assert!(out.reserve0_withdrawn + out.reserve1_withdrawn <= int(50));
    assert_conservation(&engine);
}

#[test]
fn test_maker_earns_from_pool_trades() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 1_000, 0, 0, 1)).unwrap();

    // Bob buys TokenA from the pool with TokenB
    let order = MsgPlaceLimitOrder::new(
        "bob",
        "TokenB",
        "TokenA",
        10,
        int(100),
        LimitOrderType::ImmediateOrCancel,
    );
    let taken = engine.place_limit_order(&order).unwrap();
    assert!(taken.taker_coin_out > int(0));
    assert!(taken.taker_coin_out <= taken.taker_coin_in);

    let pool = engine.pool("TokenA", "TokenB", 0, 1).unwrap().unwrap();
    assert_eq!(pool.reserve0(), int(1_000) - taken.taker_coin_out);
    assert_eq!(pool.reserve1(), taken.taker_coin_in);

    let shares = engine.bank().balance("alice", &pool_denom(0));
    let out = engine
        .withdraw(&MsgWithdrawal::single("alice", "TokenA", "TokenB", shares, 0, 1))
        .unwrap();
    assert_eq!(out.reserve0_withdrawn, int(1_000) - taken.taker_coin_out);
    assert_eq!(out.reserve1_withdrawn, taken.taker_coin_in);
    assert_conservation(&engine);
}

#[test]
fn test_pool_reserves_sit_one_fee_from_center() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 100, 100, 10, 5)).unwrap();

    // TokenB rests at center + fee, TokenA at center - fee
    assert_eq!(engine.best_tick(&TradePairId::new("TokenB", "TokenA")).unwrap(), Some(15));
    assert_eq!(engine.best_tick(&TradePairId::new("TokenA", "TokenB")).unwrap(), Some(-5));
}

#[test]
fn test_withdraw_errors() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 100, 0, 0, 1)).unwrap();

    assert!(matches!(
        engine.withdraw(&withdrawal("alice", 101, 0, 1)),
        Err(DexError::InsufficientShares { .. })
    ));
    assert!(matches!(
        engine.withdraw(&withdrawal("bob", 1, 0, 1)),
        Err(DexError::InsufficientShares { .. })
    ));
    assert_eq!(engine.withdraw(&withdrawal("alice", 0, 0, 1)), Err(DexError::ZeroWithdraw));
}

#[test]
fn test_deposit_validation_errors() {
    let mut engine = engine();
    let tick = MAX_TICK_EXP as i64;
    assert_eq!(
        engine.deposit(&deposit("alice", 10, 10, tick, 1)),
        Err(DexError::TickOutsideRange(tick))
    );
    assert_eq!(
        engine.deposit(&deposit("alice", 0, 0, 0, 1)),
        Err(DexError::ZeroDeposit)
    );
    assert!(matches!(
        engine.deposit(&deposit("", 10, 10, 0, 1)),
        Err(DexError::InvalidAddress(_))
    ));
    assert!(matches!(
        engine.deposit(&MsgDeposit::single("alice", "TokenA", "TokenA", int(1), int(1), 0, 1)),
        Err(DexError::InvalidTradingPair(..))
    ));
    assert!(engine.all_pool_metadata().unwrap().is_empty());
}

#[test]
fn test_insufficient_funds_rolls_back() {
    let mut engine = engine();
    let root = engine.store().state_root();
    let result = engine.deposit(&deposit("alice", START + 1, 0, 0, 1));
    assert!(matches!(result, Err(DexError::InsufficientFunds { .. })));
    assert_eq!(engine.store().state_root(), root);
    assert!(engine.bank().supply(&pool_denom(0)).is_zero());
}

#[test]
fn test_simulate_deposit_matches_execution() {
    let mut engine = engine();
    let msg = deposit("alice", 70, 30, 3, 1);
    let root = engine.store().state_root();

    let simulated = engine.simulate_deposit(&msg).unwrap();
    assert_eq!(engine.store().state_root(), root);
    assert_eq!(engine.bank().balance("alice", "TokenA"), int(START));

    let executed = engine.deposit(&msg).unwrap();
    assert_eq!(simulated, executed);
}

#[test]
fn test_paused_dex_rejects_liquidity() {
    let mut engine = engine();
    engine.deposit(&deposit("alice", 10, 10, 0, 1)).unwrap();
    engine
        .set_params(Params {
            paused: true,
            ..Params::default()
        })
        .unwrap();
    assert_eq!(engine.deposit(&deposit("alice", 10, 10, 0, 1)), Err(DexError::DexPaused));
    assert_eq!(engine.withdraw(&withdrawal("alice", 10, 0, 1)), Err(DexError::DexPaused));
}
