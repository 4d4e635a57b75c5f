//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use alloy_primitives::U256;

use tick_dex::types::{LimitOrderTranche, TickLiquidity, TradePairId};
use tick_dex::{BankKeeper, DexEngine, MemoryBank, Params, MODULE_ACCOUNT};

pub const TOKENS: [&str; 2] = ["TokenA", "TokenB"];

pub fn int(v: u64) -> U256 {
    U256::from(v)
}

/// Engine with every user holding `amount` of both tokens, inside block 1.
pub fn funded_engine(users: &[&str], amount: u64) -> DexEngine {
    funded_engine_with(Params::default(), users, amount)
}

pub fn funded_engine_with(params: Params, users: &[&str], amount: u64) -> DexEngine {
    let mut bank = MemoryBank::new();
    for user in users {
        for token in TOKENS {
            bank.fund(user, token, int(amount)).expect("fund");
        }
    }
    let mut engine = DexEngine::new(params, bank).expect("engine");
    engine.begin_block(1, 1_000).expect("begin block");
    engine
}

/// Amount of each denom the module should be holding: pool reserves plus
/// maker and taker reserves of active and inactive tranches.
pub fn expected_module_balances(engine: &DexEngine) -> BTreeMap<String, U256> {
    let mut totals: BTreeMap<String, U256> = BTreeMap::new();

    for (maker, taker) in [(TOKENS[0], TOKENS[1]), (TOKENS[1], TOKENS[0])] {
        let trade_pair = TradePairId::new(maker, taker);
        for liquidity in engine.store().tick_liquidity(&trade_pair).expect("tick liquidity") {
            match liquidity {
                TickLiquidity::PoolReserves(reserves) => {
                    credit(&mut totals, maker, reserves.reserves_maker_denom)
                }
                TickLiquidity::LimitOrderTranche(tranche) => credit_tranche(&mut totals, &tranche),
            }
        }
    }
    for tranche in engine.store().all_inactive_tranches().expect("inactive tranches") {
        credit_tranche(&mut totals, &tranche);
    }
    totals
}

fn credit(totals: &mut BTreeMap<String, U256>, denom: &str, amount: U256) {
    *totals.entry(denom.to_string()).or_default() += amount;
}

fn credit_tranche(totals: &mut BTreeMap<String, U256>, tranche: &LimitOrderTranche) {
    credit(totals, &tranche.key.trade_pair_id.maker_denom, tranche.reserves_maker_denom);
    credit(totals, &tranche.key.trade_pair_id.taker_denom, tranche.reserves_taker_denom);
}

/// Panics unless the module account holds exactly what the store says it should.
pub fn assert_conservation(engine: &DexEngine) {
    let expected = expected_module_balances(engine);
    for token in TOKENS {
        let held = engine.bank().balance(MODULE_ACCOUNT, token);
        let owed = expected.get(token).copied().unwrap_or_default();
        assert_eq!(held, owed, "module balance of {token} drifted from store reserves");
    }
}

/// Sum of one token across the given users and the module account.
pub fn total_supply_of(engine: &DexEngine, users: &[&str], denom: &str) -> U256 {
    let mut total = engine.bank().balance(MODULE_ACCOUNT, denom);
    for user in users {
        total += engine.bank().balance(user, denom);
    }
    total
}
