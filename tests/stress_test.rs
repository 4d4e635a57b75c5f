//! Stress tests for the Tick Dex engine.
//!
//! These tests verify:
//! 1. Module balances always equal the reserves recorded in the store
//! 2. Determinism is preserved across runs
//! 3. Failed messages never leak partial state
//! 4. Expiration sweeps keep the book bounded
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//!
//! # Run specific test
//! cargo test --release --test stress_test stress_random_messages -- --nocapture
//! ```

mod common;

use std::time::Instant;

use alloy_primitives::U256;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tick_dex::engine::{
    DepositOptions, MsgCancelLimitOrder, MsgDeposit, MsgPlaceLimitOrder,
    MsgWithdrawFilledLimitOrder, MsgWithdrawal,
};
use tick_dex::types::pool_denom;
use tick_dex::{BankKeeper, DexEngine, LimitOrderType, Msg};

use common::{assert_conservation, funded_engine, int, total_supply_of, TOKENS};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Starting balance of each token per user
const STARTING_BALANCE: u64 = 1_000_000_000;

/// Messages per block in the random streams
const MESSAGES_PER_BLOCK: usize = 20;

/// Seconds between blocks
const BLOCK_INTERVAL: i64 = 6;

const FEES: [u64; 4] = [0, 1, 5, 20];

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn random_tokens(rng: &mut ChaCha8Rng) -> (&'static str, &'static str) {
    if rng.gen_bool(0.5) {
        (TOKENS[0], TOKENS[1])
    } else {
        (TOKENS[1], TOKENS[0])
    }
}

/// Generate one message against the current engine state.
///
/// Uses a seeded RNG for reproducibility. Cancels and withdrawals target
/// positions the creator actually holds so that most of them succeed.
fn random_message(rng: &mut ChaCha8Rng, engine: &DexEngine, block_time: i64) -> Msg {
    let user = *pick(rng, &USERS);
    let (token_a, token_b) = random_tokens(rng);

    match rng.gen_range(0..100u32) {
        0..=24 => {
            let amount_a = if rng.gen_bool(0.8) { rng.gen_range(1..50_000u64) } else { 0 };
            let amount_b = if amount_a == 0 || rng.gen_bool(0.5) { rng.gen_range(1..50_000u64) } else { 0 };
            let deposit = MsgDeposit::single(
                user,
                token_a,
                token_b,
                int(amount_a),
                int(amount_b),
                rng.gen_range(-30..=30),
                *pick(rng, &FEES),
            );
            let options = DepositOptions {
                disable_autoswap: rng.gen_bool(0.1),
                fail_tx_on_bel: rng.gen_bool(0.1),
                swap_on_deposit: false,
            };
            Msg::Deposit(deposit.with_options(options))
        }
        25..=34 => {
            let holdings: Vec<_> = engine
                .all_pool_metadata()
                .expect("pool metadata")
                .into_iter()
                .filter(|m| !engine.bank().balance(user, &pool_denom(m.id)).is_zero())
                .collect();
            if holdings.is_empty() {
                return Msg::Withdrawal(MsgWithdrawal::single(user, token_a, token_b, int(1), 0, 1));
            }
            let meta = pick(rng, &holdings).clone();
            let owned = engine.bank().balance(user, &pool_denom(meta.id));
            let shares = if rng.gen_bool(0.5) { owned } else { (owned / U256::from(2u64)).max(U256::from(1u64)) };
            Msg::Withdrawal(MsgWithdrawal::single(
                user,
                &meta.pair_id.token0,
                &meta.pair_id.token1,
                shares,
                meta.tick,
                meta.fee,
            ))
        }
        35..=79 => {
            let order_type = match rng.gen_range(0..10u32) {
                0..=3 => LimitOrderType::GoodTilCancelled,
                4..=5 => LimitOrderType::ImmediateOrCancel,
                6 => LimitOrderType::FillOrKill,
                7..=8 => LimitOrderType::GoodTilTime,
                _ => LimitOrderType::JustInTime,
            };
            let mut order = MsgPlaceLimitOrder::new(
                user,
                token_a,
                token_b,
                rng.gen_range(-40..=40),
                int(rng.gen_range(1..20_000u64)),
                order_type,
            );
            if order_type == LimitOrderType::GoodTilTime {
                order = order.with_expiration(block_time + rng.gen_range(1..60));
            }
            Msg::PlaceLimitOrder(order)
        }
        _ => {
            let positions = engine
                .limit_order_tranche_users_by_address(user)
                .expect("tranche users");
            let tranche_key = if positions.is_empty() {
                "missing".to_string()
            } else {
                pick(rng, &positions).tranche_key.clone()
            };
            if rng.gen_bool(0.5) {
                Msg::CancelLimitOrder(MsgCancelLimitOrder {
                    creator: user.to_string(),
                    tranche_key,
                })
            } else {
                Msg::WithdrawFilledLimitOrder(MsgWithdrawFilledLimitOrder {
                    creator: user.to_string(),
                    tranche_key,
                })
            }
        }
    }
}

struct RunSummary {
    state_root: [u8; 32],
    succeeded: u64,
    failed: u64,
    purged: u64,
}

/// Run `blocks` blocks of random messages, checking conservation after
/// every message.
fn run_random_blocks(seed: u64, blocks: u64) -> RunSummary {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine = funded_engine(&USERS, STARTING_BALANCE);
    let mut summary = RunSummary {
        state_root: [0u8; 32],
        succeeded: 0,
        failed: 0,
        purged: 0,
    };

    let mut block_time = 1_000;
    for height in 2..2 + blocks {
        block_time += BLOCK_INTERVAL;
        summary.purged += engine.begin_block(height, block_time).expect("begin block");
        assert_conservation(&engine);

        for _ in 0..MESSAGES_PER_BLOCK {
            let msg = random_message(&mut rng, &engine, block_time);
            let root_before = engine.store().state_root();
            match engine.execute(&msg) {
                Ok(_) => summary.succeeded += 1,
                Err(_) => {
                    assert_eq!(
                        engine.store().state_root(),
                        root_before,
                        "failed {} left writes behind",
                        msg.name()
                    );
                    summary.failed += 1;
                }
            }
            assert_conservation(&engine);
        }

        let receipt = engine.end_block();
        assert_eq!(receipt.height, height);
        assert_eq!(receipt.messages_processed, MESSAGES_PER_BLOCK as u64);
        summary.state_root = receipt.state_root;
    }

    for token in TOKENS {
        let total = total_supply_of(&engine, &USERS, token);
        assert_eq!(total, int(STARTING_BALANCE) * U256::from(USERS.len()), "{token} minted or burned");
    }
    summary
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Main stress test: random deposits, withdrawals, orders and cancels.
///
/// # Verification
/// - No panics during execution
/// - Module balances match store reserves after every message
/// - Failed messages leave the state root untouched
/// - User tokens are neither minted nor burned
#[test]
fn stress_random_messages() {
    println!("\n=== STRESS TEST: Random Message Stream ===\n");

    const BLOCKS: u64 = 100;
    let start = Instant::now();
    let summary = run_random_blocks(42, BLOCKS);
    let elapsed = start.elapsed();

    let total = summary.succeeded + summary.failed;
    println!("=== RESULTS ===");
    println!("  Blocks:            {:>12}", BLOCKS);
    println!("  Messages:          {:>12}", total);
    println!("  Succeeded:         {:>12}", summary.succeeded);
    println!("  Failed:            {:>12}", summary.failed);
    println!("  Orders purged:     {:>12}", summary.purged);
    println!("  Elapsed time:      {:>12.2?}", elapsed);
    println!("  State root:        {}", hex::encode(summary.state_root));

    assert!(summary.succeeded > 0, "Expected some messages to succeed");
    assert!(summary.purged > 0, "Expected some orders to expire");

    println!("\n=== STRESS TEST PASSED ===\n");
}

/// Verify determinism: same seed produces identical state root.
///
/// Every validator must arrive at the same store given the same messages.
#[test]
fn verify_determinism() {
    println!("\n=== DETERMINISM TEST ===\n");

    const SEED: u64 = 12345;
    const BLOCKS: u64 = 30;

    let root1 = run_random_blocks(SEED, BLOCKS).state_root;
    let root2 = run_random_blocks(SEED, BLOCKS).state_root;

    println!("  Run 1 state root: {}", hex::encode(root1));
    println!("  Run 2 state root: {}", hex::encode(root2));
    assert_eq!(root1, root2, "State roots must match for determinism");

    let root3 = run_random_blocks(SEED + 1, BLOCKS).state_root;
    println!("  Different seed:   {}", hex::encode(root3));
    assert_ne!(root1, root3, "Different seeds should produce different roots");

    println!("\n=== DETERMINISM VERIFIED ===\n");
}

/// Many short-lived orders: the expiration sweep has to keep up.
#[test]
fn stress_expiration_churn() {
    println!("\n=== EXPIRATION CHURN TEST ===\n");

    const BLOCKS: i64 = 50;
    const ORDERS_PER_BLOCK: usize = 20;

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut engine = funded_engine(&USERS, STARTING_BALANCE);
    let mut placed = 0u64;
    let mut purged = 0u64;

    for block in 0..BLOCKS {
        let block_time = 2_000 + block * BLOCK_INTERVAL;
        purged += engine.begin_block(block as u64 + 2, block_time).expect("begin block");

        for _ in 0..ORDERS_PER_BLOCK {
            let user = *pick(&mut rng, &USERS);
            // Far from any crossing price so every order rests
            let order = MsgPlaceLimitOrder::new(
                user,
                "TokenA",
                "TokenB",
                rng.gen_range(1_000..1_100),
                int(rng.gen_range(100..1_000u64)),
                LimitOrderType::GoodTilTime,
            )
            .with_expiration(block_time + BLOCK_INTERVAL * rng.gen_range(1..4));
            engine.place_limit_order(&order).expect("place");
            placed += 1;
        }
        assert_conservation(&engine);
    }

    // Let everything lapse
    purged += engine
        .begin_block(BLOCKS as u64 + 2, 2_000 + (BLOCKS + 10) * BLOCK_INTERVAL)
        .expect("final sweep");

    println!("  Orders placed:     {:>12}", placed);
    println!("  Orders purged:     {:>12}", purged);
    println!("  Expirations left:  {:>12}", engine.limit_order_expirations().unwrap().len());

    assert!(engine.limit_order_expirations().unwrap().is_empty());
    assert!(engine.store().tick_liquidity_count() == 0, "Expired tranches must leave the book");
    assert_conservation(&engine);

    println!("\n=== EXPIRATION CHURN PASSED ===\n");
}

/// Makers withdraw everything after a long random session.
#[test]
fn stress_full_unwind() {
    println!("\n=== FULL UNWIND TEST ===\n");

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut engine = funded_engine(&USERS, STARTING_BALANCE);
    for _ in 0..400 {
        let msg = random_message(&mut rng, &engine, 1_000);
        let _ = engine.execute(&msg);
    }

    // Cancel what can be cancelled, then withdraw every pool position
    for user in USERS {
        for position in engine.limit_order_tranche_users_by_address(user).unwrap() {
            let tranche_key = position.tranche_key.clone();
            let _ = engine.cancel_limit_order(&MsgCancelLimitOrder {
                creator: user.to_string(),
                tranche_key: tranche_key.clone(),
            });
            let _ = engine.withdraw_filled_limit_order(&MsgWithdrawFilledLimitOrder {
                creator: user.to_string(),
                tranche_key,
            });
        }
        for meta in engine.all_pool_metadata().unwrap() {
            let shares = engine.bank().balance(user, &pool_denom(meta.id));
            if shares.is_zero() {
                continue;
            }
            let msg = MsgWithdrawal::single(user, &meta.pair_id.token0, &meta.pair_id.token1, shares, meta.tick, meta.fee);
            engine.withdraw(&msg).expect("withdraw pool shares");
        }
    }
    assert_conservation(&engine);

    for meta in engine.all_pool_metadata().unwrap() {
        assert!(engine.bank().supply(&pool_denom(meta.id)).is_zero());
    }
    println!("  Pools created:     {:>12}", engine.all_pool_metadata().unwrap().len());
    println!("\n=== FULL UNWIND PASSED ===\n");
}
