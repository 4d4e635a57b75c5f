//! Benchmarks for the tick-dex engine.
//!
//! ## Groups
//!
//! | Group            | Measures                                         |
//! |------------------|--------------------------------------------------|
//! | math             | PrecDec arithmetic and the tick/price codec      |
//! | single_match     | One taker order against a deep tranche ladder    |
//! | order_operations | Placing, cancelling and depositing               |
//! | throughput       | Batches of random orders through `execute`       |
//! | determinism      | A fixed 1k message sequence from a fresh engine  |
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark
//! cargo bench -- single_match
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use alloy_primitives::U256;
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use tick_dex::engine::{MsgCancelLimitOrder, MsgDeposit, MsgPlaceLimitOrder};
use tick_dex::types::price::{calc_price, calc_tick_index_from_price};
use tick_dex::{DexEngine, LimitOrderType, MemoryBank, Msg, Params, PrecDec};

const USERS: [&str; 4] = ["u0", "u1", "u2", "u3"];

// ============================================================================
// HELPER FUNCTIONS - Deterministic book construction
// ============================================================================

fn funded_engine(amount: u64) -> DexEngine {
    let mut bank = MemoryBank::new();
    for user in USERS.iter().chain(["maker", "taker"].iter()) {
        for token in ["TokenA", "TokenB"] {
            bank.fund(user, token, U256::from(amount)).expect("fund");
        }
    }
    let mut engine = DexEngine::new(Params::default(), bank).expect("engine");
    engine.begin_block(1, 1_000).expect("begin block");
    engine
}

/// Rests `count` TokenB tranches on consecutive ticks, `amount` each.
///
/// # Arguments
/// * `engine` - Engine to populate
/// * `count` - Number of tranches (one per tick)
/// * `amount` - TokenB placed in each tranche
fn populate_tranches(engine: &mut DexEngine, count: i64, amount: u64) -> Vec<String> {
    (0..count)
        .map(|tick| {
            let order = MsgPlaceLimitOrder::new(
                "maker",
                "TokenB",
                "TokenA",
                tick,
                U256::from(amount),
                LimitOrderType::GoodTilCancelled,
            );
            engine
                .place_limit_order(&order)
                .expect("place maker order")
                .tranche_key
                .expect("resting tranche")
        })
        .collect()
}

fn taker_order(tick: i64, amount: u64) -> MsgPlaceLimitOrder {
    MsgPlaceLimitOrder::new(
        "taker",
        "TokenA",
        "TokenB",
        tick,
        U256::from(amount),
        LimitOrderType::ImmediateOrCancel,
    )
}

/// Deterministic mix of deposits and limit orders of every kind but
/// good-til-time around tick zero.
fn generate_message_batch(count: usize, seed: u64) -> Vec<Msg> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut msgs = Vec::with_capacity(count);

    for _ in 0..count {
        let user = USERS[rng.gen_range(0..USERS.len())];
        let (token_in, token_out) = if rng.gen_bool(0.5) {
            ("TokenA", "TokenB")
        } else {
            ("TokenB", "TokenA")
        };
        let tick: i64 = rng.gen_range(-50..=50);
        let amount = U256::from(rng.gen_range(1_000u64..=100_000));

        let msg = if rng.gen_bool(0.2) {
            let (a, b) = if token_in == "TokenA" {
                (amount, U256::ZERO)
            } else {
                (U256::ZERO, amount)
            };
            Msg::Deposit(MsgDeposit::single(user, "TokenA", "TokenB", a, b, tick, 1))
        } else {
            let order_type = match rng.gen_range(0..4) {
                0 => LimitOrderType::GoodTilCancelled,
                1 => LimitOrderType::ImmediateOrCancel,
                2 => LimitOrderType::FillOrKill,
                _ => LimitOrderType::JustInTime,
            };
            Msg::PlaceLimitOrder(MsgPlaceLimitOrder::new(
                user, token_in, token_out, tick, amount, order_type,
            ))
        };
        msgs.push(msg);
    }

    msgs
}

// ============================================================================
// BENCHMARK: Math
// ============================================================================

fn bench_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("math");

    let a: PrecDec = "12345.678901234567890123456789".parse().expect("decimal");
    let b: PrecDec = "1.0001".parse().expect("decimal");

    group.bench_function("prec_dec_mul", |bench| {
        bench.iter(|| black_box(&a).mul(black_box(&b)))
    });
    group.bench_function("prec_dec_quo", |bench| {
        bench.iter(|| black_box(&a).quo(black_box(&b)))
    });

    for tick in [0i64, 1_000, -250_000, 529_750] {
        group.bench_with_input(BenchmarkId::new("calc_price", tick), &tick, |bench, &tick| {
            bench.iter(|| calc_price(black_box(tick)))
        });
    }

    let price = calc_price(-123_456).expect("price");
    group.bench_function("calc_tick_index_from_price", |bench| {
        bench.iter(|| calc_tick_index_from_price(black_box(&price)))
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Single Match Latency
// ============================================================================

fn bench_single_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_match");
    group.measurement_time(Duration::from_secs(10));

    // A taker filled entirely by the best of 1,000 tranches
    group.bench_function("against_1k_tranches", |b| {
        let mut engine = funded_engine(1_000_000_000_000);
        populate_tranches(&mut engine, 1_000, 1_000_000);

        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.place_limit_order(&taker_order(0, 500_000))),
            BatchSize::LargeInput,
        );
    });

    // A taker large enough to sweep ten ticks
    group.bench_function("multi_tick_sweep", |b| {
        let mut engine = funded_engine(1_000_000_000_000);
        populate_tranches(&mut engine, 100, 100_000);

        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.place_limit_order(&taker_order(0, 1_000_000))),
            BatchSize::LargeInput,
        );
    });

    // Swapping through pool reserves instead of tranches
    group.bench_function("against_pool", |b| {
        let mut engine = funded_engine(1_000_000_000_000);
        let deposit = MsgDeposit::single(
            "maker",
            "TokenA",
            "TokenB",
            U256::ZERO,
            U256::from(1_000_000_000u64),
            0,
            1,
        );
        engine.deposit(&deposit).expect("deposit");

        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.place_limit_order(&taker_order(5, 500_000))),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Order Operations
// ============================================================================

fn bench_order_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_operations");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("place_gtc_empty_book", |b| {
        let engine = funded_engine(1_000_000_000);
        let order = MsgPlaceLimitOrder::new(
            "maker",
            "TokenB",
            "TokenA",
            10,
            U256::from(1_000u64),
            LimitOrderType::GoodTilCancelled,
        );
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.place_limit_order(&order)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("cancel_in_1k_book", |b| {
        let mut engine = funded_engine(1_000_000_000_000);
        let keys = populate_tranches(&mut engine, 1_000, 1_000);
        let cancel = MsgCancelLimitOrder {
            creator: "maker".to_string(),
            tranche_key: keys[500].clone(),
        };
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.cancel_limit_order(&cancel)),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("deposit_with_autoswap", |b| {
        let mut engine = funded_engine(1_000_000_000);
        engine
            .deposit(&MsgDeposit::single(
                "u0",
                "TokenA",
                "TokenB",
                U256::from(100_000u64),
                U256::from(100_000u64),
                0,
                1,
            ))
            .expect("seed pool");
        let deposit = MsgDeposit::single(
            "u1",
            "TokenA",
            "TokenB",
            U256::from(50_000u64),
            U256::ZERO,
            0,
            1,
        );
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.deposit(&deposit)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Throughput
// ============================================================================

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(20);

    for batch_size in [100usize, 1_000, 5_000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(
            BenchmarkId::new("messages", batch_size),
            &batch_size,
            |b, &size| {
                let msgs = generate_message_batch(size, 42);
                let engine = funded_engine(1_000_000_000_000);

                b.iter_batched(
                    || engine.clone(),
                    |mut engine| {
                        let mut ok = 0usize;
                        for msg in &msgs {
                            if engine.execute(msg).is_ok() {
                                ok += 1;
                            }
                        }
                        black_box(ok)
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Determinism Verification
// ============================================================================

fn bench_determinism(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinism");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(20);

    group.bench_function("1k_deterministic_sequence", |b| {
        let msgs = generate_message_batch(1_000, 12345);

        b.iter(|| {
            let mut engine = funded_engine(1_000_000_000_000);
            for msg in &msgs {
                let _ = engine.execute(msg);
            }
            let receipt = engine.end_block();
            black_box((engine.store().state_root(), receipt))
        });
    });

    group.finish();
}

// ============================================================================
// CRITERION ENTRY POINT
// ============================================================================

criterion_group!(
    benches,
    bench_math,
    bench_single_match,
    bench_order_operations,
    bench_throughput,
    bench_determinism
);

criterion_main!(benches);
