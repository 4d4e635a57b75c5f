//! Tick Dex - Binary Entry Point
//!
//! Runs a short scripted session against an in-memory engine: one pool
//! deposit, a resting order, a crossing taker order and a withdrawal of the
//! filled proceeds. Pass a TOML parameter file as the first argument to
//! override the defaults; set `RUST_LOG` to change verbosity.

use alloy_primitives::U256;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tick_dex::engine::{MsgDeposit, MsgPlaceLimitOrder, MsgWithdrawFilledLimitOrder};
use tick_dex::types::TradePairId;
use tick_dex::{DexEngine, DexError, LimitOrderType, MemoryBank, Msg, Params};

fn main() -> Result<(), DexError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = match std::env::args().nth(1) {
        Some(path) => Params::load(path)?,
        None => Params::default(),
    };
    info!(fee_tiers = ?params.fee_tiers, paused = params.paused, "loaded params");

    println!("===========================================");
    println!("  Tick Dex - scripted session");
    println!("===========================================");
    println!();

    let mut bank = MemoryBank::new();
    bank.fund("alice", "TokenA", U256::from(10_000u64))?;
    bank.fund("alice", "TokenB", U256::from(10_000u64))?;
    bank.fund("bob", "TokenA", U256::from(10_000u64))?;
    let mut engine = DexEngine::new(params, bank)?;

    engine.begin_block(1, 1_700_000_000)?;

    let deposit = MsgDeposit::single("alice", "TokenA", "TokenB", U256::from(1_000u64), U256::from(1_000u64), 0, 1);
    engine.execute(&Msg::Deposit(deposit))?;
    println!("Deposited 1000 TokenA + 1000 TokenB at tick 0, fee 1");

    let rest = MsgPlaceLimitOrder::new(
        "alice",
        "TokenB",
        "TokenA",
        -2,
        U256::from(500u64),
        LimitOrderType::GoodTilCancelled,
    );
    let placed = engine.place_limit_order(&rest)?;
    let tranche_key = placed.tranche_key.clone().unwrap_or_default();
    println!("Resting order: 500 TokenB for TokenA, tranche {tranche_key}");

    let buy_b = TradePairId::new("TokenB", "TokenA");
    if let Some(price) = engine.best_price(&buy_b)? {
        println!("Best TokenB price for a TokenA taker: {price}");
    }

    let take = MsgPlaceLimitOrder::new(
        "bob",
        "TokenA",
        "TokenB",
        5,
        U256::from(1_500u64),
        LimitOrderType::ImmediateOrCancel,
    );
    let taken = engine.place_limit_order(&take)?;
    println!(
        "Taker paid {} TokenA for {} TokenB",
        taken.taker_coin_in, taken.taker_coin_out
    );

    match engine.withdraw_filled_limit_order(&MsgWithdrawFilledLimitOrder {
        creator: "alice".to_string(),
        tranche_key,
    }) {
        Ok(resp) => println!("Maker withdrew {} TokenA", resp.taker_coin_out),
        Err(err) => println!("Nothing to withdraw yet: {err}"),
    }

    let receipt = engine.end_block();
    println!();
    println!("Block {} receipt:", receipt.height);
    println!("  Messages: {} ({} failed)", receipt.messages_processed, receipt.messages_failed);
    println!("  Orders purged: {}", receipt.orders_purged);
    println!("  State root: {}", receipt.state_root_hex());

    match ssz_rs::serialize(&receipt) {
        Ok(bytes) => println!("  Receipt SSZ: {} bytes", bytes.len()),
        Err(e) => println!("  ERROR: Failed to serialize receipt: {e:?}"),
    }

    Ok(())
}
