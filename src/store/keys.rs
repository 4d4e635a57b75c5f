//! Store key layout.
//!
//! ## Prefixes
//!
//! ```text
//! TickLiquidity/value/{pair}/{maker}/{tick}/A_PoolDeposit/{fee}/
//! TickLiquidity/value/{pair}/{maker}/{tick}/B_LODeposit/{tranche_key}/
//! InactiveLimitOrderTranche/value/{pair}/{maker}/{tick}/B_LODeposit/{tranche_key}/
//! LimitOrderTrancheUser/value/{address}/{tranche_key}/
//! LimitOrderExpiration/value/{time}/{tranche_ref}/
//! Pool/id/{pair}/{center tick}/{fee}/
//! PoolMetadata/value/{id}/
//! Pool/count/
//! SchemaVersion/value/
//! ```
//!
//! Ticks and times are 9 bytes: a sign byte (`0` negative, `1` otherwise)
//! followed by the big-endian two's complement value, so byte order matches
//! numeric order. Fees and ids are 8 big-endian bytes. Pool deposits sort
//! before limit orders at the same tick because `A_` < `B_`.

use crate::types::{LimitOrderTrancheKey, PairId, PoolReservesKey, TradePairId};

pub const TICK_LIQUIDITY_PREFIX: &[u8] = b"TickLiquidity/value/";
pub const INACTIVE_TRANCHE_PREFIX: &[u8] = b"InactiveLimitOrderTranche/value/";
pub const TRANCHE_USER_PREFIX: &[u8] = b"LimitOrderTrancheUser/value/";
pub const EXPIRATION_PREFIX: &[u8] = b"LimitOrderExpiration/value/";
pub const POOL_ID_PREFIX: &[u8] = b"Pool/id/";
pub const POOL_METADATA_PREFIX: &[u8] = b"PoolMetadata/value/";
pub const POOL_COUNT_KEY: &[u8] = b"Pool/count/";
pub const SCHEMA_VERSION_KEY: &[u8] = b"SchemaVersion/value/";

pub const LIQUIDITY_TYPE_POOL_RESERVES: &str = "A_PoolDeposit";
pub const LIQUIDITY_TYPE_LIMIT_ORDER: &str = "B_LODeposit";

/// Sortable 9-byte form of a signed integer.
pub fn int64_to_sortable_bytes(value: i64) -> [u8; 9] {
    let mut out = [0u8; 9];
    out[0] = if value < 0 { 0 } else { 1 };
    out[1..].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

/// String whose lexicographic order matches integer order: a base-36
/// length digit followed by the base-36 digits.
pub fn uint64_to_sortable_string(value: u64) -> String {
    let digits = to_base36(value);
    let len = to_base36(digits.len() as u64);
    format!("{len}{digits}")
}

fn to_base36(mut value: u64) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Tranche key for the `sequence`-th tranche created at `height`.
pub fn new_tranche_key(height: u64, sequence: u64) -> String {
    format!(
        "{}{}",
        uint64_to_sortable_string(height),
        uint64_to_sortable_string(sequence)
    )
}

/// Canonical pair string of a trade pair, independent of direction.
pub fn pair_string(trade_pair_id: &TradePairId) -> String {
    let (a, b) = (&trade_pair_id.maker_denom, &trade_pair_id.taker_denom);
    if a <= b {
        format!("{a}<>{b}")
    } else {
        format!("{b}<>{a}")
    }
}

fn push_segment(key: &mut Vec<u8>, segment: &[u8]) {
    key.extend_from_slice(segment);
    key.push(b'/');
}

// ============================================================================
// Tick liquidity
// ============================================================================

/// `{pair}/{maker}/` under `prefix`.
fn trade_pair_prefix(prefix: &[u8], trade_pair_id: &TradePairId) -> Vec<u8> {
    let mut key = prefix.to_vec();
    push_segment(&mut key, pair_string(trade_pair_id).as_bytes());
    push_segment(&mut key, trade_pair_id.maker_denom.as_bytes());
    key
}

/// All tick liquidity a taker on `trade_pair_id` can consume, in tick order.
pub fn tick_liquidity_prefix(trade_pair_id: &TradePairId) -> Vec<u8> {
    trade_pair_prefix(TICK_LIQUIDITY_PREFIX, trade_pair_id)
}

/// Tick liquidity of one kind at a single tick.
pub fn tick_liquidity_tick_prefix(trade_pair_id: &TradePairId, tick: i64, liquidity_type: &str) -> Vec<u8> {
    let mut key = tick_liquidity_prefix(trade_pair_id);
    push_segment(&mut key, &int64_to_sortable_bytes(tick));
    push_segment(&mut key, liquidity_type.as_bytes());
    key
}

pub fn pool_reserves_key(key: &PoolReservesKey) -> Vec<u8> {
    let mut out = tick_liquidity_tick_prefix(
        &key.trade_pair_id,
        key.tick_index_taker_to_maker,
        LIQUIDITY_TYPE_POOL_RESERVES,
    );
    push_segment(&mut out, &key.fee.to_be_bytes());
    out
}

/// Tranche address without any store prefix; also the expiration `tranche_ref`.
pub fn tranche_ref(key: &LimitOrderTrancheKey) -> Vec<u8> {
    let mut out = trade_pair_prefix(&[], &key.trade_pair_id);
    push_segment(&mut out, &int64_to_sortable_bytes(key.tick_index_taker_to_maker));
    push_segment(&mut out, LIQUIDITY_TYPE_LIMIT_ORDER.as_bytes());
    push_segment(&mut out, key.tranche_key.as_bytes());
    out
}

pub fn tranche_key(key: &LimitOrderTrancheKey) -> Vec<u8> {
    [TICK_LIQUIDITY_PREFIX, &tranche_ref(key)].concat()
}

pub fn inactive_tranche_key(key: &LimitOrderTrancheKey) -> Vec<u8> {
    [INACTIVE_TRANCHE_PREFIX, &tranche_ref(key)].concat()
}

pub fn inactive_tranche_pair_prefix(trade_pair_id: &TradePairId) -> Vec<u8> {
    trade_pair_prefix(INACTIVE_TRANCHE_PREFIX, trade_pair_id)
}

// ============================================================================
// Users, expirations, pools
// ============================================================================

pub fn tranche_user_address_prefix(address: &str) -> Vec<u8> {
    let mut key = TRANCHE_USER_PREFIX.to_vec();
    push_segment(&mut key, address.as_bytes());
    key
}

pub fn tranche_user_key(address: &str, tranche_key: &str) -> Vec<u8> {
    let mut key = tranche_user_address_prefix(address);
    push_segment(&mut key, tranche_key.as_bytes());
    key
}

pub fn expiration_key(expiration_time: i64, tranche_ref: &[u8]) -> Vec<u8> {
    let mut key = EXPIRATION_PREFIX.to_vec();
    push_segment(&mut key, &int64_to_sortable_bytes(expiration_time));
    push_segment(&mut key, tranche_ref);
    key
}

pub fn pool_id_key(pair_id: &PairId, center_tick: i64, fee: u64) -> Vec<u8> {
    let mut key = POOL_ID_PREFIX.to_vec();
    push_segment(&mut key, pair_id.to_string().as_bytes());
    push_segment(&mut key, &int64_to_sortable_bytes(center_tick));
    push_segment(&mut key, &fee.to_be_bytes());
    key
}

pub fn pool_metadata_key(id: u64) -> Vec<u8> {
    let mut key = POOL_METADATA_PREFIX.to_vec();
    push_segment(&mut key, &id.to_be_bytes());
    key
}
