//! SSZ encoding of stored records.
//!
//! ## Framing
//!
//! Tick-liquidity, inactive-tranche and expiration values start with a
//! one-byte tag followed by the SSZ container:
//!
//! | Tag | Payload |
//! |---|---|
//! | 0 | [`PoolReservesRecord`] |
//! | 1 | [`TrancheRecord`] |
//! | 2 | [`LegacyTrancheRecord`] (pre-v3 layout) |
//! | 1 | [`ExpirationRecord`] (expiration prefix) |
//! | 2 | [`LegacyExpirationRecord`] (expiration prefix, pre-v3) |
//!
//! Tranche users, pool metadata and counters are untagged SSZ.
//!
//! ## Field Encodings
//!
//! - amounts: 32-byte little-endian `U256`
//! - decimals: sign flag plus 64-byte little-endian magnitude
//! - ticks and times: `i64` reinterpreted as `u64`
//! - strings: `List<u8, N>`

use alloy_primitives::U256;
use ssz_rs::prelude::*;

use crate::error::CodecError;
use crate::math::PrecDec;
use crate::types::{
    LimitOrderExpiration, LimitOrderTranche, LimitOrderTrancheKey, LimitOrderTrancheUser,
    LimitOrderType, PairId, PoolMetadata, PoolReserves, PoolReservesKey, TickLiquidity,
    TradePairId,
};

pub const TAG_POOL_RESERVES: u8 = 0;
pub const TAG_TRANCHE: u8 = 1;
pub const TAG_LEGACY_TRANCHE: u8 = 2;
pub const TAG_EXPIRATION: u8 = 1;
pub const TAG_LEGACY_EXPIRATION: u8 = 2;

/// Unix seconds of the zero timestamp that pre-v3 records used for
/// just-in-time expirations (0001-01-01T00:00:00Z).
pub const LEGACY_ZERO_TIME_UNIX: i64 = -62_135_596_800;

const MAX_DENOM_LEN: usize = 128;
const MAX_TRANCHE_KEY_LEN: usize = 64;
const MAX_ADDRESS_LEN: usize = 128;
const MAX_TRANCHE_REF_LEN: usize = 512;

type Denom = List<u8, MAX_DENOM_LEN>;
type TrancheKeyBytes = List<u8, MAX_TRANCHE_KEY_LEN>;
type Address = List<u8, MAX_ADDRESS_LEN>;
type TrancheRef = List<u8, MAX_TRANCHE_REF_LEN>;

// ============================================================================
// SSZ records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct DecRecord {
    pub negative: bool,
    pub magnitude_lo: [u8; 32],
    pub magnitude_hi: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PoolReservesRecord {
    pub maker_denom: Denom,
    pub taker_denom: Denom,
    pub tick: u64,
    pub fee: u64,
    pub reserves_maker_denom: [u8; 32],
    pub dec_reserves_maker_denom: DecRecord,
    pub price_taker_to_maker: DecRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct TrancheRecord {
    pub maker_denom: Denom,
    pub taker_denom: Denom,
    pub tick: u64,
    pub tranche_key: TrancheKeyBytes,
    pub reserves_maker_denom: [u8; 32],
    pub reserves_taker_denom: [u8; 32],
    pub total_maker_denom: [u8; 32],
    pub total_taker_denom: [u8; 32],
    pub dec_reserves_maker_denom: DecRecord,
    pub dec_reserves_taker_denom: DecRecord,
    pub dec_total_taker_denom: DecRecord,
    pub has_expiration: bool,
    pub expiration_time: u64,
    pub order_type: u8,
    pub maker_price: DecRecord,
    pub price_taker_to_maker: DecRecord,
}

/// Tranche layout before order types were stored: the expiration was an
/// optional timestamp and the zero timestamp meant just-in-time.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct LegacyTrancheRecord {
    pub maker_denom: Denom,
    pub taker_denom: Denom,
    pub tick: u64,
    pub tranche_key: TrancheKeyBytes,
    pub reserves_maker_denom: [u8; 32],
    pub reserves_taker_denom: [u8; 32],
    pub total_maker_denom: [u8; 32],
    pub total_taker_denom: [u8; 32],
    pub price_taker_to_maker: DecRecord,
    pub has_expiration: bool,
    pub expiration_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct TrancheUserRecord {
    pub maker_denom: Denom,
    pub taker_denom: Denom,
    pub tick: u64,
    pub tranche_key: TrancheKeyBytes,
    pub address: Address,
    pub shares_owned: [u8; 32],
    pub shares_withdrawn: [u8; 32],
    pub dec_shares_withdrawn: DecRecord,
    pub shares_cancelled: [u8; 32],
    pub order_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct ExpirationRecord {
    pub expiration_time: u64,
    pub tranche_ref: TrancheRef,
}

/// Pre-v3 expiration: same fields, but just-in-time used the zero timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct LegacyExpirationRecord {
    pub expiration_time: u64,
    pub tranche_ref: TrancheRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PoolMetadataRecord {
    pub id: u64,
    pub tick: u64,
    pub fee: u64,
    pub token0: Denom,
    pub token1: Denom,
}

// ============================================================================
// Field helpers
// ============================================================================

fn to_list<const N: usize>(bytes: &[u8], field: &str) -> Result<List<u8, N>, CodecError> {
    if bytes.len() > N {
        return Err(CodecError::FieldTooLong(field.to_string()));
    }
    List::<u8, N>::try_from(bytes.to_vec())
        .map_err(|_| CodecError::FieldTooLong(field.to_string()))
}

fn list_to_string<const N: usize>(
    list: &List<u8, N>,
    field: &'static str,
) -> Result<String, CodecError> {
    String::from_utf8(list.iter().copied().collect()).map_err(|_| CodecError::InvalidUtf8(field))
}

fn amount_bytes(value: U256) -> [u8; 32] {
    value.to_le_bytes::<32>()
}

fn amount_from(bytes: &[u8; 32]) -> U256 {
    U256::from_le_bytes(*bytes)
}

fn dec_record(value: &PrecDec) -> DecRecord {
    let bytes = value.magnitude_le_bytes();
    let mut magnitude_lo = [0u8; 32];
    let mut magnitude_hi = [0u8; 32];
    magnitude_lo.copy_from_slice(&bytes[..32]);
    magnitude_hi.copy_from_slice(&bytes[32..]);
    DecRecord {
        negative: value.is_negative(),
        magnitude_lo,
        magnitude_hi,
    }
}

fn dec_from(record: &DecRecord) -> crate::error::Result<PrecDec> {
    let bytes = [record.magnitude_lo, record.magnitude_hi].concat();
    Ok(PrecDec::from_le_bytes(record.negative, &bytes)?)
}

fn order_type_from(value: u8) -> Result<LimitOrderType, CodecError> {
    LimitOrderType::from_u8(value).ok_or(CodecError::UnknownOrderType(value))
}

fn ssz_encode<T: SimpleSerialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    ssz_rs::serialize(value).map_err(|e| CodecError::Serialize(format!("{e:?}")))
}

fn ssz_decode<T: SimpleSerialize>(bytes: &[u8]) -> Result<T, CodecError> {
    ssz_rs::deserialize::<T>(bytes).map_err(|e| CodecError::Deserialize(format!("{e:?}")))
}

fn tagged<T: SimpleSerialize>(tag: u8, value: &T) -> crate::error::Result<Vec<u8>> {
    let mut out = vec![tag];
    out.extend(ssz_encode(value)?);
    Ok(out)
}

fn split_tag(bytes: &[u8]) -> Result<(u8, &[u8]), CodecError> {
    bytes
        .split_first()
        .map(|(tag, rest)| (*tag, rest))
        .ok_or_else(|| CodecError::Deserialize("empty value".to_string()))
}

// ============================================================================
// Pool reserves and tranches
// ============================================================================

fn pool_reserves_record(reserves: &PoolReserves) -> crate::error::Result<PoolReservesRecord> {
    let tp = &reserves.key.trade_pair_id;
    Ok(PoolReservesRecord {
        maker_denom: to_list(tp.maker_denom.as_bytes(), "maker_denom")?,
        taker_denom: to_list(tp.taker_denom.as_bytes(), "taker_denom")?,
        tick: reserves.key.tick_index_taker_to_maker as u64,
        fee: reserves.key.fee,
        reserves_maker_denom: amount_bytes(reserves.reserves_maker_denom),
        dec_reserves_maker_denom: dec_record(&reserves.dec_reserves_maker_denom),
        price_taker_to_maker: dec_record(&reserves.price_taker_to_maker),
    })
}

fn pool_reserves_from(record: &PoolReservesRecord) -> crate::error::Result<PoolReserves> {
    let trade_pair_id = TradePairId::new(
        list_to_string(&record.maker_denom, "maker_denom")?,
        list_to_string(&record.taker_denom, "taker_denom")?,
    );
    Ok(PoolReserves {
        key: PoolReservesKey::new(trade_pair_id, record.tick as i64, record.fee),
        reserves_maker_denom: amount_from(&record.reserves_maker_denom),
        dec_reserves_maker_denom: dec_from(&record.dec_reserves_maker_denom)?,
        price_taker_to_maker: dec_from(&record.price_taker_to_maker)?,
    })
}

fn tranche_record(tranche: &LimitOrderTranche) -> crate::error::Result<TrancheRecord> {
    let tp = &tranche.key.trade_pair_id;
    Ok(TrancheRecord {
        maker_denom: to_list(tp.maker_denom.as_bytes(), "maker_denom")?,
        taker_denom: to_list(tp.taker_denom.as_bytes(), "taker_denom")?,
        tick: tranche.key.tick_index_taker_to_maker as u64,
        tranche_key: to_list(tranche.key.tranche_key.as_bytes(), "tranche_key")?,
        reserves_maker_denom: amount_bytes(tranche.reserves_maker_denom),
        reserves_taker_denom: amount_bytes(tranche.reserves_taker_denom),
        total_maker_denom: amount_bytes(tranche.total_maker_denom),
        total_taker_denom: amount_bytes(tranche.total_taker_denom),
        dec_reserves_maker_denom: dec_record(&tranche.dec_reserves_maker_denom),
        dec_reserves_taker_denom: dec_record(&tranche.dec_reserves_taker_denom),
        dec_total_taker_denom: dec_record(&tranche.dec_total_taker_denom),
        has_expiration: tranche.expiration_time.is_some(),
        expiration_time: tranche.expiration_time.unwrap_or_default() as u64,
        order_type: tranche.order_type.to_u8(),
        maker_price: dec_record(&tranche.maker_price),
        price_taker_to_maker: dec_record(&tranche.price_taker_to_maker),
    })
}

fn tranche_from(record: &TrancheRecord) -> crate::error::Result<LimitOrderTranche> {
    let trade_pair_id = TradePairId::new(
        list_to_string(&record.maker_denom, "maker_denom")?,
        list_to_string(&record.taker_denom, "taker_denom")?,
    );
    Ok(LimitOrderTranche {
        key: LimitOrderTrancheKey::new(
            trade_pair_id,
            record.tick as i64,
            list_to_string(&record.tranche_key, "tranche_key")?,
        ),
        reserves_maker_denom: amount_from(&record.reserves_maker_denom),
        reserves_taker_denom: amount_from(&record.reserves_taker_denom),
        total_maker_denom: amount_from(&record.total_maker_denom),
        total_taker_denom: amount_from(&record.total_taker_denom),
        dec_reserves_maker_denom: dec_from(&record.dec_reserves_maker_denom)?,
        dec_reserves_taker_denom: dec_from(&record.dec_reserves_taker_denom)?,
        dec_total_taker_denom: dec_from(&record.dec_total_taker_denom)?,
        expiration_time: record.has_expiration.then_some(record.expiration_time as i64),
        order_type: order_type_from(record.order_type)?,
        maker_price: dec_from(&record.maker_price)?,
        price_taker_to_maker: dec_from(&record.price_taker_to_maker)?,
    })
}

/// Tagged tick-liquidity value.
pub fn encode_tick_liquidity(liquidity: &TickLiquidity) -> crate::error::Result<Vec<u8>> {
    match liquidity {
        TickLiquidity::PoolReserves(reserves) => {
            tagged(TAG_POOL_RESERVES, &pool_reserves_record(reserves)?)
        }
        TickLiquidity::LimitOrderTranche(tranche) => tagged(TAG_TRANCHE, &tranche_record(tranche)?),
    }
}

pub fn decode_tick_liquidity(bytes: &[u8]) -> crate::error::Result<TickLiquidity> {
    let (tag, payload) = split_tag(bytes)?;
    match tag {
        TAG_POOL_RESERVES => Ok(TickLiquidity::PoolReserves(pool_reserves_from(
            &ssz_decode(payload)?,
        )?)),
        TAG_TRANCHE => Ok(TickLiquidity::LimitOrderTranche(tranche_from(
            &ssz_decode(payload)?,
        )?)),
        TAG_LEGACY_TRANCHE => Err(CodecError::LegacyRecord.into()),
        other => Err(CodecError::UnknownLiquidityTag(other).into()),
    }
}

/// Tagged tranche value, as stored under the inactive prefix.
pub fn encode_tranche(tranche: &LimitOrderTranche) -> crate::error::Result<Vec<u8>> {
    tagged(TAG_TRANCHE, &tranche_record(tranche)?)
}

pub fn decode_tranche(bytes: &[u8]) -> crate::error::Result<LimitOrderTranche> {
    match decode_tick_liquidity(bytes)? {
        TickLiquidity::LimitOrderTranche(tranche) => Ok(tranche),
        TickLiquidity::PoolReserves(_) => Err(CodecError::UnknownLiquidityTag(TAG_POOL_RESERVES).into()),
    }
}

pub fn is_legacy_tranche(bytes: &[u8]) -> bool {
    bytes.first() == Some(&TAG_LEGACY_TRANCHE)
}

// ============================================================================
// Legacy tranches
// ============================================================================

/// Tranche as written before order types were stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTranche {
    pub key: LimitOrderTrancheKey,
    pub reserves_maker_denom: U256,
    pub reserves_taker_denom: U256,
    pub total_maker_denom: U256,
    pub total_taker_denom: U256,
    pub price_taker_to_maker: PrecDec,
    /// Unix seconds; [`LEGACY_ZERO_TIME_UNIX`] marks a just-in-time order
    pub expiration_time: Option<i64>,
}

pub fn encode_legacy_tranche(tranche: &LegacyTranche) -> crate::error::Result<Vec<u8>> {
    let tp = &tranche.key.trade_pair_id;
    let record = LegacyTrancheRecord {
        maker_denom: to_list(tp.maker_denom.as_bytes(), "maker_denom")?,
        taker_denom: to_list(tp.taker_denom.as_bytes(), "taker_denom")?,
        tick: tranche.key.tick_index_taker_to_maker as u64,
        tranche_key: to_list(tranche.key.tranche_key.as_bytes(), "tranche_key")?,
        reserves_maker_denom: amount_bytes(tranche.reserves_maker_denom),
        reserves_taker_denom: amount_bytes(tranche.reserves_taker_denom),
        total_maker_denom: amount_bytes(tranche.total_maker_denom),
        total_taker_denom: amount_bytes(tranche.total_taker_denom),
        price_taker_to_maker: dec_record(&tranche.price_taker_to_maker),
        has_expiration: tranche.expiration_time.is_some(),
        expiration_time: tranche.expiration_time.unwrap_or_default() as u64,
    };
    tagged(TAG_LEGACY_TRANCHE, &record)
}

pub fn decode_legacy_tranche(bytes: &[u8]) -> crate::error::Result<LegacyTranche> {
    let (tag, payload) = split_tag(bytes)?;
    if tag != TAG_LEGACY_TRANCHE {
        return Err(CodecError::UnknownLiquidityTag(tag).into());
    }
    let record: LegacyTrancheRecord = ssz_decode(payload)?;
    let trade_pair_id = TradePairId::new(
        list_to_string(&record.maker_denom, "maker_denom")?,
        list_to_string(&record.taker_denom, "taker_denom")?,
    );
    Ok(LegacyTranche {
        key: LimitOrderTrancheKey::new(
            trade_pair_id,
            record.tick as i64,
            list_to_string(&record.tranche_key, "tranche_key")?,
        ),
        reserves_maker_denom: amount_from(&record.reserves_maker_denom),
        reserves_taker_denom: amount_from(&record.reserves_taker_denom),
        total_maker_denom: amount_from(&record.total_maker_denom),
        total_taker_denom: amount_from(&record.total_taker_denom),
        price_taker_to_maker: dec_from(&record.price_taker_to_maker)?,
        expiration_time: record.has_expiration.then_some(record.expiration_time as i64),
    })
}

// ============================================================================
// Users, expirations, metadata, counters
// ============================================================================

pub fn encode_tranche_user(user: &LimitOrderTrancheUser) -> crate::error::Result<Vec<u8>> {
    let tp = &user.trade_pair_id;
    let record = TrancheUserRecord {
        maker_denom: to_list(tp.maker_denom.as_bytes(), "maker_denom")?,
        taker_denom: to_list(tp.taker_denom.as_bytes(), "taker_denom")?,
        tick: user.tick_index_taker_to_maker as u64,
        tranche_key: to_list(user.tranche_key.as_bytes(), "tranche_key")?,
        address: to_list(user.address.as_bytes(), "address")?,
        shares_owned: amount_bytes(user.shares_owned),
        shares_withdrawn: amount_bytes(user.shares_withdrawn),
        dec_shares_withdrawn: dec_record(&user.dec_shares_withdrawn),
        shares_cancelled: amount_bytes(user.shares_cancelled),
        order_type: user.order_type.to_u8(),
    };
    Ok(ssz_encode(&record)?)
}

pub fn decode_tranche_user(bytes: &[u8]) -> crate::error::Result<LimitOrderTrancheUser> {
    let record: TrancheUserRecord = ssz_decode(bytes)?;
    Ok(LimitOrderTrancheUser {
        trade_pair_id: TradePairId::new(
            list_to_string(&record.maker_denom, "maker_denom")?,
            list_to_string(&record.taker_denom, "taker_denom")?,
        ),
        tick_index_taker_to_maker: record.tick as i64,
        tranche_key: list_to_string(&record.tranche_key, "tranche_key")?,
        address: list_to_string(&record.address, "address")?,
        shares_owned: amount_from(&record.shares_owned),
        shares_withdrawn: amount_from(&record.shares_withdrawn),
        dec_shares_withdrawn: dec_from(&record.dec_shares_withdrawn)?,
        shares_cancelled: amount_from(&record.shares_cancelled),
        order_type: order_type_from(record.order_type)?,
    })
}

pub fn encode_expiration(expiration: &LimitOrderExpiration) -> crate::error::Result<Vec<u8>> {
    let record = ExpirationRecord {
        expiration_time: expiration.expiration_time as u64,
        tranche_ref: to_list(&expiration.tranche_ref, "tranche_ref")?,
    };
    tagged(TAG_EXPIRATION, &record)
}

pub fn decode_expiration(bytes: &[u8]) -> crate::error::Result<LimitOrderExpiration> {
    let (tag, payload) = split_tag(bytes)?;
    match tag {
        TAG_EXPIRATION => {
            let record: ExpirationRecord = ssz_decode(payload)?;
            Ok(LimitOrderExpiration {
                expiration_time: record.expiration_time as i64,
                tranche_ref: record.tranche_ref.iter().copied().collect(),
            })
        }
        TAG_LEGACY_EXPIRATION => Err(CodecError::LegacyRecord.into()),
        other => Err(CodecError::UnknownLiquidityTag(other).into()),
    }
}

/// Pre-v3 expiration, decoded with its raw legacy time.
pub fn encode_legacy_expiration(expiration: &LimitOrderExpiration) -> crate::error::Result<Vec<u8>> {
    let record = LegacyExpirationRecord {
        expiration_time: expiration.expiration_time as u64,
        tranche_ref: to_list(&expiration.tranche_ref, "tranche_ref")?,
    };
    tagged(TAG_LEGACY_EXPIRATION, &record)
}

pub fn decode_legacy_expiration(bytes: &[u8]) -> crate::error::Result<LimitOrderExpiration> {
    let (tag, payload) = split_tag(bytes)?;
    if tag != TAG_LEGACY_EXPIRATION {
        return Err(CodecError::UnknownLiquidityTag(tag).into());
    }
    let record: LegacyExpirationRecord = ssz_decode(payload)?;
    Ok(LimitOrderExpiration {
        expiration_time: record.expiration_time as i64,
        tranche_ref: record.tranche_ref.iter().copied().collect(),
    })
}

pub fn is_legacy_expiration(bytes: &[u8]) -> bool {
    bytes.first() == Some(&TAG_LEGACY_EXPIRATION)
}

pub fn encode_pool_metadata(metadata: &PoolMetadata) -> crate::error::Result<Vec<u8>> {
    let record = PoolMetadataRecord {
        id: metadata.id,
        tick: metadata.tick as u64,
        fee: metadata.fee,
        token0: to_list(metadata.pair_id.token0.as_bytes(), "token0")?,
        token1: to_list(metadata.pair_id.token1.as_bytes(), "token1")?,
    };
    Ok(ssz_encode(&record)?)
}

pub fn decode_pool_metadata(bytes: &[u8]) -> crate::error::Result<PoolMetadata> {
    let record: PoolMetadataRecord = ssz_decode(bytes)?;
    Ok(PoolMetadata {
        id: record.id,
        tick: record.tick as i64,
        fee: record.fee,
        pair_id: PairId {
            token0: list_to_string(&record.token0, "token0")?,
            token1: list_to_string(&record.token1, "token1")?,
        },
    })
}

pub fn encode_u64(value: u64) -> crate::error::Result<Vec<u8>> {
    Ok(ssz_encode(&value)?)
}

pub fn decode_u64(bytes: &[u8]) -> crate::error::Result<u64> {
    Ok(ssz_decode::<u64>(bytes)?)
}

// ============================================================================
// Unit Tests
// ============================================================================
