//! Typed limit orders.
//!
//! Before version 3 a tranche stored only an optional expiration timestamp:
//! no timestamp meant good-til-cancelled and the zero timestamp meant
//! just-in-time. Expirations were keyed by that timestamp as well.

use tracing::info;

use crate::error::Result;
use crate::store::codec::{
    decode_legacy_expiration, decode_legacy_tranche, encode_expiration, encode_tranche,
    is_legacy_expiration, is_legacy_tranche, LegacyTranche, LEGACY_ZERO_TIME_UNIX,
};
use crate::store::keys::{
    expiration_key, EXPIRATION_PREFIX, INACTIVE_TRANCHE_PREFIX, TICK_LIQUIDITY_PREFIX,
};
use crate::store::KvStore;
use crate::types::{
    LimitOrderExpiration, LimitOrderTranche, LimitOrderType, JIT_EXPIRATION_TIME,
};

pub fn migrate_store(store: &mut KvStore) -> Result<()> {
    migrate_tranches(store, TICK_LIQUIDITY_PREFIX, "limit order ticks")?;
    migrate_tranches(store, INACTIVE_TRANCHE_PREFIX, "inactive limit orders")?;
    migrate_expirations(store)
}

/// Current tranche for a legacy one.
pub fn upgrade_tranche(legacy: LegacyTranche) -> Result<LimitOrderTranche> {
    let (order_type, expiration_time) = match legacy.expiration_time {
        None => (LimitOrderType::GoodTilCancelled, None),
        Some(LEGACY_ZERO_TIME_UNIX) => (LimitOrderType::JustInTime, Some(JIT_EXPIRATION_TIME)),
        Some(time) => (LimitOrderType::GoodTilTime, Some(time)),
    };
    let maker_price = legacy.key.maker_price()?;
    Ok(LimitOrderTranche {
        key: legacy.key,
        reserves_maker_denom: legacy.reserves_maker_denom,
        reserves_taker_denom: legacy.reserves_taker_denom,
        total_maker_denom: legacy.total_maker_denom,
        total_taker_denom: legacy.total_taker_denom,
        expiration_time,
        order_type,
        maker_price,
        price_taker_to_maker: legacy.price_taker_to_maker,
        ..LimitOrderTranche::default()
    })
}

fn migrate_tranches(store: &mut KvStore, prefix: &[u8], what: &str) -> Result<()> {
    info!("Migrating {what}...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(prefix) {
        if !is_legacy_tranche(value) {
            continue;
        }
        let tranche = upgrade_tranche(decode_legacy_tranche(value)?)?;
        updates.push((key.clone(), encode_tranche(&tranche)?));
    }

    let count = updates.len();
    for (key, value) in updates {
        store.set(key, value);
    }

    info!(count, "Finished migrating {what}");
    Ok(())
}

fn migrate_expirations(store: &mut KvStore) -> Result<()> {
    info!("Migrating limit order expirations...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(EXPIRATION_PREFIX) {
        if !is_legacy_expiration(value) {
            continue;
        }
        let legacy = decode_legacy_expiration(value)?;
        let expiration_time = if legacy.expiration_time == LEGACY_ZERO_TIME_UNIX {
            JIT_EXPIRATION_TIME
        } else {
            legacy.expiration_time
        };
        updates.push((
            key.clone(),
            LimitOrderExpiration {
                expiration_time,
                tranche_ref: legacy.tranche_ref,
            },
        ));
    }

    let count = updates.len();
    for (old_key, expiration) in updates {
        store.delete(&old_key);
        store.set(
            expiration_key(expiration.expiration_time, &expiration.tranche_ref),
            encode_expiration(&expiration)?,
        );
    }

    info!(count, "Finished migrating limit order expirations");
    Ok(())
}
