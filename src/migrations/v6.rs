//! Backfill decimal mirrors on pool reserves and tranches.
//!
//! Records written before the mirrors existed decode with zero mirrors. A
//! zero mirror next to a non-zero integer is filled from the integer;
//! mirrors that are already set are left alone.

use alloy_primitives::U256;
use tracing::info;

use crate::error::Result;
use crate::math::PrecDec;
use crate::store::codec::{decode_tick_liquidity, decode_tranche, encode_tick_liquidity, encode_tranche};
use crate::store::keys::{INACTIVE_TRANCHE_PREFIX, TICK_LIQUIDITY_PREFIX};
use crate::store::KvStore;
use crate::types::{LimitOrderTranche, TickLiquidity};

pub fn migrate_store(store: &mut KvStore) -> Result<()> {
    migrate_tick_liquidity(store)?;
    migrate_inactive_tranches(store)
}

fn backfill(mirror: &mut PrecDec, amount: U256) -> Result<()> {
    if mirror.is_zero() && !amount.is_zero() {
        *mirror = PrecDec::from_int(amount)?;
    }
    Ok(())
}

fn backfill_tranche(tranche: &mut LimitOrderTranche) -> Result<()> {
    backfill(&mut tranche.dec_reserves_maker_denom, tranche.reserves_maker_denom)?;
    backfill(&mut tranche.dec_reserves_taker_denom, tranche.reserves_taker_denom)?;
    backfill(&mut tranche.dec_total_taker_denom, tranche.total_taker_denom)
}

fn migrate_tick_liquidity(store: &mut KvStore) -> Result<()> {
    info!("Migrating tick liquidity fields...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(TICK_LIQUIDITY_PREFIX) {
        let mut liquidity = decode_tick_liquidity(value)?;
        match &mut liquidity {
            TickLiquidity::PoolReserves(reserves) => {
                backfill(&mut reserves.dec_reserves_maker_denom, reserves.reserves_maker_denom)?;
            }
            TickLiquidity::LimitOrderTranche(tranche) => backfill_tranche(tranche)?,
        }
        let encoded = encode_tick_liquidity(&liquidity)?;
        if &encoded != value {
            updates.push((key.clone(), encoded));
        }
    }

    let count = updates.len();
    for (key, value) in updates {
        store.set(key, value);
    }

    info!(count, "Finished migrating tick liquidity fields");
    Ok(())
}

fn migrate_inactive_tranches(store: &mut KvStore) -> Result<()> {
    info!("Migrating inactive tranche fields...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(INACTIVE_TRANCHE_PREFIX) {
        let mut tranche = decode_tranche(value)?;
        backfill_tranche(&mut tranche)?;
        let encoded = encode_tranche(&tranche)?;
        if &encoded != value {
            updates.push((key.clone(), encoded));
        }
    }

    let count = updates.len();
    for (key, value) in updates {
        store.set(key, value);
    }

    info!(count, "Finished migrating inactive tranche fields");
    Ok(())
}
