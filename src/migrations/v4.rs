//! Recompute stored prices.
//!
//! Prices cached on pool reserves and tranches were written at a lower
//! decimal precision. They are recomputed from the tick.

use tracing::info;

use crate::error::Result;
use crate::store::codec::{decode_tick_liquidity, decode_tranche, encode_tick_liquidity, encode_tranche};
use crate::store::keys::{INACTIVE_TRANCHE_PREFIX, TICK_LIQUIDITY_PREFIX};
use crate::store::KvStore;
use crate::types::{LimitOrderTranche, TickLiquidity};

pub fn migrate_store(store: &mut KvStore) -> Result<()> {
    migrate_tick_liquidity_prices(store)?;
    migrate_inactive_tranche_prices(store)
}

fn reprice_tranche(tranche: &mut LimitOrderTranche) -> Result<()> {
    tranche.price_taker_to_maker = tranche.key.price_taker_to_maker()?;
    tranche.maker_price = tranche.key.maker_price()?;
    Ok(())
}

fn migrate_tick_liquidity_prices(store: &mut KvStore) -> Result<()> {
    info!("Migrating tick liquidity prices...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(TICK_LIQUIDITY_PREFIX) {
        let mut liquidity = decode_tick_liquidity(value)?;
        match &mut liquidity {
            TickLiquidity::PoolReserves(reserves) => {
                reserves.price_taker_to_maker = reserves.key.price_taker_to_maker()?;
            }
            TickLiquidity::LimitOrderTranche(tranche) => reprice_tranche(tranche)?,
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

    info!(count, "Finished migrating tick liquidity prices");
    Ok(())
}

fn migrate_inactive_tranche_prices(store: &mut KvStore) -> Result<()> {
    info!("Migrating inactive tranche prices...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(INACTIVE_TRANCHE_PREFIX) {
        let mut tranche = decode_tranche(value)?;
        reprice_tranche(&mut tranche)?;
        let encoded = encode_tranche(&tranche)?;
        if &encoded != value {
            updates.push((key.clone(), encoded));
        }
    }

    let count = updates.len();
    for (key, value) in updates {
        store.set(key, value);
    }

    info!(count, "Finished migrating inactive tranche prices");
    Ok(())
}
