//! Backfill `dec_shares_withdrawn` on tranche users.

use tracing::info;

use crate::error::Result;
use crate::math::PrecDec;
use crate::store::codec::{decode_tranche_user, encode_tranche_user};
use crate::store::keys::TRANCHE_USER_PREFIX;
use crate::store::KvStore;

pub fn migrate_store(store: &mut KvStore) -> Result<()> {
    info!("Migrating limit order tranche user fields...");

    let mut updates = Vec::new();
    for (key, value) in store.prefix_iter(TRANCHE_USER_PREFIX) {
        let mut user = decode_tranche_user(value)?;
        if !user.dec_shares_withdrawn.is_zero() || user.shares_withdrawn.is_zero() {
            continue;
        }
        user.dec_shares_withdrawn = PrecDec::from_int(user.shares_withdrawn)?;
        updates.push((key.clone(), encode_tranche_user(&user)?));
    }

    let count = updates.len();
    for (key, value) in updates {
        store.set(key, value);
    }

    info!(count, "Finished migrating limit order tranche user fields");
    Ok(())
}
