//! Tranche accounting fix.
//!
//! Some fill paths over-counted `total_taker_denom`, which inflates
//! `ratio_filled` for every maker still in the tranche. The total is rebuilt
//! from what its users have already withdrawn plus what is still held:
//!
//! ```text
//! total_taker = trunc(sum(shares_withdrawn) / price_taker_to_maker) + reserves_taker
//! ```
//!
//! Users whose tranche exists neither active nor inactive are deleted.
//! Tranches without users are left as they are.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use tracing::info;

use crate::error::Result;
use crate::math::{checked_add_amount, PrecDec};
use crate::store::keys::tranche_ref;
use crate::store::KvStore;
use crate::types::{LimitOrderTranche, LimitOrderTrancheKey, LimitOrderTrancheUser};

pub fn migrate_store(store: &mut KvStore) -> Result<()> {
    info!("Migrating limit order tranche totals...");

    // Users grouped by tranche, in tranche address order
    let mut groups: BTreeMap<Vec<u8>, (LimitOrderTrancheKey, Vec<LimitOrderTrancheUser>)> =
        BTreeMap::new();
    for user in store.all_tranche_users()? {
        let key = LimitOrderTrancheKey::new(
            user.trade_pair_id.clone(),
            user.tick_index_taker_to_maker,
            user.tranche_key.clone(),
        );
        groups
            .entry(tranche_ref(&key))
            .or_insert_with(|| (key, Vec::new()))
            .1
            .push(user);
    }

    let mut fixed = 0usize;
    let mut orphans = 0usize;
    for (key, users) in groups.into_values() {
        let (tranche, active) = match store.get_tranche(&key)? {
            Some(tranche) => (tranche, true),
            None => match store.get_inactive_tranche(&key)? {
                Some(tranche) => (tranche, false),
                None => {
                    for user in &users {
                        store.remove_tranche_user(&user.address, &user.tranche_key);
                    }
                    orphans += users.len();
                    continue;
                }
            },
        };

        let mut updated = tranche.clone();
        updated.set_total_taker(corrected_total_taker(&tranche, &users)?)?;
        if updated != tranche {
            if active {
                store.set_tranche(&updated)?;
            } else {
                store.set_inactive_tranche(&updated)?;
            }
            fixed += 1;
        }
    }

    info!(fixed, orphans, "Finished migrating limit order tranche totals");
    Ok(())
}

/// `trunc(sum(shares_withdrawn) / price) + reserves_taker`.
pub fn corrected_total_taker(tranche: &LimitOrderTranche, users: &[LimitOrderTrancheUser]) -> Result<U256> {
    let mut withdrawn = U256::ZERO;
    for user in users {
        withdrawn = checked_add_amount(withdrawn, user.shares_withdrawn)?;
    }
    let paid_out = PrecDec::from_int(withdrawn)?
        .quo(&tranche.price_taker_to_maker)?
        .truncate_int()?;
    Ok(checked_add_amount(paid_out, tranche.reserves_taker_denom)?)
}
