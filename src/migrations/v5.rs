//! Withdraw shared pools.
//!
//! Autoswap used to misprice deposits into pools that already had another
//! shareholder, so every pool with more than one holder is emptied: each
//! holder burns all shares and receives the pro-rata reserves. Single-holder
//! pools are untouched. Pools are visited by id and holders by address.

use tracing::info;

use crate::bank::{coins, BankKeeper, Coin, MODULE_ACCOUNT};
use crate::error::{DexError, Result};
use crate::store::KvStore;

pub fn migrate_store<B: BankKeeper>(store: &mut KvStore, bank: &mut B) -> Result<()> {
    info!("Migrating pools...");

    for metadata in store.all_pool_metadata()? {
        let mut pool = store
            .get_pool(&metadata.pair_id, metadata.tick, metadata.fee)?
            .ok_or_else(|| DexError::invariant(format!("pool {} has no reserves", metadata.id)))?;
        let denom = pool.pool_denom();
        let holders: Vec<(String, _)> = bank
            .holders(&denom)
            .into_iter()
            .filter(|(address, _)| address != MODULE_ACCOUNT)
            .collect();
        if holders.len() <= 1 {
            continue;
        }

        for (address, shares) in holders {
            let total = bank.supply(&denom);
            let (out0, out1) = pool.withdraw(shares, total)?;
            store.set_pool(&pool)?;

            let burned = [Coin::new(denom.as_str(), shares)];
            bank.send_from_account_to_module(&address, &burned)?;
            bank.burn_from_module(&burned)?;
            let payout = coins([
                (metadata.pair_id.token0.as_str(), out0),
                (metadata.pair_id.token1.as_str(), out1),
            ]);
            bank.send_from_module_to_account(&address, &payout)?;

            info!(user = %address, pool = metadata.id, shares = %shares, "Withdrew user from pool");
        }
    }

    info!("Finished migrating pools");
    Ok(())
}
