//! Versioned store migrations.
//!
//! ## Schema Versions
//!
//! | Version | Rewrites |
//! |---|---|
//! | 3 | legacy tranche and expiration records to typed orders |
//! | 4 | stored prices recomputed from ticks |
//! | 5 | pools with several shareholders withdrawn in full |
//! | 6 | decimal mirrors on pool reserves and tranches |
//! | 7 | decimal mirror on tranche users |
//! | 8 | tranche `total_taker_denom` from its users; orphan users removed |
//!
//! ## Execution
//!
//! [`Migrator::run_migrations`] applies every migration newer than the stored
//! schema version, in order. Each runs inside its own store and bank frame
//! and bumps the version on success, so a failure leaves the store at the
//! last completed version. Migrations scan a prefix first and write after
//! the scan.

pub mod v3;
pub mod v4;
pub mod v5;
pub mod v6;
pub mod v7;
pub mod v8;

use tracing::{info, warn};

use crate::bank::BankKeeper;
use crate::error::Result;
use crate::store::KvStore;

/// Schema version written by this crate.
pub const SCHEMA_VERSION: u64 = 8;

type MigrationFn<B> = fn(&mut KvStore, &mut B) -> Result<()>;

/// Runs pending migrations against a store and bank.
#[derive(Debug, Clone, Copy, Default)]
pub struct Migrator;

impl Migrator {
    fn steps<B: BankKeeper>() -> [(u64, MigrationFn<B>); 6] {
        [
            (3, |store, _| v3::migrate_store(store)),
            (4, |store, _| v4::migrate_store(store)),
            (5, v5::migrate_store::<B>),
            (6, |store, _| v6::migrate_store(store)),
            (7, |store, _| v7::migrate_store(store)),
            (8, |store, _| v8::migrate_store(store)),
        ]
    }

    /// Apply every migration above the stored schema version.
    ///
    /// # Returns
    ///
    /// The schema version after migrating.
    pub fn run_migrations<B: BankKeeper>(store: &mut KvStore, bank: &mut B) -> Result<u64> {
        let mut version = store.schema_version()?;
        for (target, migrate) in Self::steps::<B>() {
            if target <= version {
                continue;
            }
            store.begin();
            bank.begin();
            let result = migrate(store, bank).and_then(|()| store.set_schema_version(target));
            match result {
                Ok(()) => {
                    store.commit();
                    bank.commit();
                    info!(from = version, to = target, "schema migrated");
                    version = target;
                }
                Err(err) => {
                    store.rollback();
                    bank.rollback();
                    warn!(version, target, error = %err, "migration failed");
                    return Err(err);
                }
            }
        }
        Ok(version)
    }
}
