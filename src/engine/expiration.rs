//! Begin-block retirement of expiring tranches.
//!
//! Expiration records are keyed by time, so just-in-time records (time 0)
//! always come first. Those are processed unconditionally, otherwise a JIT
//! order could trade in a later block. Good-til-time records are processed
//! until `good_til_purge_allowance` of them have been handled; the rest wait
//! for the next block.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::bank::BankKeeper;
use crate::engine::DexEngine;
use crate::error::Result;
use crate::types::JIT_EXPIRATION_TIME;

impl<B: BankKeeper> DexEngine<B> {
    /// Move every tranche due at or before `block_time` to the inactive set.
    ///
    /// # Returns
    ///
    /// Number of tranches retired.
    pub(crate) fn purge_expired_limit_orders(&mut self, block_time: i64) -> Result<u64> {
        let allowance = self.params.good_til_purge_allowance;
        let mut good_til_seen = 0u64;
        let mut archived: HashSet<Vec<u8>> = HashSet::new();
        let mut purged = 0u64;

        for expiration in self.store.expirations_until(block_time)? {
            if expiration.expiration_time != JIT_EXPIRATION_TIME {
                if good_til_seen >= allowance {
                    info!(allowance, "good-til purge allowance reached");
                    break;
                }
                good_til_seen += 1;
            }

            if !archived.contains(&expiration.tranche_ref) {
                if let Some(tranche) = self.store.get_tranche_by_ref(&expiration.tranche_ref)? {
                    self.store.set_inactive_tranche(&tranche)?;
                    self.store.remove_tranche(&tranche.key);
                    archived.insert(expiration.tranche_ref.clone());
                    purged += 1;
                    debug!(
                        pair = %tranche.key.trade_pair_id,
                        tick = tranche.tick_index(),
                        tranche_key = tranche.tranche_key(),
                        "tranche expired"
                    );
                }
            }
            self.store
                .remove_expiration(expiration.expiration_time, &expiration.tranche_ref);
        }

        if purged > 0 {
            info!(block_time, purged, "purged expired limit orders");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use crate::bank::MemoryBank;
    use crate::config::Params;
    use crate::engine::{DexEngine, MsgPlaceLimitOrder};
    use crate::types::{LimitOrderType, PairId};

    fn int(v: u64) -> U256 {
        U256::from(v)
    }

    fn engine(params: Params) -> DexEngine {
        let mut bank = MemoryBank::new();
        bank.fund("alice", "TokenB", int(10_000)).unwrap();
        DexEngine::new(params, bank).unwrap()
    }

    fn gtt(tick: i64, expiration: i64) -> MsgPlaceLimitOrder {
        MsgPlaceLimitOrder::new("alice", "TokenB", "TokenA", tick, int(100), LimitOrderType::GoodTilTime)
            .with_expiration(expiration)
    }

    fn jit(tick: i64) -> MsgPlaceLimitOrder {
        MsgPlaceLimitOrder::new("alice", "TokenB", "TokenA", tick, int(100), LimitOrderType::JustInTime)
    }

    #[test]
    fn test_purge_due_good_til_orders() {
        let mut engine = engine(Params::default());
        engine.begin_block(1, 10).unwrap();
        engine.place_limit_order(&gtt(0, 20)).unwrap();
        engine.place_limit_order(&gtt(1, 30)).unwrap();

        assert_eq!(engine.begin_block(2, 19).unwrap(), 0);
        assert_eq!(engine.begin_block(3, 20).unwrap(), 1);

        let pair = PairId::new("TokenA", "TokenB").unwrap();
        assert_eq!(engine.limit_order_tranches(&pair, "TokenA").unwrap().len(), 1);
        assert_eq!(engine.inactive_limit_order_tranches(&pair, "TokenA").unwrap().len(), 1);
        assert_eq!(engine.limit_order_expirations().unwrap().len(), 1);
        assert_eq!(engine.end_block().orders_purged, 1);
    }

    #[test]
    fn test_jit_orders_expire_next_block() {
        let mut engine = engine(Params::default());
        engine.begin_block(1, 10).unwrap();
        engine.place_limit_order(&jit(0)).unwrap();

        let pair = PairId::new("TokenA", "TokenB").unwrap();
        assert_eq!(engine.limit_order_tranches(&pair, "TokenA").unwrap().len(), 1);
        assert_eq!(engine.begin_block(2, 11).unwrap(), 1);
        assert!(engine.limit_order_tranches(&pair, "TokenA").unwrap().is_empty());
        assert!(engine.limit_order_expirations().unwrap().is_empty());
    }

    #[test]
    fn test_purge_allowance_limits_good_til_only() {
        let params = Params {
            good_til_purge_allowance: 1,
            ..Params::default()
        };
        let mut engine = engine(params);
        engine.begin_block(1, 10).unwrap();
        engine.place_limit_order(&jit(0)).unwrap();
        engine.place_limit_order(&jit(1)).unwrap();
        engine.place_limit_order(&gtt(2, 15)).unwrap();
        engine.place_limit_order(&gtt(3, 16)).unwrap();

        // Both JIT tranches plus one good-til tranche
        assert_eq!(engine.begin_block(2, 100).unwrap(), 3);
        assert_eq!(engine.limit_order_expirations().unwrap().len(), 1);
        assert_eq!(engine.begin_block(3, 100).unwrap(), 1);
        assert!(engine.limit_order_expirations().unwrap().is_empty());
    }

    #[test]
    fn test_good_til_cancelled_never_expires() {
        let mut engine = engine(Params::default());
        engine.begin_block(1, 10).unwrap();
        engine
            .place_limit_order(&MsgPlaceLimitOrder::new(
                "alice",
                "TokenB",
                "TokenA",
                0,
                int(100),
                LimitOrderType::GoodTilCancelled,
            ))
            .unwrap();
        assert_eq!(engine.begin_block(2, i64::MAX).unwrap(), 0);
    }
}
