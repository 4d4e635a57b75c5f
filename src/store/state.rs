//! Typed accessors over [`KvStore`].
//!
//! Every record type has a `get_*` returning `Ok(None)` when absent, a
//! `set_*` that encodes and writes, and a `remove_*`. Decoding failures are
//! surfaced as errors; nothing here panics on malformed bytes.

use crate::error::Result;
use crate::store::codec::{
    decode_expiration, decode_pool_metadata, decode_tick_liquidity, decode_tranche,
    decode_tranche_user, decode_u64, encode_expiration, encode_pool_metadata,
    encode_tick_liquidity, encode_tranche, encode_tranche_user, encode_u64,
};
use crate::store::keys::{
    expiration_key, inactive_tranche_key, inactive_tranche_pair_prefix, pool_id_key,
    pool_metadata_key, pool_reserves_key, tick_liquidity_prefix, tick_liquidity_tick_prefix,
    tranche_key, tranche_ref, tranche_user_address_prefix, tranche_user_key, EXPIRATION_PREFIX,
    INACTIVE_TRANCHE_PREFIX, LIQUIDITY_TYPE_LIMIT_ORDER, POOL_COUNT_KEY, POOL_METADATA_PREFIX,
    SCHEMA_VERSION_KEY, TICK_LIQUIDITY_PREFIX, TRANCHE_USER_PREFIX,
};
use crate::store::KvStore;
use crate::types::{
    LimitOrderExpiration, LimitOrderTranche, LimitOrderTrancheKey, LimitOrderTrancheUser,
    PairId, Pool, PoolMetadata, PoolReserves, PoolReservesKey, TickLiquidity, TradePairId,
};

// ============================================================================
// Tick liquidity
// ============================================================================

impl KvStore {
    pub fn get_pool_reserves(&self, key: &PoolReservesKey) -> Result<Option<PoolReserves>> {
        match self.get(&pool_reserves_key(key)) {
            Some(bytes) => match decode_tick_liquidity(bytes)? {
                TickLiquidity::PoolReserves(reserves) => Ok(Some(reserves)),
                TickLiquidity::LimitOrderTranche(_) => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn set_pool_reserves(&mut self, reserves: &PoolReserves) -> Result<()> {
        let value = encode_tick_liquidity(&TickLiquidity::PoolReserves(reserves.clone()))?;
        self.set(pool_reserves_key(&reserves.key), value);
        Ok(())
    }

    pub fn get_tranche(&self, key: &LimitOrderTrancheKey) -> Result<Option<LimitOrderTranche>> {
        self.get(&tranche_key(key)).map(|b| decode_tranche(b)).transpose()
    }

    pub fn set_tranche(&mut self, tranche: &LimitOrderTranche) -> Result<()> {
        let value = encode_tranche(tranche)?;
        self.set(tranche_key(&tranche.key), value);
        Ok(())
    }

    pub fn remove_tranche(&mut self, key: &LimitOrderTrancheKey) {
        self.delete(&tranche_key(key));
    }

    /// Ordered tick liquidity a taker on `trade_pair_id` can consume.
    pub fn tick_liquidity(&self, trade_pair_id: &TradePairId) -> Result<Vec<TickLiquidity>> {
        let prefix = tick_liquidity_prefix(trade_pair_id);
        self.prefix_iter(&prefix)
            .map(|(_, v)| decode_tick_liquidity(v))
            .collect()
    }

    /// Every tranche at `(trade_pair_id, tick)`, FIFO.
    pub fn tranches_at_tick(
        &self,
        trade_pair_id: &TradePairId,
        tick: i64,
    ) -> Result<Vec<LimitOrderTranche>> {
        let prefix = tick_liquidity_tick_prefix(trade_pair_id, tick, LIQUIDITY_TYPE_LIMIT_ORDER);
        self.prefix_iter(&prefix).map(|(_, v)| decode_tranche(v)).collect()
    }

    /// Number of tick-liquidity entries across every pair.
    pub fn tick_liquidity_count(&self) -> usize {
        self.prefix_iter(TICK_LIQUIDITY_PREFIX).count()
    }

    // ------------------------------------------------------------------------
    // Inactive tranches
    // ------------------------------------------------------------------------

    pub fn get_inactive_tranche(
        &self,
        key: &LimitOrderTrancheKey,
    ) -> Result<Option<LimitOrderTranche>> {
        self.get(&inactive_tranche_key(key))
            .map(|b| decode_tranche(b))
            .transpose()
    }

    pub fn set_inactive_tranche(&mut self, tranche: &LimitOrderTranche) -> Result<()> {
        let value = encode_tranche(tranche)?;
        self.set(inactive_tranche_key(&tranche.key), value);
        Ok(())
    }

    pub fn remove_inactive_tranche(&mut self, key: &LimitOrderTrancheKey) {
        self.delete(&inactive_tranche_key(key));
    }

    pub fn inactive_tranches(&self, trade_pair_id: &TradePairId) -> Result<Vec<LimitOrderTranche>> {
        let prefix = inactive_tranche_pair_prefix(trade_pair_id);
        self.prefix_iter(&prefix).map(|(_, v)| decode_tranche(v)).collect()
    }

    pub fn all_inactive_tranches(&self) -> Result<Vec<LimitOrderTranche>> {
        self.prefix_iter(INACTIVE_TRANCHE_PREFIX)
            .map(|(_, v)| decode_tranche(v))
            .collect()
    }

    // ========================================================================
    // Tranche users
    // ========================================================================

    pub fn get_tranche_user(
        &self,
        address: &str,
        tranche_key: &str,
    ) -> Result<Option<LimitOrderTrancheUser>> {
        self.get(&tranche_user_key(address, tranche_key))
            .map(|b| decode_tranche_user(b))
            .transpose()
    }

    pub fn set_tranche_user(&mut self, user: &LimitOrderTrancheUser) -> Result<()> {
        let value = encode_tranche_user(user)?;
        self.set(tranche_user_key(&user.address, &user.tranche_key), value);
        Ok(())
    }

    pub fn remove_tranche_user(&mut self, address: &str, tranche_key: &str) {
        self.delete(&tranche_user_key(address, tranche_key));
    }

    pub fn tranche_users_by_address(&self, address: &str) -> Result<Vec<LimitOrderTrancheUser>> {
        let prefix = tranche_user_address_prefix(address);
        self.prefix_iter(&prefix)
            .map(|(_, v)| decode_tranche_user(v))
            .collect()
    }

    pub fn all_tranche_users(&self) -> Result<Vec<LimitOrderTrancheUser>> {
        self.prefix_iter(TRANCHE_USER_PREFIX)
            .map(|(_, v)| decode_tranche_user(v))
            .collect()
    }

    // ========================================================================
    // Expirations
    // ========================================================================

    pub fn set_expiration(&mut self, expiration: &LimitOrderExpiration) -> Result<()> {
        let value = encode_expiration(expiration)?;
        self.set(
            expiration_key(expiration.expiration_time, &expiration.tranche_ref),
            value,
        );
        Ok(())
    }

    pub fn remove_expiration(&mut self, expiration_time: i64, tranche_ref: &[u8]) {
        self.delete(&expiration_key(expiration_time, tranche_ref));
    }

    /// Expiration record of the tranche at `key`.
    pub fn set_tranche_expiration(&mut self, tranche: &LimitOrderTranche) -> Result<()> {
        match tranche.expiration_time {
            Some(time) => self.set_expiration(&LimitOrderExpiration {
                expiration_time: time,
                tranche_ref: tranche_ref(&tranche.key),
            }),
            None => Ok(()),
        }
    }

    pub fn remove_tranche_expiration(&mut self, tranche: &LimitOrderTranche) {
        if let Some(time) = tranche.expiration_time {
            self.remove_expiration(time, &tranche_ref(&tranche.key));
        }
    }

    /// Every expiration record in time order.
    pub fn all_expirations(&self) -> Result<Vec<LimitOrderExpiration>> {
        self.prefix_iter(EXPIRATION_PREFIX)
            .map(|(_, v)| decode_expiration(v))
            .collect()
    }

    /// Expiration records due at or before `block_time`, oldest first.
    pub fn expirations_until(&self, block_time: i64) -> Result<Vec<LimitOrderExpiration>> {
        let mut due = Vec::new();
        for (_, value) in self.prefix_iter(EXPIRATION_PREFIX) {
            let expiration = decode_expiration(value)?;
            if expiration.expiration_time > block_time {
                break;
            }
            due.push(expiration);
        }
        Ok(due)
    }

    /// Active tranche an expiration record points at.
    pub fn get_tranche_by_ref(&self, tranche_ref: &[u8]) -> Result<Option<LimitOrderTranche>> {
        let key = [TICK_LIQUIDITY_PREFIX, tranche_ref].concat();
        self.get(&key).map(|b| decode_tranche(b)).transpose()
    }

    // ========================================================================
    // Pools
    // ========================================================================

    pub fn get_pool_id(&self, pair_id: &PairId, center_tick: i64, fee: u64) -> Result<Option<u64>> {
        self.get(&pool_id_key(pair_id, center_tick, fee))
            .map(|b| decode_u64(b))
            .transpose()
    }

    pub fn pool_count(&self) -> Result<u64> {
        Ok(self.get(POOL_COUNT_KEY).map(|b| decode_u64(b)).transpose()?.unwrap_or(0))
    }

    pub fn get_pool_metadata(&self, id: u64) -> Result<Option<PoolMetadata>> {
        self.get(&pool_metadata_key(id))
            .map(|b| decode_pool_metadata(b))
            .transpose()
    }

    pub fn all_pool_metadata(&self) -> Result<Vec<PoolMetadata>> {
        self.prefix_iter(POOL_METADATA_PREFIX)
            .map(|(_, v)| decode_pool_metadata(v))
            .collect()
    }

    /// Register a new pool id with its index and metadata.
    fn register_pool(&mut self, pair_id: &PairId, center_tick: i64, fee: u64) -> Result<u64> {
        let id = self.pool_count()?;
        self.set(pool_id_key(pair_id, center_tick, fee), encode_u64(id)?);
        self.set(
            pool_metadata_key(id),
            encode_pool_metadata(&PoolMetadata {
                id,
                tick: center_tick,
                fee,
                pair_id: pair_id.clone(),
            })?,
        );
        self.set(POOL_COUNT_KEY.to_vec(), encode_u64(id + 1)?);
        Ok(id)
    }

    /// Pool at `(pair, center tick, fee)` with both sides loaded.
    pub fn get_pool(&self, pair_id: &PairId, center_tick: i64, fee: u64) -> Result<Option<Pool>> {
        let Some(id) = self.get_pool_id(pair_id, center_tick, fee)? else {
            return Ok(None);
        };
        let mut pool = Pool::new(pair_id, center_tick, fee, id)?;
        if let Some(upper) = self.get_pool_reserves(&pool.upper_tick1.key)? {
            pool.upper_tick1 = upper;
        }
        if let Some(lower) = self.get_pool_reserves(&pool.lower_tick0.key)? {
            pool.lower_tick0 = lower;
        }
        Ok(Some(pool))
    }

    pub fn get_pool_by_id(&self, id: u64) -> Result<Option<Pool>> {
        match self.get_pool_metadata(id)? {
            Some(meta) => self.get_pool(&meta.pair_id, meta.tick, meta.fee),
            None => Ok(None),
        }
    }

    /// Existing pool, or a freshly registered empty one.
    pub fn get_or_init_pool(&mut self, pair_id: &PairId, center_tick: i64, fee: u64) -> Result<Pool> {
        if let Some(pool) = self.get_pool(pair_id, center_tick, fee)? {
            return Ok(pool);
        }
        // Validate the ticks before an id is consumed
        let template = Pool::new(pair_id, center_tick, fee, 0)?;
        let id = self.register_pool(pair_id, center_tick, fee)?;
        Ok(Pool { id, ..template })
    }

    pub fn set_pool(&mut self, pool: &Pool) -> Result<()> {
        self.set_pool_reserves(&pool.lower_tick0)?;
        self.set_pool_reserves(&pool.upper_tick1)
    }

    // ========================================================================
    // Schema version
    // ========================================================================

    pub fn schema_version(&self) -> Result<u64> {
        Ok(self
            .get(SCHEMA_VERSION_KEY)
            .map(|b| decode_u64(b))
            .transpose()?
            .unwrap_or(0))
    }

    pub fn set_schema_version(&mut self, version: u64) -> Result<()> {
        self.set(SCHEMA_VERSION_KEY.to_vec(), encode_u64(version)?);
        Ok(())
    }
}
