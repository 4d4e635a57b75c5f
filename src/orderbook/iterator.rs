//! Price-ordered walk over the tick liquidity of one trade pair.

use crate::error::Result;
use crate::orderbook::liquidity::{Liquidity, PoolLiquidity};
use crate::store::codec::decode_tick_liquidity;
use crate::store::keys::tick_liquidity_prefix;
use crate::store::KvStore;
use crate::types::{Pool, PoolReserves, TickLiquidity, TradePairId};

/// Cursor over `TickLiquidity/value/{pair}/{maker}/`.
///
/// The cursor remembers the last key it returned instead of holding a
/// borrow, so callers may write the store between calls to [`next`].
/// Entries with no maker tokens and expired good-til tranches are skipped.
///
/// [`next`]: LiquidityIterator::next
#[derive(Debug, Clone)]
pub struct LiquidityIterator {
    trade_pair_id: TradePairId,
    prefix: Vec<u8>,
    last_key: Option<Vec<u8>>,
    block_time: i64,
}

impl LiquidityIterator {
    pub fn new(trade_pair_id: TradePairId, block_time: i64) -> Self {
        let prefix = tick_liquidity_prefix(&trade_pair_id);
        Self {
            trade_pair_id,
            prefix,
            last_key: None,
            block_time,
        }
    }

    /// Next tradable liquidity, best price first.
    pub fn next(&mut self, store: &KvStore) -> Result<Option<Liquidity>> {
        while let Some((key, value)) = store.next_in_prefix(&self.prefix, self.last_key.as_deref()) {
            self.last_key = Some(key);
            let tick = decode_tick_liquidity(&value)?;
            if !tick.has_token() {
                continue;
            }
            match tick {
                TickLiquidity::PoolReserves(reserves) => {
                    return Ok(Some(self.wrap_pool(store, reserves)?));
                }
                TickLiquidity::LimitOrderTranche(tranche) => {
                    if tranche.is_expired(self.block_time) {
                        continue;
                    }
                    return Ok(Some(Liquidity::Tranche(tranche)));
                }
            }
        }
        Ok(None)
    }

    /// Pair `reserves` with its stored counterpart into a full pool.
    fn wrap_pool(&self, store: &KvStore, reserves: PoolReserves) -> Result<Liquidity> {
        let counterpart = match store.get_pool_reserves(&reserves.key.counterpart()?)? {
            Some(found) => found,
            None => PoolReserves::from_counterpart(&reserves)?,
        };
        let (lower_tick0, upper_tick1) = if self.trade_pair_id.is_maker_token0() {
            (reserves, counterpart)
        } else {
            (counterpart, reserves)
        };
        let fee = upper_tick1.key.fee;
        let center = upper_tick1.tick_index() - fee as i64;
        let pair_id = self.trade_pair_id.pair_id()?;
        let id = store.get_pool_id(&pair_id, center, fee)?.unwrap_or_default();
        Ok(Liquidity::Pool(PoolLiquidity {
            trade_pair_id: self.trade_pair_id.clone(),
            pool: Pool::from_reserves(id, lower_tick0, upper_tick1),
        }))
    }
}
