//! A maker's position in one tranche.

use alloy_primitives::U256;

use crate::error::Result;
use crate::math::PrecDec;
use crate::types::order::LimitOrderType;
use crate::types::pair::TradePairId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LimitOrderTrancheUser {
    pub trade_pair_id: TradePairId,
    pub tick_index_taker_to_maker: i64,
    pub tranche_key: String,
    pub address: String,
    /// Maker tokens deposited into the tranche
    pub shares_owned: U256,
    /// Shares already settled against fills (or refunded in full)
    pub shares_withdrawn: U256,
    pub dec_shares_withdrawn: PrecDec,
    /// Principal refunded by a partial cancel in older records. A cancel
    /// now removes the whole position, so new records keep this at zero.
    pub shares_cancelled: U256,
    pub order_type: LimitOrderType,
}

impl LimitOrderTrancheUser {
    pub fn new(
        trade_pair_id: TradePairId,
        tick_index_taker_to_maker: i64,
        tranche_key: impl Into<String>,
        address: impl Into<String>,
        order_type: LimitOrderType,
    ) -> Self {
        Self {
            trade_pair_id,
            tick_index_taker_to_maker,
            tranche_key: tranche_key.into(),
            address: address.into(),
            order_type,
            ..Self::default()
        }
    }

    /// Fully settled: nothing left to withdraw or cancel.
    pub fn is_empty(&self) -> bool {
        self.shares_withdrawn >= self.shares_owned
    }

    pub fn set_shares_withdrawn(&mut self, amount: U256) -> Result<()> {
        self.dec_shares_withdrawn = PrecDec::from_int(amount)?;
        self.shares_withdrawn = amount;
        Ok(())
    }
}
