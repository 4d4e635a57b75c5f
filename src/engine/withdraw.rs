//! Pool share redemption.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use tracing::info;

use crate::bank::{coins, BankKeeper, Coin};
use crate::engine::msg::{MsgWithdrawal, MsgWithdrawalResponse};
use crate::engine::DexEngine;
use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount};
use crate::types::{normalize_tick_index, PairId};

impl<B: BankKeeper> DexEngine<B> {
    /// Burn pool shares for their pro-rata reserves.
    ///
    /// Several entries may target the same pool; each sees the balance and
    /// supply left after the entries before it.
    ///
    /// # Returns
    ///
    /// * `Err(DexError::InsufficientShares)` - If the caller holds fewer
    ///   shares than an entry asks for, or the pool does not exist
    pub(crate) fn handle_withdrawal(&mut self, msg: &MsgWithdrawal) -> Result<MsgWithdrawalResponse> {
        msg.validate()?;
        self.assert_not_paused()?;

        let pair_id = PairId::new(&msg.token_a, &msg.token_b)?;
        let mut reserve0_out = U256::ZERO;
        let mut reserve1_out = U256::ZERO;
        let mut burned: BTreeMap<String, U256> = BTreeMap::new();

        for (i, &shares) in msg.shares_to_remove.iter().enumerate() {
            let tick = normalize_tick_index(&msg.token_a, &pair_id.token0, msg.tick_indexes_a_to_b[i]);
            let fee = msg.fees[i];

            let Some(mut pool) = self.store.get_pool(&pair_id, tick, fee)? else {
                return Err(DexError::InsufficientShares {
                    requested: shares.to_string(),
                    available: U256::ZERO.to_string(),
                });
            };
            let denom = pool.pool_denom();
            let already = burned.get(&denom).copied().unwrap_or_default();

            let owned = checked_sub_amount(self.bank.balance(&msg.creator, &denom), already)?;
            if owned < shares {
                return Err(DexError::InsufficientShares {
                    requested: shares.to_string(),
                    available: owned.to_string(),
                });
            }
            let total = checked_sub_amount(self.bank.supply(&denom), already)?;

            let (out0, out1) = pool.withdraw(shares, total)?;
            self.store.set_pool(&pool)?;

            reserve0_out = checked_add_amount(reserve0_out, out0)?;
            reserve1_out = checked_add_amount(reserve1_out, out1)?;
            burned.insert(denom, checked_add_amount(already, shares)?);

            info!(
                creator = %msg.creator,
                pair = %pair_id,
                tick,
                fee,
                shares = %shares,
                out0 = %out0,
                out1 = %out1,
                "withdraw"
            );
        }

        let shares_burned: Vec<Coin> = burned
            .into_iter()
            .map(|(denom, amount)| Coin::new(denom, amount))
            .collect();
        self.bank.send_from_account_to_module(&msg.creator, &shares_burned)?;
        self.bank.burn_from_module(&shares_burned)?;

        let payout = coins([
            (pair_id.token0.as_str(), reserve0_out),
            (pair_id.token1.as_str(), reserve1_out),
        ]);
        self.bank.send_from_module_to_account(&msg.receiver, &payout)?;

        Ok(MsgWithdrawalResponse {
            reserve0_withdrawn: reserve0_out,
            reserve1_withdrawn: reserve1_out,
            shares_burned,
        })
    }
}
