//! Coin movements between accounts and the Dex module account.
//!
//! ## Components
//!
//! - [`BankKeeper`]: the capability the engine consumes; mirrors the
//!   send/mint/burn surface of a chain bank module
//! - [`MemoryBank`]: in-memory implementation with a nested journal, used by
//!   tests, benches and the demo binary
//!
//! ## Atomicity
//!
//! The engine opens a bank frame next to every store frame, so a failed
//! message leaves balances and supply exactly as they were.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::error::{DexError, Result};
use crate::math::{checked_add_amount, checked_sub_amount};

/// Account holding every token deposited into pools and tranches.
pub const MODULE_ACCOUNT: &str = "dex";

/// An amount of one denom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Non-zero coins out of `(denom, amount)` pairs.
pub fn coins<'a>(items: impl IntoIterator<Item = (&'a str, U256)>) -> Vec<Coin> {
    items
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(denom, amount)| Coin::new(denom, amount))
        .collect()
}

/// Bank capability required by the Dex.
pub trait BankKeeper {
    fn send_from_account_to_module(&mut self, from: &str, coins: &[Coin]) -> Result<()>;

    fn send_from_module_to_account(&mut self, to: &str, coins: &[Coin]) -> Result<()>;

    fn mint_to_module(&mut self, coins: &[Coin]) -> Result<()>;

    fn burn_from_module(&mut self, coins: &[Coin]) -> Result<()>;

    fn balance(&self, address: &str, denom: &str) -> U256;

    fn supply(&self, denom: &str) -> U256;

    /// Every account holding a positive balance of `denom`, by address.
    fn holders(&self, denom: &str) -> Vec<(String, U256)>;

    // Journal
    fn begin(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}

// ============================================================================
// MemoryBank
// ============================================================================

type BalanceKey = (String, String);

#[derive(Debug, Default, Clone)]
struct BankFrame {
    balances: BTreeMap<BalanceKey, U256>,
    supply: BTreeMap<String, U256>,
}

/// Balances keyed by `(address, denom)` plus per-denom supply.
#[derive(Debug, Default, Clone)]
pub struct MemoryBank {
    balances: BTreeMap<BalanceKey, U256>,
    supply: BTreeMap<String, U256>,
    journal: Vec<BankFrame>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` of `denom` straight into `address`.
    pub fn fund(&mut self, address: &str, denom: &str, amount: U256) -> Result<()> {
        self.add_supply(denom, amount)?;
        self.add_balance(address, denom, amount)
    }

    /// Every `(address, denom, amount)` with a positive balance.
    pub fn all_balances(&self) -> Vec<(String, String, U256)> {
        self.balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|((address, denom), amount)| (address.clone(), denom.clone(), *amount))
            .collect()
    }

    fn set_balance(&mut self, address: &str, denom: &str, amount: U256) {
        let key = (address.to_string(), denom.to_string());
        let previous = self.balances.get(&key).copied().unwrap_or_default();
        if let Some(frame) = self.journal.last_mut() {
            frame.balances.entry(key.clone()).or_insert(previous);
        }
        if amount.is_zero() {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, amount);
        }
    }

    fn set_supply(&mut self, denom: &str, amount: U256) {
        let previous = self.supply(denom);
        if let Some(frame) = self.journal.last_mut() {
            frame.supply.entry(denom.to_string()).or_insert(previous);
        }
        if amount.is_zero() {
            self.supply.remove(denom);
        } else {
            self.supply.insert(denom.to_string(), amount);
        }
    }

    fn add_balance(&mut self, address: &str, denom: &str, amount: U256) -> Result<()> {
        let current = self.balance(address, denom);
        self.set_balance(address, denom, checked_add_amount(current, amount)?);
        Ok(())
    }

    fn sub_balance(&mut self, address: &str, denom: &str, amount: U256) -> Result<()> {
        let current = self.balance(address, denom);
        if current < amount {
            return Err(DexError::InsufficientFunds {
                address: address.to_string(),
                denom: denom.to_string(),
                available: current.to_string(),
                required: amount.to_string(),
            });
        }
        self.set_balance(address, denom, current - amount);
        Ok(())
    }

    fn add_supply(&mut self, denom: &str, amount: U256) -> Result<()> {
        let current = self.supply(denom);
        self.set_supply(denom, checked_add_amount(current, amount)?);
        Ok(())
    }

    fn sub_supply(&mut self, denom: &str, amount: U256) -> Result<()> {
        let current = self.supply(denom);
        self.set_supply(denom, checked_sub_amount(current, amount)?);
        Ok(())
    }

    fn transfer(&mut self, from: &str, to: &str, coins: &[Coin]) -> Result<()> {
        for coin in coins {
            self.sub_balance(from, &coin.denom, coin.amount)?;
            self.add_balance(to, &coin.denom, coin.amount)?;
        }
        Ok(())
    }
}

impl BankKeeper for MemoryBank {
    fn send_from_account_to_module(&mut self, from: &str, coins: &[Coin]) -> Result<()> {
        self.transfer(from, MODULE_ACCOUNT, coins)
    }

    fn send_from_module_to_account(&mut self, to: &str, coins: &[Coin]) -> Result<()> {
        self.transfer(MODULE_ACCOUNT, to, coins)
    }

    fn mint_to_module(&mut self, coins: &[Coin]) -> Result<()> {
        for coin in coins {
            self.add_supply(&coin.denom, coin.amount)?;
            self.add_balance(MODULE_ACCOUNT, &coin.denom, coin.amount)?;
        }
        Ok(())
    }

    fn burn_from_module(&mut self, coins: &[Coin]) -> Result<()> {
        for coin in coins {
            self.sub_balance(MODULE_ACCOUNT, &coin.denom, coin.amount)?;
            self.sub_supply(&coin.denom, coin.amount)?;
        }
        Ok(())
    }

    fn balance(&self, address: &str, denom: &str) -> U256 {
        self.balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn supply(&self, denom: &str) -> U256 {
        self.supply.get(denom).copied().unwrap_or_default()
    }

    fn holders(&self, denom: &str) -> Vec<(String, U256)> {
        self.balances
            .iter()
            .filter(|((_, d), amount)| d == denom && !amount.is_zero())
            .map(|((address, _), amount)| (address.clone(), *amount))
            .collect()
    }

    fn begin(&mut self) {
        self.journal.push(BankFrame::default());
    }

    fn commit(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        if let Some(parent) = self.journal.last_mut() {
            for (key, previous) in frame.balances {
                parent.balances.entry(key).or_insert(previous);
            }
            for (denom, previous) in frame.supply {
                parent.supply.entry(denom).or_insert(previous);
            }
        }
    }

    fn rollback(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        for (key, previous) in frame.balances {
            if previous.is_zero() {
                self.balances.remove(&key);
            } else {
                self.balances.insert(key, previous);
            }
        }
        for (denom, previous) in frame.supply {
            if previous.is_zero() {
                self.supply.remove(&denom);
            } else {
                self.supply.insert(denom, previous);
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
