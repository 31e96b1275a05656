//! Collaborator contracts: price oracle and lending market.
//!
//! The engine assumes nothing beyond these traits. Each call is atomic: it
//! either succeeds in full or returns an error having changed nothing.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::state::{Asset, OraclePrice};

// ─── Price oracle ─────────────────────────────────────────────────────────────

pub trait PriceOracle: Send + Sync {
    /// Latest price for `oracle_index`. Staleness policy belongs to the caller.
    fn get_price(&self, oracle_index: u64) -> Result<OraclePrice>;
}

/// Fixed price table, e.g. loaded from a [`crate::Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    prices: HashMap<u64, OraclePrice>,
}

impl StaticOracle {
    pub fn new(prices: impl IntoIterator<Item = OraclePrice>) -> Self {
        Self { prices: prices.into_iter().map(|p| (p.oracle_index, p)).collect() }
    }

    pub fn set(&mut self, price: OraclePrice) {
        self.prices.insert(price.oracle_index, price);
    }
}

impl PriceOracle for StaticOracle {
    fn get_price(&self, oracle_index: u64) -> Result<OraclePrice> {
        self.prices.get(&oracle_index).cloned().ok_or_else(|| Error::OracleUnavailable {
            index: oracle_index,
            reason: "no price published".into(),
        })
    }
}

// ─── Lending market ───────────────────────────────────────────────────────────

/// Proof of a lending-market deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingReceipt {
    pub asset_id: String,
    pub amount: u64,
}

pub trait LendingMarket: Send {
    fn deposit(&mut self, asset: &Asset, amount: u64) -> Result<LendingReceipt>;

    /// Returns the underlying amount actually received.
    fn withdraw(&mut self, asset: &Asset, amount: u64) -> Result<u64>;
}

/// Market for deployments without lending; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLending;

impl LendingMarket for NoLending {
    fn deposit(&mut self, _asset: &Asset, _amount: u64) -> Result<LendingReceipt> {
        Err(Error::LendingMarket("no lending market configured".into()))
    }

    fn withdraw(&mut self, _asset: &Asset, _amount: u64) -> Result<u64> {
        Err(Error::LendingMarket("no lending market configured".into()))
    }
}

/// Balance-tracking market that pays back exactly what was deposited plus
/// any yield credited through [`InMemoryLendingMarket::accrue`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLendingMarket {
    balances: HashMap<String, u64>,
}

impl InMemoryLendingMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, asset_id: &str) -> u64 {
        self.balances.get(asset_id).copied().unwrap_or(0)
    }

    /// Credit interest to an asset's balance.
    pub fn accrue(&mut self, asset_id: &str, amount: u64) {
        let bal = self.balances.entry(asset_id.to_string()).or_insert(0);
        *bal = bal.saturating_add(amount);
    }
}

impl LendingMarket for InMemoryLendingMarket {
    fn deposit(&mut self, asset: &Asset, amount: u64) -> Result<LendingReceipt> {
        let bal = self.balances.entry(asset.id.clone()).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
        Ok(LendingReceipt { asset_id: asset.id.clone(), amount })
    }

    fn withdraw(&mut self, asset: &Asset, amount: u64) -> Result<u64> {
        let bal = self.balances.entry(asset.id.clone()).or_insert(0);
        if *bal < amount {
            return Err(Error::LendingMarket(format!(
                "withdraw {amount} exceeds market balance {bal} for {}",
                asset.id
            )));
        }
        *bal -= amount;
        Ok(amount)
    }
}
