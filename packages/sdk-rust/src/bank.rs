//! Bank: underlying ⇄ bToken conversion and lending-market delegation.
//!
//! The exchange rate is `(held + delegated) / btoken_supply`, and 1.0 while
//! no bTokens exist. Conversions are done directly with mul-div on the two
//! totals rather than through a rounded rate.

use log::{debug, info};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::constants::BPS_DENOMINATOR;
use crate::error::{Error, Result};
use crate::external::LendingMarket;
use crate::math::{mul_div, Decimal, Rounding};
use crate::state::{Asset, BankState};
use crate::types::BankInfo;

/// What a rebalance did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RebalanceOutcome {
    NoOp,
    Deposited { amount: u64 },
    Withdrawn { requested: u64, received: u64 },
}

impl BankState {
    pub fn new(asset: Asset, btoken_asset: Asset) -> Self {
        Self {
            asset,
            btoken_asset,
            total_underlying_held: 0,
            total_underlying_delegated: 0,
            btoken_supply: 0,
            target_utilization_bps: 0,
            utilization_buffer_bps: 0,
            is_lending_active: false,
        }
    }

    pub fn total_funds(&self) -> Result<u64> {
        self.total_underlying_held
            .checked_add(self.total_underlying_delegated)
            .ok_or(Error::ArithmeticOverflow)
    }

    pub fn exchange_rate(&self) -> Result<Decimal> {
        if self.btoken_supply == 0 {
            return Ok(Decimal::ONE);
        }
        Decimal::from_ratio(
            self.total_funds()? as u128,
            self.btoken_supply as u128,
            Rounding::Down,
        )
    }

    pub fn to_btokens(&self, underlying: u64, rounding: Rounding) -> Result<u64> {
        if self.btoken_supply == 0 {
            return Ok(underlying);
        }
        mul_div(underlying, self.btoken_supply, self.total_funds()?, rounding)
    }

    pub fn to_underlying(&self, btokens: u64, rounding: Rounding) -> Result<u64> {
        if self.btoken_supply == 0 {
            return Ok(btokens);
        }
        mul_div(btokens, self.total_funds()?, self.btoken_supply, rounding)
    }

    /// Fraction of backing currently delegated. Zero for an empty bank.
    pub fn utilization(&self) -> Result<Decimal> {
        let total = self.total_funds()?;
        if total == 0 {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_ratio(
            self.total_underlying_delegated as u128,
            total as u128,
            Rounding::Down,
        )
    }

    pub fn info(&self) -> Result<BankInfo> {
        Ok(BankInfo {
            asset: self.asset.id.clone(),
            btoken: self.btoken_asset.id.clone(),
            decimals: self.asset.decimals,
            total_funds: self.total_funds()?,
            held: self.total_underlying_held,
            delegated: self.total_underlying_delegated,
            btoken_supply: self.btoken_supply,
            exchange_rate: self.exchange_rate()?,
            utilization: self.utilization()?,
            is_lending_active: self.is_lending_active,
            target_utilization_bps: self.target_utilization_bps,
            utilization_buffer_bps: self.utilization_buffer_bps,
        })
    }

    // ── Mint / burn ───────────────────────────────────────────────────────────

    /// Deposit `underlying` and return the bTokens minted.
    ///
    /// The first mint is 1:1 and must meet `config.bank_minimum_liquidity`.
    /// Funds left in a bank with no bTokens outstanding would go to the first
    /// minter, so that mint is refused.
    pub fn mint_btokens(&mut self, underlying: u64, config: &EngineConfig) -> Result<u64> {
        if underlying == 0 {
            return Err(Error::EmptyCoinAmount);
        }

        let minted = if self.btoken_supply == 0 {
            let leftover = self.total_funds()?;
            if leftover > 0 {
                return Err(Error::UnbackedBankFunds(leftover));
            }
            if underlying < config.bank_minimum_liquidity {
                return Err(Error::InitialDepositBelowMinimumLiquidity {
                    amount: underlying,
                    minimum: config.bank_minimum_liquidity,
                });
            }
            underlying
        } else {
            self.to_btokens(underlying, Rounding::Down)?
        };
        if minted == 0 {
            return Err(Error::EmptyBToken);
        }

        let held = self
            .total_underlying_held
            .checked_add(underlying)
            .ok_or(Error::ArithmeticOverflow)?;
        let supply = self.btoken_supply.checked_add(minted).ok_or(Error::ArithmeticOverflow)?;
        self.total_underlying_held = held;
        self.btoken_supply = supply;

        info!("bank {}: minted {} bTokens for {} underlying", self.asset.id, minted, underlying);
        Ok(minted)
    }

    /// Burn bTokens from a holder with `holder_balance`, returning underlying paid out.
    pub fn burn_btokens(&mut self, btokens: u64, holder_balance: u64) -> Result<u64> {
        if btokens == 0 {
            return Err(Error::EmptyBToken);
        }
        let available = holder_balance.min(self.btoken_supply);
        if btokens > available {
            return Err(Error::InvalidBtokenBalance { requested: btokens, available });
        }

        let out = self.to_underlying(btokens, Rounding::Down)?;
        if out > self.total_underlying_held {
            return Err(Error::InsufficientBankFunds {
                requested: out,
                available: self.total_underlying_held,
            });
        }

        self.total_underlying_held -= out;
        self.btoken_supply -= btokens;

        info!("bank {}: burned {} bTokens for {} underlying", self.asset.id, btokens, out);
        Ok(out)
    }

    // ── Lending ───────────────────────────────────────────────────────────────

    pub fn init_lending(
        &mut self,
        target_utilization_bps: u16,
        utilization_buffer_bps: u16,
    ) -> Result<()> {
        if self.is_lending_active {
            return Err(Error::LendingAlreadyActive);
        }
        if u64::from(target_utilization_bps) + u64::from(utilization_buffer_bps) > BPS_DENOMINATOR {
            return Err(Error::UtilisationRangeAboveHundredPercent);
        }
        if target_utilization_bps < utilization_buffer_bps {
            return Err(Error::UtilisationRangeBelowZeroPercent);
        }

        self.target_utilization_bps = target_utilization_bps;
        self.utilization_buffer_bps = utilization_buffer_bps;
        self.is_lending_active = true;
        info!(
            "bank {}: lending active, target={}bps buffer={}bps",
            self.asset.id, target_utilization_bps, utilization_buffer_bps
        );
        Ok(())
    }

    /// Move funds so utilization returns to target once it leaves
    /// `[target - buffer, target + buffer]`.
    ///
    /// No-op when lending is inactive or already within the buffer. A failed
    /// market call leaves the bank unchanged.
    pub fn rebalance<M: LendingMarket + ?Sized>(
        &mut self,
        market: &mut M,
    ) -> Result<RebalanceOutcome> {
        let total = self.total_funds()?;
        if !self.is_lending_active || total == 0 || self.within_buffer(total) {
            debug!("bank {}: rebalance not needed", self.asset.id);
            return Ok(RebalanceOutcome::NoOp);
        }

        let desired = mul_div(
            total,
            u64::from(self.target_utilization_bps),
            BPS_DENOMINATOR,
            Rounding::Down,
        )?;
        let delegated = self.total_underlying_delegated;

        let outcome = if desired > delegated {
            let amount = desired - delegated;
            market.deposit(&self.asset, amount)?;
            self.total_underlying_held -= amount;
            self.total_underlying_delegated += amount;
            RebalanceOutcome::Deposited { amount }
        } else {
            let requested = delegated - desired;
            let received = market.withdraw(&self.asset, requested)?;
            self.total_underlying_held = self
                .total_underlying_held
                .checked_add(received)
                .ok_or(Error::ArithmeticOverflow)?;
            self.total_underlying_delegated -= requested;
            RebalanceOutcome::Withdrawn { requested, received }
        };

        info!("bank {}: rebalanced {:?}", self.asset.id, outcome);
        Ok(outcome)
    }

    /// Whether held plus delegated funds can cover a payout of `amount`,
    /// without calling the lending market.
    pub fn check_payout(&self, amount: u64) -> Result<()> {
        let shortfall = amount.saturating_sub(self.total_underlying_held);
        if shortfall > self.total_underlying_delegated {
            return Err(Error::InsufficientBankFunds {
                requested: amount,
                available: self.total_underlying_held,
            });
        }
        Ok(())
    }

    /// Withdraw enough from the lending market that `amount` can be paid from
    /// held funds and utilization lands on target afterwards.
    pub fn prepare_pending_withdraw<M: LendingMarket + ?Sized>(
        &mut self,
        amount: u64,
        market: &mut M,
    ) -> Result<RebalanceOutcome> {
        if self.total_underlying_held >= amount {
            return Ok(RebalanceOutcome::NoOp);
        }
        self.check_payout(amount)?;
        let shortfall = amount - self.total_underlying_held;

        let remaining = self.total_funds()? - amount;
        let desired = mul_div(
            remaining,
            u64::from(self.target_utilization_bps),
            BPS_DENOMINATOR,
            Rounding::Down,
        )?;
        let requested = self
            .total_underlying_delegated
            .saturating_sub(desired)
            .max(shortfall);

        let received = market.withdraw(&self.asset, requested)?;
        self.total_underlying_held = self
            .total_underlying_held
            .checked_add(received)
            .ok_or(Error::ArithmeticOverflow)?;
        self.total_underlying_delegated -= requested;

        info!(
            "bank {}: withdrew {} (received {}) ahead of a {} payout",
            self.asset.id, requested, received, amount
        );
        Ok(RebalanceOutcome::Withdrawn { requested, received })
    }

    /// Record lending-market yield. The delegated balance only ever grows here,
    /// so the exchange rate never drops. Returns the amount credited.
    ///
    /// A bank with no bTokens outstanding or nothing delegated has earned
    /// nothing, and is left as is.
    pub fn compound_interest(&mut self, delegated_balance_now: u64) -> u64 {
        if self.btoken_supply == 0 || self.total_underlying_delegated == 0 {
            debug!("bank {}: no delegated position, interest ignored", self.asset.id);
            return 0;
        }
        let gained = delegated_balance_now.saturating_sub(self.total_underlying_delegated);
        if gained > 0 {
            self.total_underlying_delegated = delegated_balance_now;
            info!("bank {}: compounded {} of interest", self.asset.id, gained);
        }
        gained
    }

    fn within_buffer(&self, total: u64) -> bool {
        let target = u128::from(self.target_utilization_bps);
        let buffer = u128::from(self.utilization_buffer_bps);
        let scaled = self.total_underlying_delegated as u128 * BPS_DENOMINATOR as u128;
        let total = total as u128;
        scaled >= target.saturating_sub(buffer) * total && scaled <= (target + buffer) * total
    }
}
