//! Engine configuration.
//!
//! An explicit immutable value threaded into the engine at construction;
//! nothing here is process-wide state.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BPS_DENOMINATOR, DEFAULT_BANK_MINIMUM_LIQUIDITY, DEFAULT_SWAP_FEE_TIERS_BPS, LP_DECIMALS,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Allowed constant-product swap fees, in bps.
    pub swap_fee_tiers_bps: Vec<u16>,
    /// Floor on the first bToken mint of every bank.
    pub bank_minimum_liquidity: u64,
    /// Required LP token decimals.
    pub lp_decimals: u8,
    /// Quote oracle pools off their reserve ratio when a price is unavailable.
    pub oracle_fallback_to_reserve_ratio: bool,
    /// Carried opaque, not interpreted by the engine.
    pub admins: Vec<String>,
    pub package_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            swap_fee_tiers_bps: DEFAULT_SWAP_FEE_TIERS_BPS.to_vec(),
            bank_minimum_liquidity: DEFAULT_BANK_MINIMUM_LIQUIDITY,
            lp_decimals: LP_DECIMALS,
            oracle_fallback_to_reserve_ratio: false,
            admins: Vec::new(),
            package_id: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.swap_fee_tiers_bps.is_empty() {
            return Err(Error::InvalidConfig("swap_fee_tiers_bps is empty".into()));
        }
        if let Some(bad) = self
            .swap_fee_tiers_bps
            .iter()
            .find(|bps| u64::from(**bps) > BPS_DENOMINATOR)
        {
            return Err(Error::InvalidConfig(format!("fee tier {bad} bps exceeds 10000")));
        }
        if self.lp_decimals != LP_DECIMALS {
            return Err(Error::InvalidConfig(format!(
                "lp_decimals must be {LP_DECIMALS}, got {}",
                self.lp_decimals
            )));
        }
        Ok(())
    }

    pub fn is_allowed_fee_tier(&self, bps: u16) -> bool {
        self.swap_fee_tiers_bps.contains(&bps)
    }
}
