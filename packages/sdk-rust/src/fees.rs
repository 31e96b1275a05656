//! Swap fee resolution and the LP / protocol split.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::constants::BPS_DENOMINATOR;
use crate::error::{Error, Result};
use crate::math::{bps_of, Rounding};
use crate::state::FeeConfig;

/// Fee taken from one swap input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwapFee {
    pub gross: u64,
    /// Stays in the pool reserves.
    pub lp: u64,
    /// Leaves the reserves for the protocol fee accumulator.
    pub protocol: u64,
}

impl FeeConfig {
    pub fn new(swap_fee_bps: u16, protocol_fee_bps: u16) -> Result<Self> {
        let config = Self { swap_fee_bps, protocol_fee_bps };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for bps in [self.swap_fee_bps, self.protocol_fee_bps] {
            if u64::from(bps) > BPS_DENOMINATOR {
                return Err(Error::InvalidFeeBps(bps));
            }
        }
        Ok(())
    }
}

/// Constant-product pools only accept swap fees from the configured tiers.
pub fn validate_swap_fee_tier(swap_fee_bps: u16, config: &EngineConfig) -> Result<()> {
    if config.is_allowed_fee_tier(swap_fee_bps) {
        Ok(())
    } else {
        Err(Error::InvalidSwapFeeBpsType(swap_fee_bps))
    }
}

/// Split a gross fee into `(lp_fee, protocol_fee)`.
///
/// The protocol share rounds down and the LP share is the remainder, so the
/// two always sum to `gross_fee`.
pub fn split_fee(gross_fee: u64, protocol_fee_bps: u16) -> Result<(u64, u64)> {
    if u64::from(protocol_fee_bps) > BPS_DENOMINATOR {
        return Err(Error::InvalidFeeBps(protocol_fee_bps));
    }
    let protocol = bps_of(gross_fee, protocol_fee_bps, Rounding::Down)?;
    Ok((gross_fee - protocol, protocol))
}

/// Gross fee on `amount_in` (rounded up, against the trader) and its split.
pub fn compute_swap_fee(amount_in: u64, fees: &FeeConfig) -> Result<SwapFee> {
    let gross = bps_of(amount_in, fees.swap_fee_bps, Rounding::Up)?;
    let (lp, protocol) = split_fee(gross, fees.protocol_fee_bps)?;
    Ok(SwapFee { gross, lp, protocol })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gross_fee_rounds_up() {
        let fees = FeeConfig::new(30, 0).unwrap();
        assert_eq!(compute_swap_fee(10_000, &fees).unwrap().gross, 30);
        // 1 * 30 / 10_000 rounds up to a whole unit
        assert_eq!(compute_swap_fee(1, &fees).unwrap().gross, 1);
        assert_eq!(compute_swap_fee(0, &fees).unwrap().gross, 0);
    }

    #[test]
    fn split_is_exact() {
        assert_eq!(split_fee(30, 2_000).unwrap(), (24, 6));
        assert_eq!(split_fee(7, 3_333).unwrap(), (5, 2));
        assert_eq!(split_fee(7, 10_000).unwrap(), (0, 7));
        assert_eq!(split_fee(7, 0).unwrap(), (7, 0));
    }

    #[test]
    fn rejects_out_of_range_bps() {
        assert!(matches!(FeeConfig::new(10_001, 0), Err(Error::InvalidFeeBps(10_001))));
        assert!(matches!(FeeConfig::new(30, 10_001), Err(Error::InvalidFeeBps(10_001))));
        assert!(matches!(split_fee(1, 10_001), Err(Error::InvalidFeeBps(_))));
    }

    #[test]
    fn fee_tier_allow_list() {
        let cfg = EngineConfig::default();
        validate_swap_fee_tier(30, &cfg).unwrap();
        assert!(matches!(
            validate_swap_fee_tier(25, &cfg),
            Err(Error::InvalidSwapFeeBpsType(25))
        ));
    }
}
