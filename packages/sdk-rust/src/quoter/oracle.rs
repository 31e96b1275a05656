//! Oracle quoter: swaps priced off external feeds instead of reserves.

use log::debug;
use primitive_types::U256;

use super::{settle, take_fee, RawSwapQuote, Reserves, SwapQuoter};
use crate::error::{Error, Result};
use crate::math::{div_wide, pow10, Decimal, Rounding};
use crate::state::FeeConfig;

/// Prices of one whole token on each side plus the token decimals that
/// turn them into per-unit prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePricing {
    pub price_a: Decimal,
    pub price_b: Decimal,
    pub decimals_a: u8,
    pub decimals_b: u8,
}

impl OraclePricing {
    /// `net_in * p_in * 10^dec_out / (p_out * 10^dec_in)`, rounded down.
    fn convert(&self, net_in: u64, a2b: bool) -> Result<u64> {
        let (p_in, p_out, dec_in, dec_out) = if a2b {
            (self.price_a, self.price_b, self.decimals_a, self.decimals_b)
        } else {
            (self.price_b, self.price_a, self.decimals_b, self.decimals_a)
        };

        let numerator = U256::from(net_in)
            .checked_mul(U256::from(p_in.raw()))
            .and_then(|v| v.checked_mul(pow10(dec_out).ok()?))
            .ok_or(Error::ArithmeticOverflow)?;
        let denominator = U256::from(p_out.raw())
            .checked_mul(pow10(dec_in)?)
            .ok_or(Error::ArithmeticOverflow)?;

        let out = div_wide(numerator, denominator, Rounding::Down)?;
        u64::try_from(out).map_err(|_| Error::ArithmeticOverflow)
    }
}

impl SwapQuoter for OraclePricing {
    fn quote_swap(
        &self,
        reserves: &Reserves,
        fees: &FeeConfig,
        a2b: bool,
        amount_in: u64,
    ) -> Result<RawSwapQuote> {
        let (fee, net_in) = take_fee(amount_in, fees)?;
        let amount_out = self.convert(net_in, a2b)?;

        let (reserve_in, reserve_out) = reserves.directional(a2b);
        let quote = settle(reserve_in, reserve_out, amount_in, amount_out, fee)?;

        debug!(
            "oracle quote: in={} fee={} out={} a2b={} p_a={} p_b={}",
            amount_in, fee.gross, amount_out, a2b, self.price_a, self.price_b
        );
        Ok(quote)
    }
}
