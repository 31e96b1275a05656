//! Constant-product quoter: x · y = k.

use log::debug;
use primitive_types::U256;

use super::{settle, take_fee, RawSwapQuote, Reserves, SwapQuoter};
use crate::error::{Error, Result};
use crate::math::{mul_div_u128, Rounding};
use crate::state::FeeConfig;

/// `offset` is virtual liquidity added to both reserves before pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstantProduct {
    pub offset: u64,
}

impl SwapQuoter for ConstantProduct {
    fn quote_swap(
        &self,
        reserves: &Reserves,
        fees: &FeeConfig,
        a2b: bool,
        amount_in: u64,
    ) -> Result<RawSwapQuote> {
        let (fee, net_in) = take_fee(amount_in, fees)?;
        if net_in == 0 {
            return Err(Error::SwapOutputAmountIsZero);
        }

        let (reserve_in, reserve_out) = reserves.directional(a2b);
        let offset = self.offset as u128;
        let virtual_in = reserve_in as u128 + offset;
        let virtual_out = reserve_out as u128 + offset;

        // (x + dx) * (y - dy) = x * y  =>  dy = y * dx / (x + dx)
        let amount_out = mul_div_u128(
            virtual_out,
            net_in as u128,
            virtual_in + net_in as u128,
            Rounding::Down,
        )?;
        let amount_out = u64::try_from(amount_out).map_err(|_| Error::ArithmeticOverflow)?;

        let quote = settle(reserve_in, reserve_out, amount_in, amount_out, fee)?;
        check_invariant(
            (virtual_in, virtual_out),
            (quote.new_reserve_in as u128 + offset, quote.new_reserve_out as u128 + offset),
        )?;

        debug!(
            "cpmm quote: in={} fee={} net={} out={} a2b={}",
            amount_in, fee.gross, net_in, amount_out, a2b
        );
        Ok(quote)
    }
}

/// The post-trade product of reserves may never fall below the pre-trade one.
pub fn check_invariant(before: (u128, u128), after: (u128, u128)) -> Result<()> {
    let k_before = U256::from(before.0) * U256::from(before.1);
    let k_after = U256::from(after.0) * U256::from(after.1);
    if k_after.is_zero() {
        return Err(Error::ZeroInvariant);
    }
    if k_after < k_before {
        return Err(Error::InvariantViolation);
    }
    Ok(())
}
