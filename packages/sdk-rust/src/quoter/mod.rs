//! Pricing strategies.
//!
//! Every quoter works in bToken units over the same `(reserves, fees) -> quote`
//! contract; [`Quoter`] dispatches once per call. Swap pricing differs per
//! variant, while deposits and redemptions always follow the reserve ratio.

mod cpmm;
mod oracle;

pub use cpmm::{check_invariant, ConstantProduct};
pub use oracle::OraclePricing;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::fees::{compute_swap_fee, SwapFee};
use crate::math::{isqrt, mul_div, Rounding};
use crate::state::FeeConfig;

/// Pool reserves in bToken units plus LP supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub lp_supply: u64,
}

impl Reserves {
    /// `(reserve_in, reserve_out)` for a trade direction.
    pub fn directional(&self, a2b: bool) -> (u64, u64) {
        if a2b {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        }
    }
}

/// Swap quote in bToken units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawSwapQuote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: SwapFee,
    pub new_reserve_in: u64,
    pub new_reserve_out: u64,
}

/// Deposit quote in bToken units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawDepositQuote {
    pub deposit_a: u64,
    pub deposit_b: u64,
    pub lp_tokens_minted: u64,
}

/// Redemption quote in bToken units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawRedeemQuote {
    pub withdraw_a: u64,
    pub withdraw_b: u64,
}

/// Swap pricing contract implemented by each variant.
pub trait SwapQuoter {
    fn quote_swap(
        &self,
        reserves: &Reserves,
        fees: &FeeConfig,
        a2b: bool,
        amount_in: u64,
    ) -> Result<RawSwapQuote>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quoter {
    ConstantProduct(ConstantProduct),
    Oracle(OraclePricing),
}

impl Quoter {
    pub fn name(&self) -> &'static str {
        match self {
            Quoter::ConstantProduct(_) => "constant_product",
            Quoter::Oracle(_) => "oracle",
        }
    }

    pub fn quote_swap(
        &self,
        reserves: &Reserves,
        fees: &FeeConfig,
        a2b: bool,
        amount_in: u64,
    ) -> Result<RawSwapQuote> {
        match self {
            Quoter::ConstantProduct(q) => q.quote_swap(reserves, fees, a2b, amount_in),
            Quoter::Oracle(q) => q.quote_swap(reserves, fees, a2b, amount_in),
        }
    }

    /// Reserve-ratio deposit for every variant; oracle prices play no part.
    pub fn quote_deposit(&self, reserves: &Reserves, max_a: u64, max_b: u64) -> Result<RawDepositQuote> {
        quote_deposit(reserves, max_a, max_b)
    }

    pub fn quote_redeem(&self, reserves: &Reserves, lp_tokens: u64) -> Result<RawRedeemQuote> {
        quote_redeem(reserves, lp_tokens)
    }
}

// ─── Shared swap steps ────────────────────────────────────────────────────────

/// Fee step common to all variants: returns the fee and the net input.
pub(crate) fn take_fee(amount_in: u64, fees: &FeeConfig) -> Result<(SwapFee, u64)> {
    if amount_in == 0 {
        return Err(Error::EmptyCoins);
    }
    let fee = compute_swap_fee(amount_in, fees)?;
    Ok((fee, amount_in - fee.gross))
}

/// Output checks and post-trade reserves. The protocol fee leaves the
/// reserves; the LP fee stays in.
pub(crate) fn settle(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    amount_out: u64,
    fee: SwapFee,
) -> Result<RawSwapQuote> {
    if amount_out == 0 {
        return Err(Error::SwapOutputAmountIsZero);
    }
    if amount_out >= reserve_out {
        return Err(Error::OutputExceedsLiquidity);
    }
    let new_reserve_in = reserve_in
        .checked_add(amount_in - fee.protocol)
        .ok_or(Error::ArithmeticOverflow)?;

    Ok(RawSwapQuote {
        amount_in,
        amount_out,
        fee,
        new_reserve_in,
        new_reserve_out: reserve_out - amount_out,
    })
}

// ─── Deposit / redeem ─────────────────────────────────────────────────────────

/// Pin a deposit to the reserve ratio.
///
/// An empty pool takes both maximums and mints `sqrt(a * b)`. Otherwise the
/// binding maximum is deposited in full, the counter-asset amount rounds up
/// (it is owed by the depositor), and LP tokens are priced off the binding
/// side.
pub fn quote_deposit(reserves: &Reserves, max_a: u64, max_b: u64) -> Result<RawDepositQuote> {
    if max_a == 0 || max_b == 0 {
        return Err(Error::DepositMaxAParamCantBeZero);
    }

    if reserves.lp_supply == 0 {
        let product = (max_a as u128) * (max_b as u128);
        let lp = u64::try_from(isqrt(product)).map_err(|_| Error::ArithmeticOverflow)?;
        return Ok(RawDepositQuote { deposit_a: max_a, deposit_b: max_b, lp_tokens_minted: lp });
    }

    let Reserves { reserve_a, reserve_b, lp_supply } = *reserves;
    if reserve_a == 0 || reserve_b == 0 {
        return Err(Error::DepositRatioLeadsToZeroA);
    }

    let b_for_max_a = mul_div(max_a, reserve_b, reserve_a, Rounding::Up)?;
    let (deposit_a, deposit_b, lp) = if b_for_max_a <= max_b {
        let lp = mul_div(max_a, lp_supply, reserve_a, Rounding::Down)?;
        (max_a, b_for_max_a, lp)
    } else {
        let a_for_max_b = mul_div(max_b, reserve_a, reserve_b, Rounding::Up)?;
        let lp = mul_div(max_b, lp_supply, reserve_b, Rounding::Down)?;
        (a_for_max_b, max_b, lp)
    };
    if deposit_a == 0 || deposit_b == 0 {
        return Err(Error::DepositRatioLeadsToZeroA);
    }

    check_deposit_ratio(reserves, deposit_a, deposit_b, lp)?;
    if lp == 0 {
        return Err(Error::ZeroLpTokensMinted);
    }

    Ok(RawDepositQuote { deposit_a, deposit_b, lp_tokens_minted: lp })
}

/// `lp` may not exceed what either deposited leg alone entitles the depositor
/// to. Amounts from [`quote_deposit`] always pass, since the counter-asset
/// amount rounds up; this is a post-condition on the pair handed to the pool.
pub(crate) fn check_deposit_ratio(
    reserves: &Reserves,
    deposit_a: u64,
    deposit_b: u64,
    lp: u64,
) -> Result<()> {
    let Reserves { reserve_a, reserve_b, lp_supply } = *reserves;
    let lp_cap_a = mul_div(deposit_a, lp_supply, reserve_a, Rounding::Down)?;
    let lp_cap_b = mul_div(deposit_b, lp_supply, reserve_b, Rounding::Down)?;
    if lp > lp_cap_a || lp > lp_cap_b {
        return Err(Error::DepositRatioInvalid);
    }
    Ok(())
}

/// Pro-rata withdrawal, rounded down on both legs.
pub fn quote_redeem(reserves: &Reserves, lp_tokens: u64) -> Result<RawRedeemQuote> {
    if lp_tokens == 0 || lp_tokens > reserves.lp_supply {
        return Err(Error::LpTokenEmpty);
    }
    Ok(RawRedeemQuote {
        withdraw_a: mul_div(lp_tokens, reserves.reserve_a, reserves.lp_supply, Rounding::Down)?,
        withdraw_b: mul_div(lp_tokens, reserves.reserve_b, reserves.lp_supply, Rounding::Down)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserves(a: u64, b: u64, lp: u64) -> Reserves {
        Reserves { reserve_a: a, reserve_b: b, lp_supply: lp }
    }

    #[test]
    fn first_deposit_mints_geometric_mean() {
        let q = quote_deposit(&reserves(0, 0, 0), 1_000_000, 4_000_000).unwrap();
        assert_eq!(q, RawDepositQuote { deposit_a: 1_000_000, deposit_b: 4_000_000, lp_tokens_minted: 2_000_000 });
    }

    #[test]
    fn deposit_follows_binding_side() {
        let r = reserves(1_000, 2_000, 1_414);

        // A binds: B rounds up to 200
        let q = quote_deposit(&r, 100, 500).unwrap();
        assert_eq!(q, RawDepositQuote { deposit_a: 100, deposit_b: 200, lp_tokens_minted: 141 });

        // B binds: A = ceil(150 * 1000 / 2000) = 75
        let q = quote_deposit(&r, 100, 150).unwrap();
        assert_eq!(q, RawDepositQuote { deposit_a: 75, deposit_b: 150, lp_tokens_minted: 106 });
    }

    #[test]
    fn deposit_edge_cases() {
        let r = reserves(1_000, 2_000, 1_414);
        assert!(matches!(quote_deposit(&r, 0, 10), Err(Error::DepositMaxAParamCantBeZero)));
        assert!(matches!(quote_deposit(&r, 10, 0), Err(Error::DepositMaxAParamCantBeZero)));
        assert!(matches!(
            quote_deposit(&reserves(0, 2_000, 10), 5, 5),
            Err(Error::DepositRatioLeadsToZeroA)
        ));
        assert!(matches!(
            quote_deposit(&reserves(1_000_000, 1_000_000, 10), 1, 1),
            Err(Error::ZeroLpTokensMinted)
        ));
    }

    #[test]
    fn lp_above_either_leg_is_ratio_invalid() {
        let r = reserves(1_000, 2_000, 1_414);
        check_deposit_ratio(&r, 100, 200, 141).unwrap();

        // B short of the ratio: 199 of B is only worth 140 LP
        assert!(matches!(check_deposit_ratio(&r, 100, 199, 141), Err(Error::DepositRatioInvalid)));
        assert!(matches!(check_deposit_ratio(&r, 100, 200, 142), Err(Error::DepositRatioInvalid)));
    }

    #[test]
    fn redeem_is_pro_rata_and_bounded() {
        let r = reserves(1_000, 2_001, 1_000);
        assert_eq!(
            quote_redeem(&r, 500).unwrap(),
            RawRedeemQuote { withdraw_a: 500, withdraw_b: 1_000 }
        );
        assert!(matches!(quote_redeem(&r, 0), Err(Error::LpTokenEmpty)));
        assert!(matches!(quote_redeem(&r, 1_001), Err(Error::LpTokenEmpty)));
    }

    #[test]
    fn oracle_variant_uses_reserve_ratio_for_deposits() {
        let r = reserves(1_000, 2_000, 1_414);
        let q = Quoter::Oracle(OraclePricing {
            price_a: crate::math::Decimal::from_integer(100),
            price_b: crate::math::Decimal::ONE,
            decimals_a: 6,
            decimals_b: 6,
        });
        assert_eq!(q.quote_deposit(&r, 100, 500).unwrap(), quote_deposit(&r, 100, 500).unwrap());
        assert_eq!(q.name(), "oracle");
    }
}
