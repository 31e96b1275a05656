/// Denominator for basis-point math.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// LP tokens always carry 9 decimals.
pub const LP_DECIMALS: u8 = 9;

/// Allowed constant-product swap fee tiers, in bps.
pub const DEFAULT_SWAP_FEE_TIERS_BPS: [u16; 5] = [1, 5, 10, 30, 100];

/// Floor on a bank's first bToken mint (underlying raw units).
pub const DEFAULT_BANK_MINIMUM_LIQUIDITY: u64 = 1_000;

/// 18-decimal fixed-point scale used by [`crate::math::Decimal`].
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Number of fractional digits in a [`crate::math::Decimal`].
pub const WAD_DECIMALS: usize = 18;
