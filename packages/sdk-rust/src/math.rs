//! Scaled-integer arithmetic shared by the bank, fee, and quoter code.
//!
//! Amounts are raw `u64` units of the smallest denomination. Products are
//! carried in 256 bits so only a result that does not fit its output width
//! overflows; rounding direction is always explicit.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{BPS_DENOMINATOR, WAD, WAD_DECIMALS};
use crate::error::{Error, Result};

/// Rounding direction for a division.
///
/// Amounts owed *to* a user round down, amounts owed *by* a user round up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    Down,
    Up,
}

// ─── mul-div ─────────────────────────────────────────────────────────────────

/// `a * b / c` on `u64` amounts.
pub fn mul_div(a: u64, b: u64, c: u64, rounding: Rounding) -> Result<u64> {
    let q = mul_div_u128(a as u128, b as u128, c as u128, rounding)?;
    u64::try_from(q).map_err(|_| Error::ArithmeticOverflow)
}

/// `a * b / c` on `u128` operands with a 256-bit intermediate.
pub fn mul_div_u128(a: u128, b: u128, c: u128, rounding: Rounding) -> Result<u128> {
    div_wide(U256::from(a) * U256::from(b), U256::from(c), rounding)
}

/// Divide a 256-bit numerator, narrowing the quotient to `u128`.
pub fn div_wide(numerator: U256, denominator: U256, rounding: Rounding) -> Result<u128> {
    if denominator.is_zero() {
        return Err(Error::DivisionByZero);
    }
    let (q, r) = numerator.div_mod(denominator);
    let q = match rounding {
        Rounding::Up if !r.is_zero() => q.checked_add(U256::one()).ok_or(Error::ArithmeticOverflow)?,
        _ => q,
    };
    if q > U256::from(u128::MAX) {
        return Err(Error::ArithmeticOverflow);
    }
    Ok(q.as_u128())
}

/// `amount * bps / 10_000`.
pub fn bps_of(amount: u64, bps: u16, rounding: Rounding) -> Result<u64> {
    mul_div(amount, bps as u64, BPS_DENOMINATOR, rounding)
}

/// `10^exp` as a 256-bit integer.
pub fn pow10(exp: u8) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(Error::ArithmeticOverflow)
}

// ─── Integer square root (Babylonian method) ─────────────────────────────────
pub fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) >> 1;
    while y < x {
        x = y;
        y = (y + n / y) >> 1;
    }
    x
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

/// Unsigned 18-decimal fixed-point number.
///
/// Used for exchange rates, utilization, and oracle prices. Serializes as a
/// decimal string (`"1.25"`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal(u128);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0);
    pub const ONE: Decimal = Decimal(WAD);

    pub const fn from_raw(raw: u128) -> Self {
        Decimal(raw)
    }

    /// Underlying value scaled by `10^18`.
    pub const fn raw(self) -> u128 {
        self.0
    }

    pub fn from_integer(n: u64) -> Self {
        // u64::MAX * 1e18 < u128::MAX
        Decimal(n as u128 * WAD)
    }

    pub fn from_bps(bps: u16) -> Self {
        Decimal(bps as u128 * WAD / BPS_DENOMINATOR as u128)
    }

    /// `numerator / denominator`.
    pub fn from_ratio(numerator: u128, denominator: u128, rounding: Rounding) -> Result<Self> {
        mul_div_u128(numerator, WAD, denominator, rounding).map(Decimal)
    }

    pub fn checked_add(self, other: Decimal) -> Result<Self> {
        self.0.checked_add(other.0).map(Decimal).ok_or(Error::ArithmeticOverflow)
    }

    pub fn checked_mul(self, other: Decimal, rounding: Rounding) -> Result<Self> {
        mul_div_u128(self.0, other.0, WAD, rounding).map(Decimal)
    }

    pub fn checked_div(self, other: Decimal, rounding: Rounding) -> Result<Self> {
        mul_div_u128(self.0, WAD, other.0, rounding).map(Decimal)
    }

    /// `n * self`, narrowed to a raw amount.
    pub fn mul_int(self, n: u64, rounding: Rounding) -> Result<u64> {
        let v = mul_div_u128(n as u128, self.0, WAD, rounding)?;
        u64::try_from(v).map_err(|_| Error::ArithmeticOverflow)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Lossy conversion for display only.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / WAD as f64
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / WAD;
        let frac = self.0 % WAD;
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:0width$}", width = WAD_DECIMALS);
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDecimal(s.to_string());
        let (int_part, frac_part) = match s.trim().split_once('.') {
            Some((i, f)) => (i, f),
            None => (s.trim(), ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.len() > WAD_DECIMALS {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let int: u128 = if int_part.is_empty() { 0 } else { int_part.parse().map_err(|_| invalid())? };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{frac_part:0<width$}", width = WAD_DECIMALS);
            padded.parse().map_err(|_| invalid())?
        };

        int.checked_mul(WAD)
            .and_then(|v| v.checked_add(frac))
            .map(Decimal)
            .ok_or(Error::ArithmeticOverflow)
    }
}

impl TryFrom<String> for Decimal {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Decimal> for String {
    fn from(d: Decimal) -> String {
        d.to_string()
    }
}
