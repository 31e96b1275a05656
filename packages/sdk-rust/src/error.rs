//! SDK error type.
//!
//! Every failure the engine can report is a distinct variant. [`Error::kind`]
//! returns the stable kind name callers match on, and [`Error::category`]
//! tells "try a smaller amount" apart from "the state is broken".

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rejected before any state read: zero amounts, mismatched ids, bad params.
    InputViolation,
    /// Rejected after computation, before commit.
    InvariantViolation,
    /// The pool or bank cannot cover the requested output.
    ResourceExhaustion,
    /// An external collaborator (oracle, lending market) failed.
    Collaborator,
}

/// All errors returned by the STEAMM SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Arithmetic overflow in fixed-point math")]
    ArithmeticOverflow,

    #[error("Division by zero in fixed-point math")]
    DivisionByZero,

    #[error("Invalid decimal literal: {0}")]
    InvalidDecimal(String),

    // ── Bank ─────────────────────────────────────────────────────────────────
    #[error("Coin amount must be greater than zero")]
    EmptyCoinAmount,

    #[error("Initial bank deposit {amount} is below the minimum liquidity of {minimum}")]
    InitialDepositBelowMinimumLiquidity { amount: u64, minimum: u64 },

    #[error("bToken amount must be greater than zero")]
    EmptyBToken,

    #[error("bToken amount {requested} exceeds the tracked balance of {available}")]
    InvalidBtokenBalance { requested: u64, available: u64 },

    /// Held (non-delegated) funds cannot cover the payout; a rebalance is needed.
    #[error("Bank holds {available} underlying but {requested} is required")]
    InsufficientBankFunds { requested: u64, available: u64 },

    #[error("Bank holds {0} underlying with no bTokens outstanding")]
    UnbackedBankFunds(u64),

    #[error("Lending is already active for this bank")]
    LendingAlreadyActive,

    #[error("Target utilisation plus buffer exceeds 100%")]
    UtilisationRangeAboveHundredPercent,

    #[error("Target utilisation minus buffer falls below 0%")]
    UtilisationRangeBelowZeroPercent,

    // ── Fees ─────────────────────────────────────────────────────────────────
    #[error("Swap fee of {0} bps is not an allowed fee tier")]
    InvalidSwapFeeBpsType(u16),

    #[error("Fee of {0} bps exceeds 10000 bps")]
    InvalidFeeBps(u16),

    // ── Swap ─────────────────────────────────────────────────────────────────
    #[error("Swap input amount must be greater than zero")]
    EmptyCoins,

    #[error("Swap output rounds down to zero")]
    SwapOutputAmountIsZero,

    #[error("Swap output would drain the output reserve")]
    OutputExceedsLiquidity,

    #[error("Swap would decrease the constant-product invariant")]
    InvariantViolation,

    #[error("Swap would leave a zero constant-product invariant")]
    ZeroInvariant,

    #[error("Slippage guard triggered: amount_out={amount_out}, min_amount_out={min}")]
    SwapExceedsSlippage { amount_out: u64, min: u64 },

    // ── Deposit ──────────────────────────────────────────────────────────────
    #[error("Deposit maximums must both be greater than zero")]
    DepositMaxAParamCantBeZero,

    #[error("Deposit ratio leads to a zero amount of one asset")]
    DepositRatioLeadsToZeroA,

    #[error("Deposit amounts disagree with the pool reserve ratio")]
    DepositRatioInvalid,

    #[error("Deposit mints zero LP tokens")]
    ZeroLpTokensMinted,

    #[error("Slippage guard triggered: lp_minted={lp_minted}, min_lp_out={min}")]
    DepositSlippageExceeded { lp_minted: u64, min: u64 },

    // ── Redeem ───────────────────────────────────────────────────────────────
    #[error("LP token amount must be non-zero and at most the LP supply")]
    LpTokenEmpty,

    #[error("Redeem slippage on A: withdraw_a={amount}, min_a={min}")]
    RedeemSlippageAExceeded { amount: u64, min: u64 },

    #[error("Redeem slippage on B: withdraw_b={amount}, min_b={min}")]
    RedeemSlippageBExceeded { amount: u64, min: u64 },

    // ── Pool creation ────────────────────────────────────────────────────────
    #[error("Pool assets A and B must differ")]
    TypeAandBDuplicated,

    #[error("LP token decimals must be {expected}, got {decimals}")]
    InvalidLpDecimals { decimals: u8, expected: u8 },

    #[error("LP supply must be zero at pool creation")]
    LpSupplyMustBeZero,

    // ── Oracle ───────────────────────────────────────────────────────────────
    #[error("Oracle price index {actual} does not match the pool's index {expected}")]
    InvalidOracleIndex { expected: u64, actual: u64 },

    #[error("Oracle price {index} unavailable: {reason}")]
    OracleUnavailable { index: u64, reason: String },

    // ── Lending market ───────────────────────────────────────────────────────
    #[error("Lending market call failed: {0}")]
    LendingMarket(String),

    // ── Lookup / configuration ───────────────────────────────────────────────
    #[error("Bank not found for asset {0}")]
    BankNotFound(String),

    #[error("Bank already registered for asset {0}")]
    BankAlreadyExists(String),

    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Pool already exists: {0}")]
    PoolAlreadyExists(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable kind name, one per variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ArithmeticOverflow => "ArithmeticOverflow",
            Error::DivisionByZero => "DivisionByZero",
            Error::InvalidDecimal(_) => "EInvalidDecimal",
            Error::EmptyCoinAmount => "EEmptyCoinAmount",
            Error::InitialDepositBelowMinimumLiquidity { .. } => {
                "EInitialDepositBelowMinimumLiquidity"
            }
            Error::EmptyBToken => "EEmptyBToken",
            Error::InvalidBtokenBalance { .. } => "EInvalidBtokenBalance",
            Error::InsufficientBankFunds { .. } => "EInsufficientBankFunds",
            Error::UnbackedBankFunds(_) => "EUnbackedBankFunds",
            Error::LendingAlreadyActive => "ELendingAlreadyActive",
            Error::UtilisationRangeAboveHundredPercent => "EUtilisationRangeAboveHundredPercent",
            Error::UtilisationRangeBelowZeroPercent => "EUtilisationRangeBelowZeroPercent",
            Error::InvalidSwapFeeBpsType(_) => "EInvalidSwapFeeBpsType",
            Error::InvalidFeeBps(_) => "EInvalidFeeBps",
            Error::EmptyCoins => "EEmptyCoins",
            Error::SwapOutputAmountIsZero => "ESwapOutputAmountIsZero",
            Error::OutputExceedsLiquidity => "EOutputExceedsLiquidity",
            Error::InvariantViolation => "EInvariantViolation",
            Error::ZeroInvariant => "EZeroInvariant",
            Error::SwapExceedsSlippage { .. } => "ESwapExceedsSlippage",
            Error::DepositMaxAParamCantBeZero => "EDepositMaxAParamCantBeZero",
            Error::DepositRatioLeadsToZeroA => "EDepositRatioLeadsToZeroA",
            Error::DepositRatioInvalid => "EDepositRatioInvalid",
            Error::ZeroLpTokensMinted => "EZeroLpTokensMinted",
            Error::DepositSlippageExceeded { .. } => "EDepositSlippageExceeded",
            Error::LpTokenEmpty => "ELpTokenEmpty",
            Error::RedeemSlippageAExceeded { .. } => "ERedeemSlippageAExceeded",
            Error::RedeemSlippageBExceeded { .. } => "ERedeemSlippageBExceeded",
            Error::TypeAandBDuplicated => "ETypeAandBDuplicated",
            Error::InvalidLpDecimals { .. } => "EInvalidLpDecimals",
            Error::LpSupplyMustBeZero => "ELpSupplyMustBeZero",
            Error::InvalidOracleIndex { .. } => "EInvalidOracleIndex",
            Error::OracleUnavailable { .. } => "EOracleUnavailable",
            Error::LendingMarket(_) => "ELendingMarket",
            Error::BankNotFound(_) => "EBankNotFound",
            Error::BankAlreadyExists(_) => "EBankAlreadyExists",
            Error::PoolNotFound(_) => "EPoolNotFound",
            Error::PoolAlreadyExists(_) => "EPoolAlreadyExists",
            Error::InvalidConfig(_) => "EInvalidConfig",
            Error::Json(_) => "EInvalidSnapshot",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        use ErrorCategory::*;
        match self {
            Error::InsufficientBankFunds { .. } | Error::OutputExceedsLiquidity => {
                ResourceExhaustion
            }

            Error::ArithmeticOverflow
            | Error::DivisionByZero
            | Error::InitialDepositBelowMinimumLiquidity { .. }
            | Error::UnbackedBankFunds(_)
            | Error::InvariantViolation
            | Error::ZeroInvariant
            | Error::DepositRatioInvalid => InvariantViolation,

            Error::OracleUnavailable { .. } | Error::LendingMarket(_) => Collaborator,

            _ => InputViolation,
        }
    }
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_verbatim() {
        assert_eq!(Error::EmptyCoins.kind(), "EEmptyCoins");
        assert_eq!(
            Error::InsufficientBankFunds { requested: 2, available: 1 }.kind(),
            "EInsufficientBankFunds"
        );
        assert_eq!(Error::TypeAandBDuplicated.kind(), "ETypeAandBDuplicated");
    }

    #[test]
    fn categories_separate_exhaustion_from_breakage() {
        assert_eq!(Error::OutputExceedsLiquidity.category(), ErrorCategory::ResourceExhaustion);
        assert_eq!(Error::InvariantViolation.category(), ErrorCategory::InvariantViolation);
        assert_eq!(Error::EmptyCoins.category(), ErrorCategory::InputViolation);
        assert_eq!(
            Error::LendingMarket("down".into()).category(),
            ErrorCategory::Collaborator
        );
    }
}
