//! Public parameter and result types.

use serde::{Deserialize, Serialize};

use crate::math::Decimal;
use crate::state::{FeeConfig, QuoterKind};

// ─── Parameters ───────────────────────────────────────────────────────────────

/// Parameters for [`crate::PoolState::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePoolParams {
    pub id: String,
    /// Underlying asset id of bank A.
    pub asset_a: String,
    /// Underlying asset id of bank B.
    pub asset_b: String,
    pub quoter: QuoterKind,
    pub fee_config: FeeConfig,
    pub lp_decimals: u8,
    /// Supply of the LP token handed over at creation; must be zero.
    #[serde(default)]
    pub lp_supply: u64,
}

/// Swap request in underlying units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    pub pool_id: String,
    pub a2b: bool,
    pub amount_in: u64,
    /// Minimum underlying received; 0 disables the check.
    #[serde(default)]
    pub min_amount_out: u64,
}

/// Deposit request in underlying units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParams {
    pub pool_id: String,
    pub max_a: u64,
    pub max_b: u64,
    #[serde(default)]
    pub min_lp_out: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemParams {
    pub pool_id: String,
    pub lp_tokens: u64,
    #[serde(default)]
    pub min_a: u64,
    #[serde(default)]
    pub min_b: u64,
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// Full breakdown of a swap.
///
/// `amount_in` / `amount_out` are underlying units; the `_btokens` fields and
/// the fees are in bToken units of the pool reserves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapQuote {
    pub pool_id: String,
    pub quoter: &'static str,
    pub a2b: bool,
    pub amount_in: u64,
    pub amount_out: u64,
    pub amount_in_btokens: u64,
    pub amount_out_btokens: u64,
    /// Gross fee charged on the input.
    pub fee: u64,
    pub lp_fee: u64,
    pub protocol_fee: u64,
    pub new_reserve_in: u64,
    pub new_reserve_out: u64,
    /// amount_out / amount_in in raw units.
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositQuote {
    pub pool_id: String,
    /// Underlying owed by the depositor.
    pub deposit_a: u64,
    pub deposit_b: u64,
    /// bTokens added to the reserves.
    pub deposit_a_btokens: u64,
    pub deposit_b_btokens: u64,
    pub lp_tokens_minted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedeemQuote {
    pub pool_id: String,
    pub lp_tokens_burned: u64,
    /// Underlying paid out.
    pub withdraw_a: u64,
    pub withdraw_b: u64,
    /// bTokens removed from the reserves.
    pub withdraw_a_btokens: u64,
    pub withdraw_b_btokens: u64,
}

/// Protocol fees handed out by a collection, in bTokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolFees {
    pub fee_a: u64,
    pub fee_b: u64,
}

/// Pool summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolInfo {
    pub id: String,
    pub asset_a: String,
    pub asset_b: String,
    pub quoter: QuoterKind,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub reserve_a_underlying: u64,
    pub reserve_b_underlying: u64,
    pub lp_supply: u64,
    pub fee_config: FeeConfig,
    /// Whole B tokens per whole A token at the reserve ratio.
    pub spot_price: f64,
    pub accrued_pool_fee_a: u64,
    pub accrued_pool_fee_b: u64,
    pub accrued_protocol_fee_a: u64,
    pub accrued_protocol_fee_b: u64,
}

/// Bank summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankInfo {
    pub asset: String,
    pub btoken: String,
    pub decimals: u8,
    pub total_funds: u64,
    pub held: u64,
    pub delegated: u64,
    pub btoken_supply: u64,
    pub exchange_rate: Decimal,
    pub utilization: Decimal,
    pub is_lending_active: bool,
    pub target_utilization_bps: u16,
    pub utilization_buffer_bps: u16,
}
