//! Bank and pool state snapshots.
//!
//! Plain data: the operations live in [`crate::bank`] and [`crate::pool`].
//! A pool names its banks by underlying asset id; it never embeds them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::Decimal;

// ─── Asset ────────────────────────────────────────────────────────────────────

/// Opaque token identifier plus decimal precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub decimals: u8,
}

impl Asset {
    pub fn new(id: impl Into<String>, decimals: u8) -> Self {
        Self { id: id.into(), decimals }
    }
}

// ─── Bank ─────────────────────────────────────────────────────────────────────

/// Underlying asset ⇄ bToken accounting for one asset.
///
/// `total_underlying_held + total_underlying_delegated` backs `btoken_supply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub asset: Asset,
    pub btoken_asset: Asset,
    /// Underlying held directly, available for payouts.
    pub total_underlying_held: u64,
    /// Underlying delegated to the lending market.
    pub total_underlying_delegated: u64,
    pub btoken_supply: u64,
    pub target_utilization_bps: u16,
    pub utilization_buffer_bps: u16,
    pub is_lending_active: bool,
}

// ─── Fees ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Gross swap fee taken from amount_in (e.g. 30 = 0.30 %).
    pub swap_fee_bps: u16,
    /// Share of the gross fee routed to the protocol.
    pub protocol_fee_bps: u16,
}

// ─── Pool ─────────────────────────────────────────────────────────────────────

/// Pricing strategy a pool uses for swaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuoterKind {
    /// x · y = k, with an optional virtual-liquidity `offset` on both reserves.
    ConstantProduct {
        #[serde(default)]
        offset: u64,
    },
    /// Swaps priced off two oracle feeds.
    Oracle { oracle_index_a: u64, oracle_index_b: u64 },
}

/// Two-asset pool whose reserves are bTokens of the two banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub id: String,
    /// Underlying asset id of bank A.
    pub asset_a: String,
    /// Underlying asset id of bank B.
    pub asset_b: String,
    pub quoter: QuoterKind,
    /// Reserves in bToken units.
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub lp_supply: u64,
    pub lp_decimals: u8,
    pub fee_config: FeeConfig,
    /// LP share of swap fees, already folded into the reserves (bTokens).
    #[serde(default)]
    pub accrued_pool_fee_a: u64,
    #[serde(default)]
    pub accrued_pool_fee_b: u64,
    /// Protocol share of swap fees, held outside the reserves (bTokens).
    #[serde(default)]
    pub accrued_protocol_fee_a: u64,
    #[serde(default)]
    pub accrued_protocol_fee_b: u64,
}

// ─── Oracle ───────────────────────────────────────────────────────────────────

/// Price of one whole token, as reported by an oracle feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub oracle_index: u64,
    pub price: Decimal,
    pub publish_time_s: u64,
    #[serde(default)]
    pub confidence_bps: u16,
}

/// Prices for both sides of an oracle pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OraclePrices {
    pub a: OraclePrice,
    pub b: OraclePrice,
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

/// Serialized view of every bank, pool, and known price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub banks: Vec<BankState>,
    #[serde(default)]
    pub pools: Vec<PoolState>,
    #[serde(default)]
    pub prices: Vec<OraclePrice>,
}

impl Snapshot {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_tagged_quoter_and_defaults() {
        let json = r#"{
            "pools": [{
                "id": "usdc-sui",
                "asset_a": "USDC", "asset_b": "SUI",
                "quoter": { "type": "oracle", "oracle_index_a": 0, "oracle_index_b": 1 },
                "reserve_a": 10, "reserve_b": 20, "lp_supply": 14, "lp_decimals": 9,
                "fee_config": { "swap_fee_bps": 30, "protocol_fee_bps": 2000 }
            }],
            "prices": [{ "oracle_index": 0, "price": "1.0001", "publish_time_s": 7 }]
        }"#;
        let snap = Snapshot::from_json(json).unwrap();
        assert!(snap.banks.is_empty());
        assert_eq!(
            snap.pools[0].quoter,
            QuoterKind::Oracle { oracle_index_a: 0, oracle_index_b: 1 }
        );
        assert_eq!(snap.pools[0].accrued_protocol_fee_b, 0);
        assert_eq!(snap.prices[0].price.to_string(), "1.0001");
        assert_eq!(snap.prices[0].confidence_bps, 0);
    }

    #[test]
    fn constant_product_offset_defaults_to_zero() {
        let kind: QuoterKind = serde_json::from_str(r#"{ "type": "constant_product" }"#).unwrap();
        assert_eq!(kind, QuoterKind::ConstantProduct { offset: 0 });
    }
}
