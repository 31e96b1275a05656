//! STEAMM Rust SDK
//!
//! Bank-backed AMM quoting and bToken accounting. Pools hold their reserves
//! as bTokens of two banks; each bank converts between the underlying asset
//! and its bToken and may lend idle funds out for yield. Swaps are priced by
//! a constant-product or an oracle quoter.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use steamm_sdk::{
//!     Asset, CreatePoolParams, DepositParams, Engine, EngineConfig, FeeConfig, NoLending,
//!     QuoterKind, StaticOracle, SwapParams,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new(EngineConfig::default(), StaticOracle::default(), NoLending)?;
//!     engine.register_bank(Asset::new("USDC", 6), Asset::new("bUSDC", 6)).await?;
//!     engine.register_bank(Asset::new("SUI", 9), Asset::new("bSUI", 9)).await?;
//!
//!     engine.create_pool(CreatePoolParams {
//!         id:          "usdc-sui".into(),
//!         asset_a:     "USDC".into(),
//!         asset_b:     "SUI".into(),
//!         quoter:      QuoterKind::ConstantProduct { offset: 0 },
//!         fee_config:  FeeConfig::new(30, 2_000)?,
//!         lp_decimals: 9,
//!         lp_supply:   0,
//!     }).await?;
//!
//!     engine.deposit(&DepositParams {
//!         pool_id: "usdc-sui".into(), max_a: 1_000_000_000, max_b: 500_000_000_000, min_lp_out: 0,
//!     }).await?;
//!
//!     let quote = engine.quote_swap(&SwapParams {
//!         pool_id: "usdc-sui".into(), a2b: true, amount_in: 10_000_000, min_amount_out: 0,
//!     }).await?;
//!     println!("out: {}  fee: {}", quote.amount_out, quote.fee);
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`Engine::register_bank`] | Add a bank for an underlying asset |
//! | [`Engine::create_pool`] | Create a constant-product or oracle pool |
//! | [`Engine::quote_swap`] | Fee, bToken and underlying breakdown of a swap |
//! | [`Engine::quote_deposit`] | Ratio-pinned deposit amounts and LP minted |
//! | [`Engine::quote_redeem`] | Pro-rata withdrawal for an LP amount |
//! | [`Engine::swap`] / [`Engine::deposit`] / [`Engine::redeem`] | Quote and commit |
//! | [`Engine::rebalance_bank`] | Move bank funds toward target utilization |
//! | [`Engine::pool_info`] / [`Engine::bank`] | Pool and bank summaries |

pub mod bank;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod external;
pub mod fees;
pub mod math;
pub mod pool;
pub mod quoter;
pub mod state;
pub mod types;

pub use bank::RebalanceOutcome;
pub use config::EngineConfig;
pub use engine::{Engine, Ledger};
pub use error::{Error, ErrorCategory, Result};
pub use external::{InMemoryLendingMarket, LendingMarket, LendingReceipt, NoLending, PriceOracle, StaticOracle};
pub use fees::{compute_swap_fee, split_fee, validate_swap_fee_tier, SwapFee};
pub use math::{Decimal, Rounding};
pub use quoter::{Quoter, Reserves};
pub use state::*;
pub use types::*;
