//! Pool orchestration.
//!
//! Every request follows the same shape: convert underlying amounts into
//! bTokens through one bank, quote in bToken space, convert the result back
//! through the other bank. Apply operations run the same quote against
//! copies of `(pool, bank A, bank B)` and write them back only once every
//! step has succeeded.

use log::{debug, info};
use primitive_types::U256;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fees::validate_swap_fee_tier;
use crate::math::{div_wide, pow10, Decimal, Rounding};
use crate::quoter::{ConstantProduct, OraclePricing, Quoter, Reserves};
use crate::state::{BankState, OraclePrices, PoolState, QuoterKind};
use crate::types::{CreatePoolParams, DepositQuote, PoolInfo, ProtocolFees, RedeemQuote, SwapQuote};

impl PoolState {
    /// Validate creation parameters and return an empty pool.
    pub fn create(params: CreatePoolParams, config: &EngineConfig) -> Result<Self> {
        if params.lp_supply != 0 {
            return Err(Error::LpSupplyMustBeZero);
        }
        let pool = Self {
            id: params.id,
            asset_a: params.asset_a,
            asset_b: params.asset_b,
            quoter: params.quoter,
            reserve_a: 0,
            reserve_b: 0,
            lp_supply: 0,
            lp_decimals: params.lp_decimals,
            fee_config: params.fee_config,
            accrued_pool_fee_a: 0,
            accrued_pool_fee_b: 0,
            accrued_protocol_fee_a: 0,
            accrued_protocol_fee_b: 0,
        };
        pool.validate(config)?;

        info!(
            "pool {} created: {}/{} quoter={:?} fee={}bps",
            pool.id, pool.asset_a, pool.asset_b, pool.quoter, pool.fee_config.swap_fee_bps
        );
        Ok(pool)
    }

    /// Parameter checks shared by [`PoolState::create`] and snapshot loading.
    pub fn validate(&self, config: &EngineConfig) -> Result<()> {
        if self.asset_a == self.asset_b {
            return Err(Error::TypeAandBDuplicated);
        }
        if self.lp_decimals != config.lp_decimals {
            return Err(Error::InvalidLpDecimals {
                decimals: self.lp_decimals,
                expected: config.lp_decimals,
            });
        }
        self.fee_config.validate()?;
        if let QuoterKind::ConstantProduct { .. } = self.quoter {
            validate_swap_fee_tier(self.fee_config.swap_fee_bps, config)?;
        }
        Ok(())
    }

    pub fn reserves(&self) -> Reserves {
        Reserves {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            lp_supply: self.lp_supply,
        }
    }

    pub fn is_oracle(&self) -> bool {
        matches!(self.quoter, QuoterKind::Oracle { .. })
    }

    /// Oracle indices `(a, b)` for oracle pools.
    pub fn oracle_indices(&self) -> Option<(u64, u64)> {
        match self.quoter {
            QuoterKind::Oracle { oracle_index_a, oracle_index_b } => Some((oracle_index_a, oracle_index_b)),
            QuoterKind::ConstantProduct { .. } => None,
        }
    }

    /// Build the quoter for this pool's variant.
    ///
    /// Oracle pools need `prices`, whose indices must match the pool's. Each
    /// price is scaled by its bank's exchange rate so the quoter can work in
    /// bToken units directly.
    pub fn quoter(
        &self,
        bank_a: &BankState,
        bank_b: &BankState,
        prices: Option<&OraclePrices>,
    ) -> Result<Quoter> {
        match self.quoter {
            QuoterKind::ConstantProduct { offset } => {
                Ok(Quoter::ConstantProduct(ConstantProduct { offset }))
            }
            QuoterKind::Oracle { oracle_index_a, oracle_index_b } => {
                let prices = prices.ok_or_else(|| Error::OracleUnavailable {
                    index: oracle_index_a,
                    reason: "no prices supplied".into(),
                })?;
                for (expected, actual) in [
                    (oracle_index_a, prices.a.oracle_index),
                    (oracle_index_b, prices.b.oracle_index),
                ] {
                    if expected != actual {
                        return Err(Error::InvalidOracleIndex { expected, actual });
                    }
                }
                self.check_banks(bank_a, bank_b)?;
                Ok(Quoter::Oracle(OraclePricing {
                    price_a: prices.a.price.checked_mul(bank_a.exchange_rate()?, Rounding::Down)?,
                    price_b: prices.b.price.checked_mul(bank_b.exchange_rate()?, Rounding::Down)?,
                    decimals_a: bank_a.asset.decimals,
                    decimals_b: bank_b.asset.decimals,
                }))
            }
        }
    }

    /// Constant-product quoter over the raw reserves, used when an oracle
    /// pool's prices are unavailable.
    pub fn reserve_ratio_quoter(&self) -> Quoter {
        Quoter::ConstantProduct(ConstantProduct::default())
    }

    fn check_banks(&self, bank_a: &BankState, bank_b: &BankState) -> Result<()> {
        if bank_a.asset.id != self.asset_a {
            return Err(Error::BankNotFound(self.asset_a.clone()));
        }
        if bank_b.asset.id != self.asset_b {
            return Err(Error::BankNotFound(self.asset_b.clone()));
        }
        Ok(())
    }

    // ── Quotes ────────────────────────────────────────────────────────────────

    /// Quote a swap of `amount_in` underlying units.
    pub fn quote_swap(
        &self,
        bank_a: &BankState,
        bank_b: &BankState,
        quoter: &Quoter,
        a2b: bool,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<SwapQuote> {
        self.check_banks(bank_a, bank_b)?;
        if amount_in == 0 {
            return Err(Error::EmptyCoins);
        }
        let (bank_in, bank_out) = if a2b { (bank_a, bank_b) } else { (bank_b, bank_a) };

        let amount_in_btokens = bank_in.to_btokens(amount_in, Rounding::Down)?;
        let raw = quoter.quote_swap(&self.reserves(), &self.fee_config, a2b, amount_in_btokens)?;

        let amount_out = bank_out.to_underlying(raw.amount_out, Rounding::Down)?;
        if amount_out == 0 {
            return Err(Error::SwapOutputAmountIsZero);
        }
        if amount_out < min_amount_out {
            return Err(Error::SwapExceedsSlippage { amount_out, min: min_amount_out });
        }

        debug!("pool {}: swap quote {} -> {} (a2b={})", self.id, amount_in, amount_out, a2b);
        Ok(SwapQuote {
            pool_id: self.id.clone(),
            quoter: quoter.name(),
            a2b,
            amount_in,
            amount_out,
            amount_in_btokens,
            amount_out_btokens: raw.amount_out,
            fee: raw.fee.gross,
            lp_fee: raw.fee.lp,
            protocol_fee: raw.fee.protocol,
            new_reserve_in: raw.new_reserve_in,
            new_reserve_out: raw.new_reserve_out,
            effective_rate: amount_out as f64 / amount_in as f64,
        })
    }

    /// Quote a deposit of at most `max_a` / `max_b` underlying units.
    pub fn quote_deposit(
        &self,
        bank_a: &BankState,
        bank_b: &BankState,
        quoter: &Quoter,
        max_a: u64,
        max_b: u64,
        min_lp_out: u64,
    ) -> Result<DepositQuote> {
        self.check_banks(bank_a, bank_b)?;
        let max_a_btokens = bank_a.to_btokens(max_a, Rounding::Down)?;
        let max_b_btokens = bank_b.to_btokens(max_b, Rounding::Down)?;

        let raw = quoter.quote_deposit(&self.reserves(), max_a_btokens, max_b_btokens)?;
        if raw.lp_tokens_minted == 0 {
            return Err(Error::ZeroLpTokensMinted);
        }
        if raw.lp_tokens_minted < min_lp_out {
            return Err(Error::DepositSlippageExceeded {
                lp_minted: raw.lp_tokens_minted,
                min: min_lp_out,
            });
        }

        let quote = DepositQuote {
            pool_id: self.id.clone(),
            deposit_a: bank_a.to_underlying(raw.deposit_a, Rounding::Up)?,
            deposit_b: bank_b.to_underlying(raw.deposit_b, Rounding::Up)?,
            deposit_a_btokens: raw.deposit_a,
            deposit_b_btokens: raw.deposit_b,
            lp_tokens_minted: raw.lp_tokens_minted,
        };
        debug!("pool {}: deposit quote {:?}", self.id, quote);
        Ok(quote)
    }

    /// Quote burning `lp_tokens`.
    pub fn quote_redeem(
        &self,
        bank_a: &BankState,
        bank_b: &BankState,
        quoter: &Quoter,
        lp_tokens: u64,
        min_a: u64,
        min_b: u64,
    ) -> Result<RedeemQuote> {
        self.check_banks(bank_a, bank_b)?;
        let raw = quoter.quote_redeem(&self.reserves(), lp_tokens)?;

        let withdraw_a = bank_a.to_underlying(raw.withdraw_a, Rounding::Down)?;
        let withdraw_b = bank_b.to_underlying(raw.withdraw_b, Rounding::Down)?;
        if withdraw_a < min_a {
            return Err(Error::RedeemSlippageAExceeded { amount: withdraw_a, min: min_a });
        }
        if withdraw_b < min_b {
            return Err(Error::RedeemSlippageBExceeded { amount: withdraw_b, min: min_b });
        }

        debug!("pool {}: redeem quote lp={} -> ({}, {})", self.id, lp_tokens, withdraw_a, withdraw_b);
        Ok(RedeemQuote {
            pool_id: self.id.clone(),
            lp_tokens_burned: lp_tokens,
            withdraw_a,
            withdraw_b,
            withdraw_a_btokens: raw.withdraw_a,
            withdraw_b_btokens: raw.withdraw_b,
        })
    }

    // ── Apply ─────────────────────────────────────────────────────────────────

    /// Quote and commit a swap: mint the input in its bank, move the reserves,
    /// then burn the output from the other bank.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_swap(
        &mut self,
        bank_a: &mut BankState,
        bank_b: &mut BankState,
        quoter: &Quoter,
        a2b: bool,
        amount_in: u64,
        min_amount_out: u64,
        config: &EngineConfig,
    ) -> Result<SwapQuote> {
        let mut quote = self.quote_swap(bank_a, bank_b, quoter, a2b, amount_in, min_amount_out)?;

        let mut pool = self.clone();
        let mut next_a = bank_a.clone();
        let mut next_b = bank_b.clone();
        let (bank_in, bank_out) = if a2b { (&mut next_a, &mut next_b) } else { (&mut next_b, &mut next_a) };

        bank_in.mint_btokens(quote.amount_in, config)?;
        let reserve_out_before = if a2b { pool.reserve_b } else { pool.reserve_a };
        quote.amount_out = bank_out.burn_btokens(quote.amount_out_btokens, reserve_out_before)?;

        if a2b {
            pool.reserve_a = quote.new_reserve_in;
            pool.reserve_b = quote.new_reserve_out;
            pool.accrued_pool_fee_a = add(pool.accrued_pool_fee_a, quote.lp_fee)?;
            pool.accrued_protocol_fee_a = add(pool.accrued_protocol_fee_a, quote.protocol_fee)?;
        } else {
            pool.reserve_b = quote.new_reserve_in;
            pool.reserve_a = quote.new_reserve_out;
            pool.accrued_pool_fee_b = add(pool.accrued_pool_fee_b, quote.lp_fee)?;
            pool.accrued_protocol_fee_b = add(pool.accrued_protocol_fee_b, quote.protocol_fee)?;
        }

        *self = pool;
        *bank_a = next_a;
        *bank_b = next_b;
        info!(
            "pool {}: swapped {} -> {} (a2b={}, fee={})",
            self.id, quote.amount_in, quote.amount_out, a2b, quote.fee
        );
        Ok(quote)
    }

    /// Quote and commit a deposit. Reserves grow by the bTokens the banks
    /// actually mint for the underlying owed.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_deposit(
        &mut self,
        bank_a: &mut BankState,
        bank_b: &mut BankState,
        quoter: &Quoter,
        max_a: u64,
        max_b: u64,
        min_lp_out: u64,
        config: &EngineConfig,
    ) -> Result<DepositQuote> {
        let mut quote = self.quote_deposit(bank_a, bank_b, quoter, max_a, max_b, min_lp_out)?;

        let mut pool = self.clone();
        let mut next_a = bank_a.clone();
        let mut next_b = bank_b.clone();

        quote.deposit_a_btokens = next_a.mint_btokens(quote.deposit_a, config)?;
        quote.deposit_b_btokens = next_b.mint_btokens(quote.deposit_b, config)?;
        pool.reserve_a = add(pool.reserve_a, quote.deposit_a_btokens)?;
        pool.reserve_b = add(pool.reserve_b, quote.deposit_b_btokens)?;
        pool.lp_supply = add(pool.lp_supply, quote.lp_tokens_minted)?;

        *self = pool;
        *bank_a = next_a;
        *bank_b = next_b;
        info!(
            "pool {}: deposited ({}, {}) for {} LP",
            self.id, quote.deposit_a, quote.deposit_b, quote.lp_tokens_minted
        );
        Ok(quote)
    }

    /// Quote and commit a redemption. A leg that rounds to zero bTokens skips
    /// its bank burn.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_redeem(
        &mut self,
        bank_a: &mut BankState,
        bank_b: &mut BankState,
        quoter: &Quoter,
        lp_tokens: u64,
        min_a: u64,
        min_b: u64,
    ) -> Result<RedeemQuote> {
        let mut quote = self.quote_redeem(bank_a, bank_b, quoter, lp_tokens, min_a, min_b)?;

        let mut pool = self.clone();
        let mut next_a = bank_a.clone();
        let mut next_b = bank_b.clone();

        if quote.withdraw_a_btokens > 0 {
            quote.withdraw_a = next_a.burn_btokens(quote.withdraw_a_btokens, pool.reserve_a)?;
        }
        if quote.withdraw_b_btokens > 0 {
            quote.withdraw_b = next_b.burn_btokens(quote.withdraw_b_btokens, pool.reserve_b)?;
        }
        pool.reserve_a -= quote.withdraw_a_btokens;
        pool.reserve_b -= quote.withdraw_b_btokens;
        pool.lp_supply -= lp_tokens;

        *self = pool;
        *bank_a = next_a;
        *bank_b = next_b;
        info!(
            "pool {}: redeemed {} LP for ({}, {})",
            self.id, lp_tokens, quote.withdraw_a, quote.withdraw_b
        );
        Ok(quote)
    }

    /// Hand out and reset the accrued protocol fees.
    pub fn collect_protocol_fees(&mut self) -> ProtocolFees {
        let fees = ProtocolFees {
            fee_a: std::mem::take(&mut self.accrued_protocol_fee_a),
            fee_b: std::mem::take(&mut self.accrued_protocol_fee_b),
        };
        info!("pool {}: collected protocol fees {:?}", self.id, fees);
        fees
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    pub fn info(&self, bank_a: &BankState, bank_b: &BankState) -> Result<PoolInfo> {
        self.check_banks(bank_a, bank_b)?;
        let reserve_a_underlying = bank_a.to_underlying(self.reserve_a, Rounding::Down)?;
        let reserve_b_underlying = bank_b.to_underlying(self.reserve_b, Rounding::Down)?;

        let spot_price = if reserve_a_underlying == 0 {
            0.0
        } else {
            let whole_a = reserve_a_underlying as f64 / 10f64.powi(bank_a.asset.decimals as i32);
            let whole_b = reserve_b_underlying as f64 / 10f64.powi(bank_b.asset.decimals as i32);
            whole_b / whole_a
        };

        Ok(PoolInfo {
            id: self.id.clone(),
            asset_a: self.asset_a.clone(),
            asset_b: self.asset_b.clone(),
            quoter: self.quoter.clone(),
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            reserve_a_underlying,
            reserve_b_underlying,
            lp_supply: self.lp_supply,
            fee_config: self.fee_config,
            spot_price,
            accrued_pool_fee_a: self.accrued_pool_fee_a,
            accrued_pool_fee_b: self.accrued_pool_fee_b,
            accrued_protocol_fee_a: self.accrued_protocol_fee_a,
            accrued_protocol_fee_b: self.accrued_protocol_fee_b,
        })
    }

    /// Value of redeeming `lp_tokens` at whole-token prices `price_a` / `price_b`.
    pub fn lp_valuation(
        &self,
        bank_a: &BankState,
        bank_b: &BankState,
        lp_tokens: u64,
        price_a: Decimal,
        price_b: Decimal,
    ) -> Result<Decimal> {
        let quoter = self.reserve_ratio_quoter();
        let redeem = self.quote_redeem(bank_a, bank_b, &quoter, lp_tokens, 0, 0)?;

        let value = |amount: u64, price: Decimal, decimals: u8| -> Result<Decimal> {
            let numerator = U256::from(amount) * U256::from(price.raw());
            Ok(Decimal::from_raw(div_wide(numerator, pow10(decimals)?, Rounding::Down)?))
        };
        value(redeem.withdraw_a, price_a, bank_a.asset.decimals)?
            .checked_add(value(redeem.withdraw_b, price_b, bank_b.asset.decimals)?)
    }
}

fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(Error::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Asset, FeeConfig, OraclePrice};

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn bank(id: &str, decimals: u8) -> BankState {
        BankState::new(Asset::new(id, decimals), Asset::new(format!("b{id}"), decimals))
    }

    fn params(quoter: QuoterKind, swap_fee_bps: u16) -> CreatePoolParams {
        CreatePoolParams {
            id: "usdc-sui".into(),
            asset_a: "USDC".into(),
            asset_b: "SUI".into(),
            quoter,
            fee_config: FeeConfig { swap_fee_bps, protocol_fee_bps: 0 },
            lp_decimals: 9,
            lp_supply: 0,
        }
    }

    fn cpmm() -> QuoterKind {
        QuoterKind::ConstantProduct { offset: 0 }
    }

    /// Pool seeded with 1_000_000 / 1_000_000 through fresh banks.
    fn seeded() -> (PoolState, BankState, BankState) {
        let mut pool = PoolState::create(params(cpmm(), 30), &cfg()).unwrap();
        let (mut a, mut b) = (bank("USDC", 6), bank("SUI", 9));
        let q = pool.quoter(&a, &b, None).unwrap();
        pool.apply_deposit(&mut a, &mut b, &q, 1_000_000, 1_000_000, 0, &cfg()).unwrap();
        (pool, a, b)
    }

    #[test]
    fn creation_checks() {
        let mut p = params(cpmm(), 30);
        p.asset_b = "USDC".into();
        assert!(matches!(PoolState::create(p, &cfg()), Err(Error::TypeAandBDuplicated)));

        let mut p = params(cpmm(), 30);
        p.lp_decimals = 6;
        assert!(matches!(
            PoolState::create(p, &cfg()),
            Err(Error::InvalidLpDecimals { decimals: 6, expected: 9 })
        ));

        let mut p = params(cpmm(), 30);
        p.lp_supply = 1;
        assert!(matches!(PoolState::create(p, &cfg()), Err(Error::LpSupplyMustBeZero)));

        assert!(matches!(
            PoolState::create(params(cpmm(), 25), &cfg()),
            Err(Error::InvalidSwapFeeBpsType(25))
        ));

        // oracle pools are not bound to the fee tiers
        let oracle = QuoterKind::Oracle { oracle_index_a: 0, oracle_index_b: 1 };
        PoolState::create(params(oracle, 25), &cfg()).unwrap();
    }

    #[test]
    fn first_deposit_seeds_pool_and_banks() {
        let (pool, a, b) = seeded();
        assert_eq!((pool.reserve_a, pool.reserve_b, pool.lp_supply), (1_000_000, 1_000_000, 1_000_000));
        assert_eq!(a.btoken_supply, 1_000_000);
        assert_eq!(b.total_underlying_held, 1_000_000);
    }

    #[test]
    fn swap_commits_reserves_fees_and_banks() {
        let (mut pool, mut a, mut b) = seeded();
        let q = pool.quoter(&a, &b, None).unwrap();
        let quote = pool.apply_swap(&mut a, &mut b, &q, true, 10_000, 9_000, &cfg()).unwrap();

        assert_eq!(quote.amount_out, 9_871);
        assert_eq!(quote.fee, 30);
        assert_eq!((pool.reserve_a, pool.reserve_b), (1_010_000, 990_129));
        assert_eq!(pool.accrued_pool_fee_a, 30);
        assert_eq!(a.total_underlying_held, 1_010_000);
        assert_eq!(b.total_underlying_held, 990_129);
        assert_eq!(b.btoken_supply, 990_129);
    }

    #[test]
    fn swap_slippage_leaves_state_untouched() {
        let (mut pool, mut a, mut b) = seeded();
        let before = (pool.clone(), a.clone(), b.clone());
        let q = pool.quoter(&a, &b, None).unwrap();

        let err = pool.apply_swap(&mut a, &mut b, &q, true, 10_000, 9_900, &cfg()).unwrap_err();
        assert!(matches!(err, Error::SwapExceedsSlippage { amount_out: 9_871, min: 9_900 }));
        assert_eq!((pool, a, b), before);
    }

    #[test]
    fn failed_payout_rolls_back_input_mint() {
        let (mut pool, mut a, mut b) = seeded();
        // all of B's funds are out on loan
        b.total_underlying_delegated = b.total_underlying_held;
        b.total_underlying_held = 0;
        let before = (pool.clone(), a.clone(), b.clone());
        let q = pool.quoter(&a, &b, None).unwrap();

        let err = pool.apply_swap(&mut a, &mut b, &q, true, 10_000, 0, &cfg()).unwrap_err();
        assert!(matches!(err, Error::InsufficientBankFunds { .. }));
        assert_eq!((pool, a, b), before);
    }

    #[test]
    fn deposit_then_redeem_never_returns_more() {
        let (mut pool, mut a, mut b) = seeded();
        let q = pool.quoter(&a, &b, None).unwrap();
        pool.apply_swap(&mut a, &mut b, &q, true, 10_000, 0, &cfg()).unwrap();

        let dep = pool.apply_deposit(&mut a, &mut b, &q, 50_000, 80_000, 0, &cfg()).unwrap();
        assert!(dep.deposit_a <= 50_000 && dep.deposit_b <= 80_000);
        let red = pool.apply_redeem(&mut a, &mut b, &q, dep.lp_tokens_minted, 0, 0).unwrap();
        assert!(red.withdraw_a <= dep.deposit_a);
        assert!(red.withdraw_b <= dep.deposit_b);
    }

    #[test]
    fn deposit_and_redeem_slippage() {
        let (pool, a, b) = seeded();
        let q = pool.quoter(&a, &b, None).unwrap();
        assert!(matches!(
            pool.quote_deposit(&a, &b, &q, 1_000, 1_000, 1_001),
            Err(Error::DepositSlippageExceeded { lp_minted: 1_000, min: 1_001 })
        ));
        assert!(matches!(
            pool.quote_redeem(&a, &b, &q, 1_000, 1_001, 0),
            Err(Error::RedeemSlippageAExceeded { amount: 1_000, min: 1_001 })
        ));
        assert!(matches!(
            pool.quote_redeem(&a, &b, &q, 1_000, 0, 1_001),
            Err(Error::RedeemSlippageBExceeded { amount: 1_000, min: 1_001 })
        ));
    }

    #[test]
    fn full_redeem_empties_pool() {
        let (mut pool, mut a, mut b) = seeded();
        let q = pool.quoter(&a, &b, None).unwrap();
        let red = pool.apply_redeem(&mut a, &mut b, &q, 1_000_000, 0, 0).unwrap();
        assert_eq!((red.withdraw_a, red.withdraw_b), (1_000_000, 1_000_000));
        assert_eq!((pool.reserve_a, pool.reserve_b, pool.lp_supply), (0, 0, 0));
        assert_eq!(a.btoken_supply, 0);
    }

    #[test]
    fn oracle_quoter_checks_indices_and_scales_by_exchange_rate() {
        let oracle = QuoterKind::Oracle { oracle_index_a: 0, oracle_index_b: 1 };
        let pool = PoolState::create(params(oracle, 30), &cfg()).unwrap();
        let mut a = bank("USDC", 6);
        a.mint_btokens(1_000_000, &cfg()).unwrap();
        a.total_underlying_held += 100_000; // rate 1.1
        let b = bank("SUI", 9);

        let price = |oracle_index, p: u64| OraclePrice {
            oracle_index,
            price: Decimal::from_integer(p),
            publish_time_s: 0,
            confidence_bps: 0,
        };

        let swapped = OraclePrices { a: price(1, 1), b: price(0, 2) };
        assert!(matches!(
            pool.quoter(&a, &b, Some(&swapped)),
            Err(Error::InvalidOracleIndex { expected: 0, actual: 1 })
        ));
        assert!(matches!(pool.quoter(&a, &b, None), Err(Error::OracleUnavailable { index: 0, .. })));

        let prices = OraclePrices { a: price(0, 1), b: price(1, 2) };
        match pool.quoter(&a, &b, Some(&prices)).unwrap() {
            Quoter::Oracle(p) => {
                assert_eq!(p.price_a.to_string(), "1.1");
                assert_eq!(p.price_b.to_string(), "2");
                assert_eq!((p.decimals_a, p.decimals_b), (6, 9));
            }
            other => panic!("unexpected quoter {other:?}"),
        }
    }

    #[test]
    fn mismatched_bank_is_rejected() {
        let (pool, a, _) = seeded();
        let stray = bank("ETH", 8);
        let q = pool.reserve_ratio_quoter();
        assert!(matches!(
            pool.quote_swap(&a, &stray, &q, true, 10, 0),
            Err(Error::BankNotFound(id)) if id == "SUI"
        ));
    }

    #[test]
    fn protocol_fees_accrue_and_collect() {
        let mut p = params(cpmm(), 100);
        p.fee_config.protocol_fee_bps = 5_000;
        let mut pool = PoolState::create(p, &cfg()).unwrap();
        let (mut a, mut b) = (bank("USDC", 6), bank("SUI", 9));
        let q = pool.quoter(&a, &b, None).unwrap();
        pool.apply_deposit(&mut a, &mut b, &q, 1_000_000, 1_000_000, 0, &cfg()).unwrap();

        pool.apply_swap(&mut a, &mut b, &q, false, 10_000, 0, &cfg()).unwrap();
        assert_eq!(pool.reserve_b, 1_000_000 + 10_000 - 50);
        assert_eq!(pool.accrued_protocol_fee_b, 50);

        assert_eq!(pool.collect_protocol_fees(), ProtocolFees { fee_a: 0, fee_b: 50 });
        assert_eq!(pool.collect_protocol_fees(), ProtocolFees::default());
    }

    #[test]
    fn info_reports_whole_token_spot_price() {
        let (pool, a, b) = seeded();
        let info = pool.info(&a, &b).unwrap();
        // 1 USDC (6 dp) against 0.001 SUI (9 dp)
        assert!((info.spot_price - 0.001).abs() < 1e-12);
        assert_eq!(info.reserve_b_underlying, 1_000_000);
    }

    #[test]
    fn lp_valuation_at_prices() {
        let (pool, a, b) = seeded();
        let v = pool
            .lp_valuation(&a, &b, 500_000, Decimal::ONE, Decimal::from_integer(1_000))
            .unwrap();
        // 0.5 USDC + 0.0005 SUI * 1000
        assert_eq!(v.to_string(), "1");
    }
}
