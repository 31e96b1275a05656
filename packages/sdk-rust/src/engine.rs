//! [`Engine`]: the bank/pool ledger behind a single-writer lock.
//!
//! Quotes take the lock long enough to copy what they read. Applies hold it
//! for the whole check-and-commit, so one pool/bank transition is visible
//! either entirely or not at all.

use std::collections::HashMap;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::bank::RebalanceOutcome;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::external::{LendingMarket, PriceOracle};
use crate::quoter::Quoter;
use crate::state::{Asset, BankState, OraclePrices, PoolState, Snapshot};
use crate::types::{
    BankInfo, CreatePoolParams, DepositParams, DepositQuote, PoolInfo, ProtocolFees, RedeemParams,
    RedeemQuote, SwapParams, SwapQuote,
};

// ─── Ledger ───────────────────────────────────────────────────────────────────

/// Banks keyed by underlying asset id, pools keyed by pool id.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub banks: HashMap<String, BankState>,
    pub pools: HashMap<String, PoolState>,
}

impl Ledger {
    pub fn bank(&self, asset_id: &str) -> Result<&BankState> {
        self.banks
            .get(asset_id)
            .ok_or_else(|| Error::BankNotFound(asset_id.to_string()))
    }

    pub fn pool(&self, pool_id: &str) -> Result<&PoolState> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| Error::PoolNotFound(pool_id.to_string()))
    }

    /// Copies of a pool and its two banks.
    fn triple(&self, pool_id: &str) -> Result<(PoolState, BankState, BankState)> {
        let pool = self.pool(pool_id)?;
        let bank_a = self.bank(&pool.asset_a)?;
        let bank_b = self.bank(&pool.asset_b)?;
        Ok((pool.clone(), bank_a.clone(), bank_b.clone()))
    }

    fn commit(&mut self, pool: PoolState, bank_a: BankState, bank_b: BankState) {
        self.banks.insert(bank_a.asset.id.clone(), bank_a);
        self.banks.insert(bank_b.asset.id.clone(), bank_b);
        self.pools.insert(pool.id.clone(), pool);
    }

    fn insert_bank(&mut self, bank: BankState) -> Result<()> {
        if self.banks.contains_key(&bank.asset.id) {
            return Err(Error::BankAlreadyExists(bank.asset.id));
        }
        self.banks.insert(bank.asset.id.clone(), bank);
        Ok(())
    }

    fn insert_pool(&mut self, pool: PoolState, config: &EngineConfig) -> Result<()> {
        if self.pools.contains_key(&pool.id) {
            return Err(Error::PoolAlreadyExists(pool.id));
        }
        pool.validate(config)?;
        self.bank(&pool.asset_a)?;
        self.bank(&pool.asset_b)?;
        self.pools.insert(pool.id.clone(), pool);
        Ok(())
    }
}

struct Inner<L> {
    ledger: Ledger,
    lending: L,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

pub struct Engine<O, L> {
    config: EngineConfig,
    oracle: O,
    inner: Mutex<Inner<L>>,
}

impl<O: PriceOracle, L: LendingMarket> Engine<O, L> {
    pub fn new(config: EngineConfig, oracle: O, lending: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle,
            inner: Mutex::new(Inner { ledger: Ledger::default(), lending }),
        })
    }

    /// Load banks and pools from a snapshot. Snapshot prices are ignored here;
    /// feed them to the oracle instead.
    pub fn from_snapshot(config: EngineConfig, snapshot: Snapshot, oracle: O, lending: L) -> Result<Self> {
        config.validate()?;
        let mut ledger = Ledger::default();
        for bank in snapshot.banks {
            ledger.insert_bank(bank)?;
        }
        for pool in snapshot.pools {
            ledger.insert_pool(pool, &config)?;
        }
        info!(
            "engine loaded {} banks and {} pools",
            ledger.banks.len(),
            ledger.pools.len()
        );
        Ok(Self {
            config,
            oracle,
            inner: Mutex::new(Inner { ledger, lending }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Setup ─────────────────────────────────────────────────────────────────

    pub async fn register_bank(&self, asset: Asset, btoken_asset: Asset) -> Result<BankInfo> {
        let bank = BankState::new(asset, btoken_asset);
        let info = bank.info()?;
        self.inner.lock().await.ledger.insert_bank(bank)?;
        info!("registered bank {}", info.asset);
        Ok(info)
    }

    pub async fn create_pool(&self, params: CreatePoolParams) -> Result<PoolInfo> {
        let pool = PoolState::create(params, &self.config)?;
        let mut inner = self.inner.lock().await;
        let ledger = &mut inner.ledger;
        let info = pool.info(ledger.bank(&pool.asset_a)?, ledger.bank(&pool.asset_b)?)?;
        ledger.insert_pool(pool, &self.config)?;
        Ok(info)
    }

    pub async fn init_lending(
        &self,
        asset_id: &str,
        target_utilization_bps: u16,
        utilization_buffer_bps: u16,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut bank = inner.ledger.bank(asset_id)?.clone();
        bank.init_lending(target_utilization_bps, utilization_buffer_bps)?;
        inner.ledger.banks.insert(bank.asset.id.clone(), bank);
        Ok(())
    }

    pub async fn rebalance_bank(&self, asset_id: &str) -> Result<RebalanceOutcome> {
        let mut guard = self.inner.lock().await;
        let Inner { ledger, lending } = &mut *guard;
        let mut bank = ledger.bank(asset_id)?.clone();
        let outcome = bank.rebalance(lending)?;
        ledger.banks.insert(bank.asset.id.clone(), bank);
        Ok(outcome)
    }

    /// Run `f` against the lending market under the ledger lock.
    pub async fn with_lending_market<R>(&self, f: impl FnOnce(&mut L) -> R) -> R {
        f(&mut self.inner.lock().await.lending)
    }

    /// Record the lending market's current balance for a bank.
    pub async fn compound_interest(&self, asset_id: &str, delegated_balance_now: u64) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let bank = inner
            .ledger
            .banks
            .get_mut(asset_id)
            .ok_or_else(|| Error::BankNotFound(asset_id.to_string()))?;
        Ok(bank.compound_interest(delegated_balance_now))
    }

    // ── Quotes ────────────────────────────────────────────────────────────────

    pub async fn quote_swap(&self, params: &SwapParams) -> Result<SwapQuote> {
        let (pool, bank_a, bank_b) = self.inner.lock().await.ledger.triple(&params.pool_id)?;
        let quoter = self.resolve_quoter(&pool, &bank_a, &bank_b)?;
        pool.quote_swap(&bank_a, &bank_b, &quoter, params.a2b, params.amount_in, params.min_amount_out)
    }

    pub async fn quote_deposit(&self, params: &DepositParams) -> Result<DepositQuote> {
        let (pool, bank_a, bank_b) = self.inner.lock().await.ledger.triple(&params.pool_id)?;
        let quoter = pool.reserve_ratio_quoter();
        pool.quote_deposit(&bank_a, &bank_b, &quoter, params.max_a, params.max_b, params.min_lp_out)
    }

    pub async fn quote_redeem(&self, params: &RedeemParams) -> Result<RedeemQuote> {
        let (pool, bank_a, bank_b) = self.inner.lock().await.ledger.triple(&params.pool_id)?;
        let quoter = pool.reserve_ratio_quoter();
        pool.quote_redeem(&bank_a, &bank_b, &quoter, params.lp_tokens, params.min_a, params.min_b)
    }

    // ── Apply ─────────────────────────────────────────────────────────────────

    /// Swap and commit.
    ///
    /// Funds the paying bank needs are pulled from the lending market first
    /// and returned to it if the swap is then rejected.
    pub async fn swap(&self, params: &SwapParams) -> Result<SwapQuote> {
        let mut guard = self.inner.lock().await;
        let Inner { ledger, lending } = &mut *guard;
        let (mut pool, mut bank_a, mut bank_b) = ledger.triple(&params.pool_id)?;
        let quoter = self.resolve_quoter(&pool, &bank_a, &bank_b)?;

        let quote = pool.quote_swap(
            &bank_a,
            &bank_b,
            &quoter,
            params.a2b,
            params.amount_in,
            params.min_amount_out,
        )?;
        let paying = if params.a2b { &mut bank_b } else { &mut bank_a };
        let withdrawals = prepare_payouts(ledger, lending, &mut [(paying, quote.amount_out)])?;

        let applied = pool.apply_swap(
            &mut bank_a,
            &mut bank_b,
            &quoter,
            params.a2b,
            params.amount_in,
            params.min_amount_out,
            &self.config,
        );
        match applied {
            Ok(quote) => {
                ledger.commit(pool, bank_a, bank_b);
                Ok(quote)
            }
            Err(err) => {
                undo_withdrawals(ledger, lending, withdrawals, &[bank_a, bank_b]);
                Err(err)
            }
        }
    }

    pub async fn deposit(&self, params: &DepositParams) -> Result<DepositQuote> {
        let mut guard = self.inner.lock().await;
        let ledger = &mut guard.ledger;
        let (mut pool, mut bank_a, mut bank_b) = ledger.triple(&params.pool_id)?;
        let quoter = pool.reserve_ratio_quoter();

        let quote = pool.apply_deposit(
            &mut bank_a,
            &mut bank_b,
            &quoter,
            params.max_a,
            params.max_b,
            params.min_lp_out,
            &self.config,
        )?;
        ledger.commit(pool, bank_a, bank_b);
        Ok(quote)
    }

    /// Redeem and commit, pulling lending-market funds first as [`Engine::swap`]
    /// does. Either both legs are funded or neither bank changes.
    pub async fn redeem(&self, params: &RedeemParams) -> Result<RedeemQuote> {
        let mut guard = self.inner.lock().await;
        let Inner { ledger, lending } = &mut *guard;
        let (mut pool, mut bank_a, mut bank_b) = ledger.triple(&params.pool_id)?;
        let quoter = pool.reserve_ratio_quoter();

        let quote = pool.quote_redeem(
            &bank_a,
            &bank_b,
            &quoter,
            params.lp_tokens,
            params.min_a,
            params.min_b,
        )?;
        let withdrawals = prepare_payouts(
            ledger,
            lending,
            &mut [(&mut bank_a, quote.withdraw_a), (&mut bank_b, quote.withdraw_b)],
        )?;

        let applied = pool.apply_redeem(
            &mut bank_a,
            &mut bank_b,
            &quoter,
            params.lp_tokens,
            params.min_a,
            params.min_b,
        );
        match applied {
            Ok(quote) => {
                ledger.commit(pool, bank_a, bank_b);
                Ok(quote)
            }
            Err(err) => {
                undo_withdrawals(ledger, lending, withdrawals, &[bank_a, bank_b]);
                Err(err)
            }
        }
    }

    pub async fn collect_protocol_fees(&self, pool_id: &str) -> Result<ProtocolFees> {
        let mut inner = self.inner.lock().await;
        let pool = inner
            .ledger
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| Error::PoolNotFound(pool_id.to_string()))?;
        Ok(pool.collect_protocol_fees())
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    pub async fn pool_info(&self, pool_id: &str) -> Result<PoolInfo> {
        let (pool, bank_a, bank_b) = self.inner.lock().await.ledger.triple(pool_id)?;
        pool.info(&bank_a, &bank_b)
    }

    pub async fn bank(&self, asset_id: &str) -> Result<BankInfo> {
        self.inner.lock().await.ledger.bank(asset_id)?.info()
    }

    /// Banks and pools sorted by id. Prices are left empty.
    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().await;
        let mut banks: Vec<BankState> = inner.ledger.banks.values().cloned().collect();
        let mut pools: Vec<PoolState> = inner.ledger.pools.values().cloned().collect();
        banks.sort_by(|a, b| a.asset.id.cmp(&b.asset.id));
        pools.sort_by(|a, b| a.id.cmp(&b.id));
        Snapshot { banks, pools, prices: Vec::new() }
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    /// Swap quoter for a pool, reading oracle prices when it needs them.
    fn resolve_quoter(&self, pool: &PoolState, bank_a: &BankState, bank_b: &BankState) -> Result<Quoter> {
        let Some((index_a, index_b)) = pool.oracle_indices() else {
            return pool.quoter(bank_a, bank_b, None);
        };

        let prices = self.oracle.get_price(index_a).and_then(|a| {
            let b = self.oracle.get_price(index_b)?;
            Ok(OraclePrices { a, b })
        });
        match prices {
            Ok(prices) => pool.quoter(bank_a, bank_b, Some(&prices)),
            Err(err @ Error::OracleUnavailable { .. }) if self.config.oracle_fallback_to_reserve_ratio => {
                warn!("pool {}: {}; quoting off reserve ratio", pool.id, err);
                Ok(pool.reserve_ratio_quoter())
            }
            Err(err) => Err(err),
        }
    }
}

/// A lending-market withdrawal made ahead of a payout.
struct Withdrawal {
    asset: Asset,
    received: u64,
}

/// Pull funds from the lending market so every `(bank, amount)` leg can be
/// paid from held funds. All legs are checked before the market is called;
/// if a market call still fails, earlier legs are returned to the market.
fn prepare_payouts<L: LendingMarket>(
    ledger: &mut Ledger,
    lending: &mut L,
    legs: &mut [(&mut BankState, u64)],
) -> Result<Vec<Withdrawal>> {
    for (bank, amount) in legs.iter() {
        bank.check_payout(*amount)?;
    }

    let mut withdrawals = Vec::new();
    let mut failure = None;
    for (bank, amount) in legs.iter_mut() {
        if *amount == 0 {
            continue;
        }
        match bank.prepare_pending_withdraw(*amount, lending) {
            Ok(RebalanceOutcome::Withdrawn { received, .. }) => {
                withdrawals.push(Withdrawal { asset: bank.asset.clone(), received });
            }
            Ok(_) => {}
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    match failure {
        None => Ok(withdrawals),
        Some(err) => {
            let prepared: Vec<BankState> = legs.iter().map(|(bank, _)| (**bank).clone()).collect();
            undo_withdrawals(ledger, lending, withdrawals, &prepared);
            Err(err)
        }
    }
}

/// Return withdrawn funds to the lending market after a rejected payout. A
/// bank whose funds the market will not take back keeps them as held funds.
fn undo_withdrawals<L: LendingMarket>(
    ledger: &mut Ledger,
    lending: &mut L,
    withdrawals: Vec<Withdrawal>,
    prepared: &[BankState],
) {
    for w in withdrawals {
        if let Err(err) = lending.deposit(&w.asset, w.received) {
            warn!("bank {}: keeping {} withdrawn from the lending market: {}", w.asset.id, w.received, err);
            if let Some(bank) = prepared.iter().find(|b| b.asset.id == w.asset.id) {
                ledger.banks.insert(bank.asset.id.clone(), bank.clone());
            }
        }
    }
}
