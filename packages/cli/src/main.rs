use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::json;
use steamm_sdk::{
    DepositParams, Engine, EngineConfig, NoLending, RedeemParams, Snapshot, StaticOracle,
    SwapParams,
};

type SnapshotEngine = Engine<StaticOracle, NoLending>;

// ─── Version banner ───────────────────────────────────────────────────────────

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  STEAMM  v{ver}  ·  bank-backed AMM quoting console");
    println!("  {}", "─".repeat(62));
    println!("  Quoters   constant product (x·y=k)  ·  oracle");
    println!("  Input     JSON state snapshot  (--snapshot / STEAMM_SNAPSHOT)");
    println!("  Config    TOML engine config   (--config / STEAMM_CONFIG)");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// STEAMM: quote swaps, deposits and redemptions against a state snapshot.
///
/// Every command supports --json for machine-readable output.
/// Nothing is committed: the snapshot file is only read.
#[derive(Parser)]
#[command(
    name    = "steamm",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Read-only quoting console for bank-backed constant-product and oracle pools.",
    after_help = "\
ENVIRONMENT:
  STEAMM_SNAPSHOT  Path to the JSON state snapshot
  STEAMM_CONFIG    Path to the TOML engine configuration
  RUST_LOG         Log level (error, warn, info, debug)

QUICK START:
  steamm --snapshot state.json pool-info   --pool usdc-sui
  steamm --snapshot state.json quote-swap  --pool usdc-sui --direction a2b --amount 1000000
  steamm --snapshot state.json quote-redeem --pool usdc-sui --lp 500000 --json"
)]
struct Cli {
    /// JSON state snapshot (banks, pools, oracle prices)
    #[arg(long, global = true, value_name = "FILE", env = "STEAMM_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// TOML engine configuration; defaults apply when omitted
    #[arg(long, global = true, value_name = "FILE", env = "STEAMM_CONFIG")]
    config: Option<PathBuf>,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Sell asset A for asset B
    A2b,
    /// Sell asset B for asset A
    B2a,
}

impl Direction {
    fn is_a2b(self) -> bool {
        self == Direction::A2b
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a swap of underlying units through a pool
    #[command(
        name = "quote-swap",
        after_help = "\
EXAMPLES:
  steamm quote-swap --pool usdc-sui --direction a2b --amount 1000000
  steamm quote-swap --pool usdc-sui --direction b2a --amount 5000000000 --min-out 9000000

NOTES:
  Amounts are atomic units of the underlying asset.
  The fee is taken from the input; the output is rounded down."
    )]
    QuoteSwap {
        #[arg(long, value_name = "ID")]
        pool: String,

        #[arg(long, value_enum)]
        direction: Direction,

        /// Input amount in atomic units
        #[arg(long, value_name = "N")]
        amount: u64,

        /// Fail if the output is below this amount
        #[arg(long, value_name = "N", default_value_t = 0)]
        min_out: u64,
    },

    /// Quote a ratio-pinned deposit
    #[command(name = "quote-deposit")]
    QuoteDeposit {
        #[arg(long, value_name = "ID")]
        pool: String,

        /// Most of asset A to deposit
        #[arg(long, value_name = "N")]
        max_a: u64,

        /// Most of asset B to deposit
        #[arg(long, value_name = "N")]
        max_b: u64,

        /// Fail if fewer LP tokens would be minted
        #[arg(long, value_name = "N", default_value_t = 0)]
        min_lp: u64,
    },

    /// Quote burning LP tokens for both assets
    #[command(name = "quote-redeem")]
    QuoteRedeem {
        #[arg(long, value_name = "ID")]
        pool: String,

        /// LP tokens to burn
        #[arg(long, value_name = "N")]
        lp: u64,

        #[arg(long, value_name = "N", default_value_t = 0)]
        min_a: u64,

        #[arg(long, value_name = "N", default_value_t = 0)]
        min_b: u64,
    },

    /// Show reserves, LP supply, fees and spot price of a pool
    #[command(name = "pool-info")]
    PoolInfo {
        #[arg(long, value_name = "ID")]
        pool: String,
    },

    /// Show funds, exchange rate and utilization of a bank
    #[command(name = "bank-info")]
    BankInfo {
        /// Underlying asset id of the bank
        #[arg(long, value_name = "ID")]
        asset: String,
    },

    /// Print the effective engine configuration
    Config,
}

// ─── Loading ──────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config '{}'", path.display()))?;
            toml::from_str::<EngineConfig>(&raw)
                .with_context(|| format!("Invalid TOML in '{}'", path.display()))?
        }
        None => EngineConfig::default(),
    };
    config.validate().context("Invalid engine configuration")?;
    Ok(config)
}

fn load_engine(path: Option<&Path>, config: EngineConfig) -> Result<SnapshotEngine> {
    let path = path.ok_or_else(|| anyhow!(
        "No state snapshot given.\n  \
         Pass --snapshot FILE or set STEAMM_SNAPSHOT."
    ))?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read snapshot '{}'", path.display()))?;
    let snapshot = Snapshot::from_json(&raw)
        .with_context(|| format!("Invalid snapshot '{}'", path.display()))?;
    log::debug!(
        "snapshot {}: {} banks, {} pools, {} prices",
        path.display(),
        snapshot.banks.len(),
        snapshot.pools.len(),
        snapshot.prices.len()
    );

    let oracle = StaticOracle::new(snapshot.prices.clone());
    Ok(Engine::from_snapshot(config, snapshot, oracle, NoLending)?)
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    let json_output = cli.json;

    if let Err(err) = run(cli).await {
        if !json_output {
            return Err(err);
        }
        println!("{}", error_json(&err));
        std::process::exit(1);
    }
    Ok(())
}

/// `--json` failure body; `kind` is the SDK error kind when there is one.
fn error_json(err: &anyhow::Error) -> serde_json::Value {
    let kind = err.downcast_ref::<steamm_sdk::Error>().map(|e| e.kind());
    json!({
        "status": "error",
        "kind":   kind,
        "error":  format!("{err:#}"),
    })
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    if let Commands::Config = cli.command {
        return cmd_config(&config, cli.json);
    }
    let engine = load_engine(cli.snapshot.as_deref(), config.clone())?;

    match &cli.command {
        Commands::QuoteSwap { pool, direction, amount, min_out } => {
            cmd_quote_swap(&engine, pool, *direction, *amount, *min_out, cli.json).await?;
        }
        Commands::QuoteDeposit { pool, max_a, max_b, min_lp } => {
            cmd_quote_deposit(&engine, pool, *max_a, *max_b, *min_lp, cli.json).await?;
        }
        Commands::QuoteRedeem { pool, lp, min_a, min_b } => {
            cmd_quote_redeem(&engine, pool, *lp, *min_a, *min_b, cli.json).await?;
        }
        Commands::PoolInfo { pool } => {
            cmd_pool_info(&engine, pool, cli.json).await?;
        }
        Commands::BankInfo { asset } => {
            cmd_bank_info(&engine, asset, cli.json).await?;
        }
        Commands::Config => cmd_config(&config, cli.json)?,
    }

    Ok(())
}

// ─── quote-swap ───────────────────────────────────────────────────────────────

async fn cmd_quote_swap(
    engine: &SnapshotEngine,
    pool_id: &str,
    direction: Direction,
    amount_in: u64,
    min_out: u64,
    json_output: bool,
) -> Result<()> {
    let pool = engine.pool_info(pool_id).await?;
    let a2b = direction.is_a2b();
    let (token_in, token_out) = if a2b {
        (&pool.asset_a, &pool.asset_b)
    } else {
        (&pool.asset_b, &pool.asset_a)
    };

    let quote = engine
        .quote_swap(&SwapParams {
            pool_id: pool_id.to_string(),
            a2b,
            amount_in,
            min_amount_out: min_out,
        })
        .await?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "quote-swap",
            "token_in":  token_in,
            "token_out": token_out,
            "quote":   quote,
        }));
    } else {
        let dir = if a2b { "A → B" } else { "B → A" };
        println!("─── Swap Quote ───────────────────────────────────────────────────");
        println!("  {token_in} → {token_out}  [{} / {dir}]", quote.quoter);
        println!("  Pool             {pool_id}");
        println!("  Reserve in       {:>20}  bTokens", if a2b { pool.reserve_a } else { pool.reserve_b });
        println!("  Reserve out      {:>20}  bTokens", if a2b { pool.reserve_b } else { pool.reserve_a });
        println!();
        println!("  ─── Fee Breakdown ────────────────────────────────");
        println!("  Amount in        {:>20}", quote.amount_in);
        println!("  In (bTokens)     {:>20}", quote.amount_in_btokens);
        println!("  Swap fee         {:>20}  ({:.2}%)",
                 quote.fee, pool.fee_config.swap_fee_bps as f64 / 100.0);
        println!("    LP share       {:>20}", quote.lp_fee);
        println!("    Protocol share {:>20}", quote.protocol_fee);
        println!();
        println!("  ─── Output ───────────────────────────────────────");
        println!("  Out (bTokens)    {:>20}", quote.amount_out_btokens);
        println!("  Amount out       {:>20}", quote.amount_out);
        println!("  Effective rate   {:>20.8}  {token_out}/{token_in} (raw units)",
                 quote.effective_rate);
    }
    Ok(())
}

// ─── quote-deposit ────────────────────────────────────────────────────────────

async fn cmd_quote_deposit(
    engine: &SnapshotEngine,
    pool_id: &str,
    max_a: u64,
    max_b: u64,
    min_lp: u64,
    json_output: bool,
) -> Result<()> {
    let quote = engine
        .quote_deposit(&DepositParams {
            pool_id: pool_id.to_string(),
            max_a,
            max_b,
            min_lp_out: min_lp,
        })
        .await?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "quote-deposit",
            "quote":   quote,
        }));
    } else {
        println!("─── Deposit Quote ────────────────────────────────────────────────");
        println!("  Pool             {pool_id}");
        println!("  Deposit A        {:>20}  (max {max_a})", quote.deposit_a);
        println!("  Deposit B        {:>20}  (max {max_b})", quote.deposit_b);
        println!("  bTokens A        {:>20}", quote.deposit_a_btokens);
        println!("  bTokens B        {:>20}", quote.deposit_b_btokens);
        println!("  LP minted        {:>20}", quote.lp_tokens_minted);
    }
    Ok(())
}

// ─── quote-redeem ─────────────────────────────────────────────────────────────

async fn cmd_quote_redeem(
    engine: &SnapshotEngine,
    pool_id: &str,
    lp_tokens: u64,
    min_a: u64,
    min_b: u64,
    json_output: bool,
) -> Result<()> {
    let quote = engine
        .quote_redeem(&RedeemParams {
            pool_id: pool_id.to_string(),
            lp_tokens,
            min_a,
            min_b,
        })
        .await?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "quote-redeem",
            "quote":   quote,
        }));
    } else {
        println!("─── Redeem Quote ─────────────────────────────────────────────────");
        println!("  Pool             {pool_id}");
        println!("  LP burned        {:>20}", quote.lp_tokens_burned);
        println!("  Withdraw A       {:>20}", quote.withdraw_a);
        println!("  Withdraw B       {:>20}", quote.withdraw_b);
        println!("  bTokens A        {:>20}", quote.withdraw_a_btokens);
        println!("  bTokens B        {:>20}", quote.withdraw_b_btokens);
    }
    Ok(())
}

// ─── pool-info ────────────────────────────────────────────────────────────────

async fn cmd_pool_info(engine: &SnapshotEngine, pool_id: &str, json_output: bool) -> Result<()> {
    let info = engine.pool_info(pool_id).await?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "pool-info",
            "pool":    info,
        }));
    } else {
        let (sym_a, sym_b) = (&info.asset_a, &info.asset_b);
        println!("─── Pool Info: {pool_id} ──────────────────────────────────────────────");
        println!("  Quoter           {:?}", info.quoter);
        println!();
        println!("  Token A          {sym_a}");
        println!("  Reserve A        {:>20}  bTokens", info.reserve_a);
        println!("                   {:>20}  underlying", info.reserve_a_underlying);
        println!();
        println!("  Token B          {sym_b}");
        println!("  Reserve B        {:>20}  bTokens", info.reserve_b);
        println!("                   {:>20}  underlying", info.reserve_b_underlying);
        println!();
        println!("  LP supply        {:>20}", info.lp_supply);
        println!("  Fee rate         {} bps  ({:.2}% per swap, {:.2}% of it to protocol)",
                 info.fee_config.swap_fee_bps,
                 info.fee_config.swap_fee_bps as f64 / 100.0,
                 info.fee_config.protocol_fee_bps as f64 / 100.0);
        println!("  Protocol fees    {} A  /  {} B  (bTokens)",
                 info.accrued_protocol_fee_a, info.accrued_protocol_fee_b);
        if info.reserve_a_underlying > 0 {
            println!("  Spot price       {:.8}  {sym_b}/{sym_a}  (whole tokens)", info.spot_price);
        } else {
            println!("  Spot price       n/a (pool is empty, no liquidity)");
        }
    }
    Ok(())
}

// ─── bank-info ────────────────────────────────────────────────────────────────

async fn cmd_bank_info(engine: &SnapshotEngine, asset: &str, json_output: bool) -> Result<()> {
    let info = engine.bank(asset).await?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "bank-info",
            "bank":    info,
        }));
    } else {
        println!("─── Bank Info: {asset} ──────────────────────────────────────────────");
        println!("  bToken           {}  ({} decimals)", info.btoken, info.decimals);
        println!("  Total funds      {:>20}", info.total_funds);
        println!("    Held           {:>20}", info.held);
        println!("    Delegated      {:>20}", info.delegated);
        println!("  bToken supply    {:>20}", info.btoken_supply);
        println!("  Exchange rate    {:>20}", info.exchange_rate.to_string());
        println!("  Utilization      {:>20}", info.utilization.to_string());
        if info.is_lending_active {
            println!("  Lending          active  (target {} bps ± {} bps)",
                     info.target_utilization_bps, info.utilization_buffer_bps);
        } else {
            println!("  Lending          inactive");
        }
    }
    Ok(())
}

// ─── config ───────────────────────────────────────────────────────────────────

fn cmd_config(config: &EngineConfig, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "config",
            "config":  config,
        }));
    } else {
        println!("{}", toml::to_string_pretty(config).context("Cannot render config")?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use steamm_sdk::{Asset, CreatePoolParams, FeeConfig, QuoterKind};

    async fn seeded_snapshot() -> Snapshot {
        let engine = Engine::new(EngineConfig::default(), StaticOracle::default(), NoLending).unwrap();
        engine.register_bank(Asset::new("USDC", 6), Asset::new("bUSDC", 6)).await.unwrap();
        engine.register_bank(Asset::new("SUI", 9), Asset::new("bSUI", 9)).await.unwrap();
        engine
            .create_pool(CreatePoolParams {
                id: "usdc-sui".into(),
                asset_a: "USDC".into(),
                asset_b: "SUI".into(),
                quoter: QuoterKind::ConstantProduct { offset: 0 },
                fee_config: FeeConfig::new(30, 0).unwrap(),
                lp_decimals: 9,
                lp_supply: 0,
            })
            .await
            .unwrap();
        engine
            .deposit(&DepositParams {
                pool_id: "usdc-sui".into(),
                max_a: 1_000_000,
                max_b: 1_000_000,
                min_lp_out: 0,
            })
            .await
            .unwrap();
        engine.snapshot().await
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn snapshot_file_drives_quotes() {
        let file = write_temp(&seeded_snapshot().await.to_json_pretty().unwrap());
        let engine = load_engine(Some(file.path()), EngineConfig::default()).unwrap();

        let quote = engine
            .quote_swap(&SwapParams {
                pool_id: "usdc-sui".into(),
                a2b: true,
                amount_in: 10_000,
                min_amount_out: 0,
            })
            .await
            .unwrap();
        assert_eq!(quote.amount_out, 9_871);

        cmd_pool_info(&engine, "usdc-sui", true).await.unwrap();
        cmd_bank_info(&engine, "SUI", false).await.unwrap();
        assert!(cmd_pool_info(&engine, "missing", true).await.is_err());
    }

    #[tokio::test]
    async fn zero_amount_reports_sdk_kind() {
        let file = write_temp(&seeded_snapshot().await.to_json_pretty().unwrap());
        let engine = load_engine(Some(file.path()), EngineConfig::default()).unwrap();

        let err = cmd_quote_swap(&engine, "usdc-sui", Direction::A2b, 0, 0, true)
            .await
            .unwrap_err();
        let body = error_json(&err);
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "EEmptyCoins");

        let err = load_engine(None, EngineConfig::default()).err().unwrap();
        assert!(error_json(&err)["kind"].is_null());
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let err = load_engine(None, EngineConfig::default()).err().unwrap();
        assert!(err.to_string().contains("STEAMM_SNAPSHOT"));
    }

    #[test]
    fn config_toml_overrides_defaults() {
        let file = write_temp(
            "swap_fee_tiers_bps = [5, 30]\n\
             oracle_fallback_to_reserve_ratio = true\n",
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.swap_fee_tiers_bps, vec![5, 30]);
        assert!(config.oracle_fallback_to_reserve_ratio);
        assert_eq!(config.bank_minimum_liquidity, EngineConfig::default().bank_minimum_liquidity);

        let bad = write_temp("lp_decimals = 6\n");
        assert!(load_config(Some(bad.path())).is_err());
    }

    #[test]
    fn parses_swap_arguments() {
        let cli = Cli::try_parse_from([
            "steamm", "--snapshot", "state.json", "--json",
            "quote-swap", "--pool", "usdc-sui", "--direction", "b2a", "--amount", "42",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.snapshot.as_deref(), Some(Path::new("state.json")));
        match cli.command {
            Commands::QuoteSwap { direction, amount, min_out, .. } => {
                assert_eq!(direction, Direction::B2a);
                assert_eq!((amount, min_out), (42, 0));
            }
            _ => panic!("expected quote-swap"),
        }
    }
}
