//! lendctl
//!
//! Inspect lending pool positions, submit pre-flighted writes and deploy
//! liquidation protection.
//!
//! ## Usage
//!
//! ```bash
//! # Aggregate risk for the configured sender
//! lendctl risk
//!
//! # Safe withdraw bound for one token
//! lendctl withdrawable --pool 0x… --token 0x…
//!
//! # Deposit 10 units, approving the pool first if needed
//! lendctl deposit --pool 0x… --token 0x… --amount 10
//!
//! # Deploy protection, resuming from an earlier partial run
//! lendctl protect --pool 0x… --token 0x… --max-amount 100 \
//!     --threshold 1.2 --target 1.5 --resume-from state.json
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lendguard_client::{
    load_dashboard, pool_id, Dashboard, Erc20Client, PoolActions, PoolContract, RpcProvider, TokenRegistry,
};
use lendguard_deployer::{
    load_bytecode, Deployer, DeploymentSession, DeploymentState, ProtectionParams, ResumePolicy, RpcBackend,
};
use lendguard_risk::{format_units, max_repayable, max_withdrawable, PoolId, SafetyBuffer, TokenInfo};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "lendctl")]
#[command(about = "Lending pool positions, pre-flighted writes and liquidation protection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file
    #[arg(short, long, default_value = "lendctl.toml", global = true)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List pools with reserves and utilization
    Pools,

    /// Aggregate collateral, debt and health factor
    Risk {
        /// Account to inspect (defaults to the configured sender)
        #[arg(short, long)]
        user: Option<Address>,
    },

    /// Largest amount that can be withdrawn while keeping the safety buffer
    Withdrawable {
        #[arg(short, long)]
        pool: PoolId,

        #[arg(short, long)]
        token: Address,

        /// Safety buffer above the minimum required collateral (percent)
        #[arg(long, default_value = "10")]
        buffer: Decimal,
    },

    /// Largest amount that can be repaid from the wallet
    Repayable {
        #[arg(short, long)]
        pool: PoolId,

        #[arg(short, long)]
        token: Address,
    },

    /// Canonical pool id for a token pair (offline)
    PoolId { token_a: Address, token_b: Address },

    /// Deposit collateral
    Deposit(Transfer),

    /// Withdraw collateral
    Withdraw(Transfer),

    /// Borrow against deposited collateral
    Borrow(Transfer),

    /// Repay borrowed tokens
    Repay(Transfer),

    /// Swap one pool token for the other
    Swap {
        #[arg(short, long)]
        pool: PoolId,

        #[arg(long)]
        token_in: Address,

        #[arg(short, long)]
        amount: Decimal,

        /// Accepted slippage against the quote (basis points)
        #[arg(long, default_value = "50")]
        slippage_bps: u32,
    },

    /// Create the pool for a token pair
    CreatePool { token_a: Address, token_b: Address },

    /// Add liquidity in both pool tokens
    AddLiquidity {
        #[arg(short, long)]
        pool: PoolId,

        #[arg(long)]
        amount_a: Decimal,

        #[arg(long)]
        amount_b: Decimal,
    },

    /// Burn liquidity shares
    RemoveLiquidity {
        #[arg(short, long)]
        pool: PoolId,

        /// Raw liquidity share amount
        #[arg(short, long)]
        liquidity: U256,
    },

    /// Deploy liquidation protection across both chains
    Protect {
        #[arg(short, long)]
        pool: String,

        /// Collateral token the callback may pull
        #[arg(short, long)]
        token: String,

        /// Most collateral the callback may pull (token units)
        #[arg(long)]
        max_amount: String,

        /// Health factor that triggers protection
        #[arg(long)]
        threshold: String,

        /// Health factor protection restores
        #[arg(long)]
        target: String,

        /// Protected account (defaults to the configured sender)
        #[arg(short, long)]
        user: Option<String>,

        /// Deployment state printed by an earlier run
        #[arg(long)]
        resume_from: Option<PathBuf>,

        /// Ignore prior state and deploy everything again
        #[arg(long)]
        fresh: bool,
    },
}

#[derive(clap::Args)]
struct Transfer {
    #[arg(short, long)]
    pool: PoolId,

    #[arg(short, long)]
    token: Address,

    /// Amount in token units
    #[arg(short, long)]
    amount: Decimal,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lendctl={level},lendguard_client={level},lendguard_deployer={level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::PoolId { token_a, token_b } = cli.command {
        println!("{}", pool_id(token_a, token_b));
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    let provider = Arc::new(RpcProvider::new(&config.client).context("building provider")?);
    let actions = PoolActions::new(config.client.pool, provider.clone());

    match cli.command {
        Commands::PoolId { .. } => Ok(()),
        Commands::Pools => {
            print_pools(&actions.dashboard().await);
            Ok(())
        }
        Commands::Risk { user } => {
            let dashboard = match user {
                Some(user) => {
                    let pool = PoolContract::new(config.client.pool, provider.clone());
                    let tokens = TokenRegistry::new(Erc20Client::new(provider.clone()));
                    load_dashboard(&pool, &tokens, user).await
                }
                None => actions.dashboard().await,
            };
            print_risk(&dashboard);
            Ok(())
        }
        Commands::Withdrawable { pool, token, buffer } => {
            let buffer = SafetyBuffer::from_percent(buffer)?;
            let dashboard = actions.dashboard().await;
            print_warnings(&dashboard);
            let info = actions.tokens().get(token).await?;
            let max = match (dashboard.position(&pool), dashboard.collateral_factor) {
                (Some(position), Some(factor)) => max_withdrawable(position, &token, factor, buffer),
                _ => Decimal::ZERO,
            };
            println!("{} {}", max.round_dp(6), info.symbol);
            Ok(())
        }
        Commands::Repayable { pool, token } => {
            let dashboard = actions.dashboard().await;
            print_warnings(&dashboard);
            let info = actions.tokens().get(token).await?;
            let balance = actions.wallet_balance(&info).await;
            let bound = dashboard
                .position(&pool)
                .map(|position| max_repayable(position, &token, balance))
                .unwrap_or_default();
            println!("borrowed      {} {}", bound.current_borrowed.round_dp(6), info.symbol);
            println!("max repayable {} {}", bound.max_repayable.round_dp(6), info.symbol);
            Ok(())
        }
        Commands::Deposit(t) => {
            let hash = actions.deposit(t.pool, t.token, t.amount).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::Withdraw(t) => {
            let hash = actions.withdraw(t.pool, t.token, t.amount).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::Borrow(t) => {
            let hash = actions.borrow(t.pool, t.token, t.amount).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::Repay(t) => {
            let hash = actions.repay(t.pool, t.token, t.amount).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::Swap {
            pool,
            token_in,
            amount,
            slippage_bps,
        } => {
            let hash = actions.swap(pool, token_in, amount, slippage_bps).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::CreatePool { token_a, token_b } => {
            let id = actions.create_pool(token_a, token_b).await?;
            println!("{}", id);
            Ok(())
        }
        Commands::AddLiquidity {
            pool,
            amount_a,
            amount_b,
        } => {
            let hash = actions.add_liquidity(pool, amount_a, amount_b).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::RemoveLiquidity { pool, liquidity } => {
            let hash = actions.remove_liquidity(pool, liquidity).await?;
            println!("{}", hash);
            Ok(())
        }
        Commands::Protect {
            pool,
            token,
            max_amount,
            threshold,
            target,
            user,
            resume_from,
            fresh,
        } => {
            let params = ProtectionParams {
                pool_id: pool,
                user: user.unwrap_or_else(|| config.client.sender.to_string()),
                collateral_token: token,
                max_amount,
                threshold,
                target,
            };
            run_protect(&config, provider, params, resume_from, fresh).await
        }
    }
}

async fn run_protect(
    config: &Config,
    provider: Arc<RpcProvider>,
    params: ProtectionParams,
    resume_from: Option<PathBuf>,
    fresh: bool,
) -> Result<()> {
    let protection = config
        .protection
        .as_ref()
        .context("config has no [protection] section")?;

    let mut deployer_config = protection.deployer_config()?;
    if fresh {
        deployer_config.resume = ResumePolicy::Fresh;
    }

    let callback_code = load_bytecode(&protection.callback_bytecode)?;
    let reactive_code = load_bytecode(&protection.reactive_bytecode)?;
    let backend = RpcBackend::new(provider, callback_code, reactive_code);
    let deployer = Deployer::new(backend, deployer_config);

    let prior = match resume_from {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => DeploymentState::Idle,
    };

    let mut session = DeploymentSession::new(prior);
    let result = session.run(&deployer, &params).await;

    // printed on failure too, so a later run can resume from it
    println!("{}", serde_json::to_string_pretty(&session.state)?);
    match result {
        Ok(()) => {
            info!("deployment complete");
            Ok(())
        }
        Err(e) => anyhow::bail!("deployment stopped at {:?}: {}", session.state.step(), e.friendly()),
    }
}

fn token_label(info: Option<&TokenInfo>) -> (String, Option<u8>) {
    match info {
        Some(t) => (t.symbol.clone(), Some(t.decimals)),
        None => ("?".into(), None),
    }
}

fn amount(raw: U256, decimals: Option<u8>) -> String {
    match decimals {
        Some(d) => format_units(raw, d, 4),
        None => raw.to_string(),
    }
}

fn percent(fraction: Option<Decimal>) -> String {
    match fraction {
        Some(f) => format!("{}%", (f * Decimal::ONE_HUNDRED).round_dp(2)),
        None => "-".into(),
    }
}

fn print_warnings(dashboard: &Dashboard) {
    for warning in &dashboard.warnings {
        eprintln!("warning: {}", warning);
    }
}

fn print_pools(dashboard: &Dashboard) {
    print_warnings(dashboard);
    if dashboard.pools.is_empty() {
        println!("no pools");
        return;
    }
    for entry in &dashboard.pools {
        let (symbol_a, decimals_a) = token_label(entry.token_a.as_ref());
        let (symbol_b, decimals_b) = token_label(entry.token_b.as_ref());
        let pool = &entry.pool;
        println!("{}  {}/{}", entry.pool_id, symbol_a, symbol_b);
        println!(
            "  reserves     {} {} / {} {}",
            amount(pool.reserve_a, decimals_a),
            symbol_a,
            amount(pool.reserve_b, decimals_b),
            symbol_b
        );
        println!(
            "  borrowed     {} {} / {} {}",
            amount(pool.total_borrowed_a, decimals_a),
            symbol_a,
            amount(pool.total_borrowed_b, decimals_b),
            symbol_b
        );
        println!(
            "  utilization  {} / {}",
            percent(pool.utilization_a()),
            percent(pool.utilization_b())
        );
    }
}

fn print_risk(dashboard: &Dashboard) {
    print_warnings(dashboard);
    let risk = &dashboard.risk;
    println!("user               {}", dashboard.user);
    if let Some(factor) = dashboard.collateral_factor {
        println!("collateral factor  {}", percent(Some(factor.value())));
    }
    println!("collateral value   {}", risk.total_collateral_value.round_dp(4));
    println!("borrowed value     {}", risk.total_borrowed_value.round_dp(4));
    println!("available          {}", risk.available_to_borrow.round_dp(4));
    println!(
        "health factor      {} ({})",
        risk.health_factor,
        risk.health_factor.status()
    );
    for p in &risk.positions {
        println!(
            "  {}  collateral {} / debt {}",
            p.pool_id,
            p.collateral_value.round_dp(4),
            p.debt_value.round_dp(4)
        );
    }
}
