use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

use gavel_cli::{
    commands::{balances as balances_cmd, status as status_cmd, watch as watch_cmd},
    config::{self, DEFAULT_CONFIG_PATH},
};
use gavel_core::{
    feed::{FeedPhase, FeedState},
    types::ProposalId,
};

#[derive(Debug, Parser)]
#[command(name = "gavel-cli", about = "Auction marketplace read-model CLI", version)]
struct Cli {
    /// Path to the marketplace configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// RPC URL for the target chain
    #[arg(long, env = "GAVEL_RPC_URL", value_name = "URL")]
    rpc_url: Option<String>,

    /// Proposal registry contract address (falls back to the config file)
    #[arg(long, env = "GAVEL_REGISTRY", value_name = "ADDRESS")]
    registry: Option<Address>,

    /// Metadata gateway base URL (falls back to the config file, then the
    /// public gateway)
    #[arg(long, env = "GAVEL_IPFS_GATEWAY", value_name = "URL")]
    gateway: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// One-shot snapshot of an auction
    Status(ProposalArgs),
    /// Follow an auction live: snapshot updates plus countdown ticks
    Watch(ProposalArgs),
    /// Wallet balances for an account
    Balances(BalanceArgs),
}

#[derive(Debug, Args)]
struct ProposalArgs {
    /// Proposal id in the registry
    #[arg(value_name = "ID")]
    proposal: u64,
}

#[derive(Debug, Args)]
struct BalanceArgs {
    /// Account to read balances for
    #[arg(value_name = "ADDRESS")]
    account: Address,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let file = config::load_config(&cli.config)?;
    let rpc_url = cli
        .rpc_url
        .as_deref()
        .ok_or_else(|| eyre::eyre!("--rpc-url or GAVEL_RPC_URL is required"))?;
    let gateway = cli.gateway.clone().or_else(|| file.ipfs_gateway.clone());

    match cli.command {
        Commands::Status(args) => {
            let registry = config::require_registry(cli.registry, &file)?;
            let state = status_cmd::status(
                rpc_url,
                status_cmd::SnapshotArgs {
                    registry,
                    proposal: ProposalId::from(args.proposal),
                    gateway,
                },
            )
            .await?;
            print_state(&state);
        }
        Commands::Watch(args) => {
            let registry = config::require_registry(cli.registry, &file)?;
            watch_cmd::watch(
                rpc_url,
                status_cmd::SnapshotArgs {
                    registry,
                    proposal: ProposalId::from(args.proposal),
                    gateway,
                },
            )
            .await?;
        }
        Commands::Balances(args) => {
            let state = balances_cmd::balances(rpc_url, args.account, file.local_token).await?;
            println!("native: {}", state.native);
            println!("token:  {}", state.token);
            if let Some(error) = state.error {
                eprintln!("{error}");
            }
        }
    }

    Ok(())
}

fn print_state(state: &FeedState) {
    if state.phase == FeedPhase::Failed {
        eprintln!("error: {}", state.error.as_deref().unwrap_or("unknown"));
        return;
    }

    let Some(snapshot) = state.snapshot.as_ref() else {
        println!("no snapshot available");
        return;
    };

    println!("{} [{}]", snapshot.metadata.name, snapshot.metadata.category);
    if !snapshot.metadata.description.is_empty() {
        println!("{}", snapshot.metadata.description);
    }
    println!("price:   {} ETH", snapshot.formatted_price());
    if snapshot.proposal.has_live_auction() {
        println!("bidder:  {}", snapshot.live.highest_bidder);
        println!("bids:    {}", snapshot.live.bid_history.len());
        println!("ends in: {}", snapshot.time_left);
    } else {
        println!("auction not started");
    }
}
