use clap::Parser;
use color_eyre::eyre::Result;
use hyperploy::{
    SubmitStrategy,
    constants::DEFAULT_POLL_INTERVAL,
};
use std::{
    path::PathBuf,
    time::Duration,
};

mod client;
mod ui;

/// Deploy the Hyperploy contract on HyperEVM from the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Wallet JSON-RPC endpoint (signs on the wallet side)
    #[arg(long, env = "HYPERPLOY_RPC_URL")]
    rpc_url: Option<String>,

    /// Base URL of the Mini App host bridge
    #[arg(long, env = "HYPERPLOY_FRAME_HOST")]
    frame_host: Option<String>,

    #[arg(long, value_enum, default_value_t = SubmitStrategy::RawTransaction)]
    strategy: SubmitStrategy,

    /// How often the wallet is polled for account or chain changes
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _guard = client::init_tracing(&args.log_dir)?;
    client::run_app(client::AppConfig {
        rpc_url: args.rpc_url,
        frame_host: args.frame_host,
        strategy: args.strategy,
        poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
    })
    .await
}
