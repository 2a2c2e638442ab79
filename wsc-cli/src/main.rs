//! WSC CLI - measure waterbody surface area from Sentinel-2 imagery and
//! analyse the stored series.

use clap::Parser;
use log::debug;

#[derive(Parser)]
#[command(
    name = "wsc-cli",
    version,
    about = "WaterScope surface water monitoring toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: wsc_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("wsc-cli {}", env!("CARGO_PKG_VERSION"));
    wsc_cmd::run(cli.command).await
}
