use clap::Parser;

/// Listing monitor CLI arguments. Each flag overrides its environment
/// variable.
#[derive(Debug, Parser)]
#[command(
    name = "listing-monitor",
    version,
    about = "Watches the listings portal and reports newly added rows"
)]
pub struct Cli {
    /// Seconds between checks (overrides CHECK_INTERVAL)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Status server port (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run a single check and exit without starting the status server
    #[arg(long)]
    pub once: bool,
}
