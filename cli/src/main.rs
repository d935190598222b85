//! FeliCa Viewer
//!
//! Reads a fare card through a PC/SC reader, authenticating against a
//! remote authority, and prints the decoded records.

mod config;
mod pcsc_transport;
mod report;
mod stations;

use anyhow::{Context, Result};
use clap::Parser;
use felica_session::{AuthSession, CardDataAssembler, HttpChannel, SYSTEM_CODE};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ViewerConfig;
use pcsc_transport::PcscTransport;
use report::Reporter;
use stations::StationDirectory;

/// FeliCa Viewer - remote-authenticated fare card reader
#[derive(Parser, Debug)]
#[command(name = "felica-viewer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Authority server URL (overrides configuration)
    #[arg(long)]
    server: Option<String>,

    /// Path to the station code table (overrides configuration)
    #[arg(long)]
    stations: Option<String>,

    /// Also write the snapshot as JSON to this path
    #[arg(long)]
    json: Option<String>,

    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = ViewerConfig::load(&args.config)?;
    let server_url = args.server.unwrap_or_else(|| config.server_url());
    let stations_path = args
        .stations
        .unwrap_or_else(|| config.stations.path.clone());

    let stations = StationDirectory::load(&stations_path)?;

    let mut card = PcscTransport::connect().context("failed to open the card reader")?;
    let (idm, pmm) = card.poll(SYSTEM_CODE).context("no card detected")?;
    info!(idm = %hex::encode_upper(idm), "card detected");

    let channel = HttpChannel::new(&server_url, config.server.http_timeout())
        .context("invalid authority server URL")?;
    info!(server = %server_url, "authenticating");

    let mut session = AuthSession::new(channel, card, idm, pmm)
        .with_exchange_timeout(config.server.exchange_timeout());
    let snapshot = CardDataAssembler::new(&mut session)
        .assemble()
        .context("card read failed")?;

    if let Some(path) = &args.json {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {path}"))?;
        serde_json::to_writer_pretty(file, &snapshot)?;
        info!(path = %path, "snapshot written");
    }

    Reporter::new(&stations).print(&snapshot);

    Ok(())
}
