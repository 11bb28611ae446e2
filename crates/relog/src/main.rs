//! relog - a small-footprint syslog relay
//!
//! # Usage
//!
//! ```bash
//! # Relay with a config file
//! relog -F relog.toml
//!
//! # Replicate syslog from a local port to two others
//! relog -s localhost:5140 -d localhost:30514,localhost:31514
//!
//! # Receive syslog and save it to a file
//! relog -s localhost:5140 -w syslog.txt
//!
//! # Replay an offline file to a remote server
//! relog -r syslog.txt -d 10.50.200.100
//! ```

mod privilege;
mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relog_config::{Config, DstSection, FlowSection, LogFormat, SrcSection};
use relog_flow::FlowTable;

/// relog - relay syslog records between sockets and files
#[derive(Parser, Debug)]
#[command(name = "relog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short = 'F', long)]
    config: Option<PathBuf>,

    /// Comma-separated listen list (e.g. "localhost:5140,tcp://0.0.0.0:5141")
    #[arg(short = 's', long, value_name = "HOSTS")]
    src_host: Option<String>,

    /// File to replay, one record per line
    #[arg(short = 'r', long, value_name = "PATH")]
    src_file: Option<PathBuf>,

    /// Tail the source file for appended lines instead of stopping at EOF
    #[arg(long, requires = "src_file")]
    follow: bool,

    /// Comma-separated send list (e.g. "10.50.200.100:514,localhost:6001")
    #[arg(short = 'd', long, value_name = "HOSTS")]
    dst_host: Option<String>,

    /// File to append received records to
    #[arg(short = 'w', long, value_name = "PATH")]
    dst_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the relay
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn has_endpoint_flags(&self) -> bool {
        self.src_host.is_some()
            || self.src_file.is_some()
            || self.dst_host.is_some()
            || self.dst_file.is_some()
    }

    /// Build the single `cli` rule from endpoint flags
    fn flow_section(&self) -> FlowSection {
        FlowSection {
            name: "cli".into(),
            src: SrcSection {
                host: self.src_host.clone(),
                connect: None,
                file: self.src_file.clone(),
                follow: self.follow,
            },
            dst: DstSection {
                host: self.dst_host.clone(),
                file: self.dst_file.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path).context("failed to load configuration")?,
        None => Config::default(),
    };

    init_logging(
        cli.log_level.as_deref().unwrap_or(config.log.level.as_str()),
        config.log.format,
    );

    // A config file with flows wins over endpoint flags, matching the
    // classic relay's precedence.
    let base_dir = cli.config.as_deref().and_then(Path::parent);
    let rules = if !config.flow.is_empty() {
        if cli.has_endpoint_flags() {
            warn!("config file defines flows; ignoring CLI endpoint flags");
        }
        config.resolve_rules(base_dir)?
    } else if cli.has_endpoint_flags() {
        vec![cli.flow_section().resolve(None)?]
    } else {
        bail!("no flows configured - provide --config or source/destination flags (see --help)");
    };

    let table = FlowTable::build(rules).context("invalid flow table")?;
    privilege::check_bind_privilege(&table)?;

    if cli.check {
        for flow in table.iter() {
            println!(
                "flow '{}': {} source(s) -> {} destination(s)",
                flow.name(),
                flow.sources().len(),
                flow.destinations().len()
            );
        }
        println!("configuration ok");
        return Ok(());
    }

    serve::run(Arc::new(table), serve::engine_options(&config.global)).await
}

/// Install the tracing subscriber
///
/// `RELOG_LOG` overrides the configured level with a full filter expression.
fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_env("RELOG_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }
}
