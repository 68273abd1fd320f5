mod forward;
mod server;

use clap::Parser;
use forward::Forward;
use hostmap::{
    parse_directives, Chain, ConfigError, FileStore, HostMap, RecordStore, RefreshPolicy,
    RequestCounter,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "hostmap\nforward 8.8.8.8:53\n";

/// DNS server answering A and AAAA queries from a JSON table, forwarding the
/// rest upstream.
#[derive(Debug, Parser)]
#[command(name = "hostmap-server", version, about)]
struct Cli {
    /// Address to listen on for UDP queries.
    #[arg(short, long, default_value = "127.0.0.1:8053")]
    listen: SocketAddr,

    /// Chain configuration file. Defaults to `hostmap` then `forward 8.8.8.8:53`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name to address table.
    #[arg(short, long, default_value = "dns.json")]
    table: PathBuf,

    /// Re-read the table at most this often. Read on every query when unset.
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Answer non-address queries with SERVFAIL instead of passing them on.
    #[arg(long)]
    strict: bool,

    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds the handler chain in directive order.
fn build_chain(
    text: &str,
    store: Arc<dyn RecordStore>,
    fallthrough: bool,
    metrics: Arc<RequestCounter>,
) -> Result<Chain, ConfigError> {
    let directives = parse_directives(text);
    if directives.is_empty() {
        return Err(ConfigError::Empty);
    }

    let mut chain = Chain::new();
    for directive in &directives {
        match directive.name.as_str() {
            hostmap::DIRECTIVE => {
                hostmap::setup(directive)?;
                chain.push(Arc::new(
                    HostMap::new(store.clone(), metrics.clone()).fallthrough(fallthrough),
                ));
            }
            forward::DIRECTIVE => chain.push(Arc::new(Forward::setup(directive)?)),
            _ => {
                return Err(ConfigError::UnknownDirective {
                    name: directive.name.clone(),
                    line: directive.line,
                })
            }
        }
    }
    Ok(chain)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => DEFAULT_CONFIG.to_string(),
    };

    let policy = match cli.refresh_secs {
        Some(secs) => RefreshPolicy::Interval(Duration::from_secs(secs)),
        None => RefreshPolicy::Always,
    };
    let store = Arc::new(FileStore::new(&cli.table).refresh(policy));
    let metrics = Arc::new(RequestCounter::new());

    let chain = build_chain(&config, store, !cli.strict, metrics.clone())?;
    info!(handlers = ?chain.names(), table = %cli.table.display(), "chain ready");

    let server = server::Server::new(cli.listen, chain);
    tokio::select! {
        res = server.run() => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    info!(answered = metrics.total(), "\n{}", metrics.render());
    Ok(())
}
