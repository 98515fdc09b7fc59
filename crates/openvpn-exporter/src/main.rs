//! openvpn-exporter - Prometheus exporter for OpenVPN status files.
//!
//! Every scrape of the telemetry path re-reads the configured status files
//! and reports their counters, per-connection traffic and route ages.

mod handlers;
mod registry;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use openvpn_exporter_core::collector::{Collector, RealFs};
use openvpn_exporter_core::config::{ExporterConfig, OpenVpnVersion};

use handlers::AppState;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "openvpn-exporter",
    about = "Prometheus exporter for OpenVPN status files",
    version = openvpn_exporter_core::VERSION
)]
struct Args {
    /// Address to listen on for web interface and telemetry.
    /// A bare ":port" listens on all interfaces.
    #[arg(
        long = "web.listen-address",
        default_value = ":9176",
        env = "OPENVPN_EXPORTER_LISTEN_ADDRESS"
    )]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(
        long = "web.telemetry-path",
        default_value = "/metrics",
        env = "OPENVPN_EXPORTER_TELEMETRY_PATH"
    )]
    telemetry_path: String,

    /// Comma-separated list of paths to OpenVPN status files.
    #[arg(
        long = "openvpn.status_paths",
        env = "OPENVPN_EXPORTER_STATUS_PATHS",
        value_delimiter = ','
    )]
    status_paths: Vec<String>,

    /// Only export per-common-name metrics, dropping per-connection labels.
    #[arg(long = "ignore.individuals", env = "OPENVPN_EXPORTER_IGNORE_INDIVIDUALS")]
    ignore_individuals: bool,

    /// OpenVPN release whose status columns are used for labels (2.3 or 2.4).
    #[arg(
        id = "openvpn_version",
        value_name = "VERSION",
        long = "openvpn.version",
        default_value = "2.3",
        env = "OPENVPN_EXPORTER_OPENVPN_VERSION",
        value_parser = parse_version
    )]
    version: OpenVpnVersion,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_version(s: &str) -> Result<OpenVpnVersion, String> {
    s.parse::<OpenVpnVersion>().map_err(|e| e.to_string())
}

/// Expands a bare `:port` into the IPv6 wildcard, which also accepts IPv4
/// connections on dual-stack hosts.
fn normalize_listen_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("[::]{}", addr)
    } else {
        addr.to_string()
    }
}

fn validate_telemetry_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("telemetry path {:?} must start with '/'", path));
    }
    if path == "/" {
        return Err("telemetry path must not be '/', it serves the landing page".to_string());
    }
    Ok(())
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["openvpn_exporter", "openvpn_exporter_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    let config = ExporterConfig::new(
        args.status_paths.iter().map(|p| p.trim().to_string()).collect(),
        args.ignore_individuals,
        args.version,
    );
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        process::exit(2);
    }
    if let Err(e) = validate_telemetry_path(&args.telemetry_path) {
        error!(error = %e, "invalid configuration");
        process::exit(2);
    }

    let listen_address = normalize_listen_address(&args.listen_address);
    info!(
        version = openvpn_exporter_core::VERSION,
        listen_address = %listen_address,
        telemetry_path = %args.telemetry_path,
        status_paths = ?config.status_paths,
        openvpn_version = %config.version,
        ignore_individuals = config.ignore_individuals,
        "starting openvpn exporter"
    );

    let collector = Collector::new(RealFs::new(), &config);
    for path in collector.missing_paths() {
        warn!(path = %path, "status file does not exist yet, it will be reported as down");
    }

    let state = Arc::new(AppState {
        collector,
        telemetry_path: args.telemetry_path.clone(),
    });

    let app = Router::new()
        .route("/", get(handlers::handle_index::<RealFs>))
        .route(&args.telemetry_path, get(handlers::handle_metrics::<RealFs>))
        .with_state(state)
        .layer(CompressionLayer::new());

    let listener = match tokio::net::TcpListener::bind(listen_address.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %listen_address, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(address = %listen_address, "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutting down");
}
