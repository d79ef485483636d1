//! Job Triage Server
//!
//! Classifies jobs described during a live call and recommends how the whole
//! call should be handled: instant quote, video assessment, site visit or
//! specialist referral.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use jobtriage_server::{create_router, AppState, Overrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "jobtriage-server")]
#[command(about = "Tiered job-complexity triage server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Disable Tier 2 escalation regardless of configuration
    #[arg(long)]
    no_tier2: bool,

    /// Base URL of the OpenAI-compatible Tier 2 endpoint
    #[arg(long, env = "JOBTRIAGE_TIER2_URL")]
    tier2_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen: self.listen.clone(),
            port: self.port,
            no_tier2: self.no_tier2,
            tier2_url: self.tier2_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    info!("Starting job triage server");

    let config = ServerConfig::load(&cli.config, &cli.overrides())?;
    info!(
        threshold = config.classifier.escalation_threshold,
        tier2 = config.classifier.tier2.enabled,
        audit = config.audit.enabled,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;

    let shutdown_token = CancellationToken::new();
    let state = AppState::from_config(&config)?
        .with_prometheus(metrics_handle)
        .with_shutdown(shutdown_token.clone());
    info!(
        signals = state.classifier.lexical().signal_count(),
        tier2_active = state.classifier.tier2_active(),
        "Classifier ready"
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // In-flight Tier 2 calls give up as soon as shutdown starts
    let shutdown = async move {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
        shutdown_token.cancel();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("jobtriage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobtriage=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Install the Prometheus recorder and describe the triage metrics
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "jobtriage_jobs_classified_total",
        "Jobs classified by traffic light and deciding tier"
    );
    metrics::describe_counter!(
        "jobtriage_tier2_outcomes_total",
        "Tier 2 escalation outcomes"
    );
    metrics::describe_histogram!(
        "jobtriage_classification_latency_us",
        metrics::Unit::Microseconds,
        "Per-job classification latency in microseconds"
    );
    metrics::describe_counter!(
        "jobtriage_calls_total",
        "Calls classified by recommended route"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
