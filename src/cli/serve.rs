//! Serve command implementation

use crate::agent::build_adapters;
use crate::api::{create_router, AppState};
use crate::circuit::{CircuitBreaker, JsonFileStore};
use crate::classifier::{CategoryClassifier, ChatCompletionsTransport, OllamaGenerateTransport};
use crate::cli::ServeArgs;
use crate::config::{LogFormat, RouterConfig};
use crate::metrics::{MetricsCollector, MetricsSink};
use crate::routing::{ConfigStore, Provider, RoutingEngine};
use crate::session::SessionTracker;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<(RouterConfig, Option<PathBuf>), Box<dyn std::error::Error>> {
    let (mut config, path) = if args.config.exists() {
        (
            RouterConfig::load(Some(&args.config))?,
            Some(args.config.clone()),
        )
    } else {
        tracing::debug!("Config file not found, using defaults");
        (RouterConfig::default(), None)
    };

    config = config.with_env_overrides();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(mode) = args.mode {
        config.routing.mode = mode;
    }

    Ok((config, path))
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. Message previews will be logged.");
        eprintln!("         This may include sensitive data. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Build the routing engine and everything it owns from configuration.
///
/// Both classifier transports are always registered, so a reload that
/// switches the routing mode takes effect without a restart.
pub fn build_engine(
    config: &RouterConfig,
    client: reqwest::Client,
    metrics: Arc<dyn MetricsSink>,
) -> Result<RoutingEngine, Box<dyn std::error::Error>> {
    let table = config.routing_table()?;

    let local = &config.classifier.local;
    let remote = &config.classifier.remote;
    let remote_provider = config.providers.get(remote.provider);
    let mut remote_base = remote_provider.base_url(remote.provider);
    if remote.provider == Provider::Ollama {
        remote_base = format!("{}/v1", remote_base.trim_end_matches('/'));
    }

    let sessions = Arc::new(SessionTracker::new());
    let classifier = CategoryClassifier::new(sessions)
        .with_max_prompt_chars(config.classifier.max_prompt_chars)
        .with_local(
            Arc::new(OllamaGenerateTransport::new(
                client.clone(),
                &local.base_url,
                &local.model,
            )),
            local.timeout(),
        )
        .with_remote(
            Arc::new(ChatCompletionsTransport::new(
                client.clone(),
                remote_base,
                &remote.model,
                remote_provider.api_key(remote.provider),
            )),
            remote.timeout(),
        );

    let circuit = match &config.circuit_breaker.state_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Persisting circuit state");
            CircuitBreaker::with_store(
                config.circuit_breaker.clone(),
                Arc::new(JsonFileStore::new(path)),
            )?
        }
        None => CircuitBreaker::new(config.circuit_breaker.clone()),
    };

    let adapters = build_adapters(&config.providers, client);

    Ok(RoutingEngine::new(
        Arc::new(ConfigStore::new(table)),
        classifier,
        Arc::new(circuit),
        adapters,
        metrics,
    )
    .with_attempt_timeout(Duration::from_secs(config.routing.attempt_timeout_seconds))
    .with_content_logging(config.logging.enable_content_logging))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_path) = load_config_with_overrides(&args)?;
    config.validate()?;

    init_tracing(&config.logging)?;

    tracing::info!(mode = %config.routing.mode, "Starting llm-router");
    tracing::debug!(?config, "Loaded configuration");

    let start_time = Instant::now();
    let prometheus_handle = match crate::metrics::setup_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder unavailable, /metrics will be empty");
            None
        }
    };
    let metrics = Arc::new(MetricsCollector::new(start_time, prometheus_handle));

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .build()?;
    let engine = build_engine(&config, client, metrics.clone())?;

    for (name, category) in &config.categories {
        tracing::info!(
            category = %name,
            models = category.models.len(),
            keywords = category.keywords.len(),
            "Category loaded"
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let engine = Arc::new(engine);
    let state = Arc::new(AppState::new(
        engine.clone(),
        metrics,
        config,
        config_path,
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "llm-router listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    engine.circuit().flush().await;
    tracing::info!("llm-router stopped");
    Ok(())
}
