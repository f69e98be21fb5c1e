//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use messaging::{EventPublisher, NatsChannelProvider, PublisherConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{EntityStore, InMemoryStore, PostgresStore};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Builds the event publisher. A missing or unreachable broker disables
/// publishing instead of stopping the service.
async fn connect_publisher(config: &Config) -> EventPublisher {
    let publisher_config = PublisherConfig {
        publish_timeout: config.publish_timeout,
    };

    let Some(url) = config.nats_url.as_deref() else {
        tracing::info!("NATS_URL not set, integration events will not be published");
        return EventPublisher::with_config(None, publisher_config);
    };

    match NatsChannelProvider::connect(url).await {
        Ok(provider) => {
            tracing::info!(url, "connected to NATS");
            EventPublisher::with_config(Some(Arc::new(provider)), publisher_config)
        }
        Err(error) => {
            tracing::warn!(
                url,
                %error,
                "broker unreachable, integration events will not be published"
            );
            EventPublisher::with_config(None, publisher_config)
        }
    }
}

async fn serve<S: EntityStore + Clone + 'static>(
    config: &Config,
    store: S,
    publisher: EventPublisher,
    metrics_handle: PrometheusHandle,
) {
    let shutdown = CancellationToken::new();
    let state = api::create_state(store, publisher, shutdown.clone());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect the broker, if any
    let publisher = connect_publisher(&config).await;

    // 4. Pick the store and serve
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(url, DATABASE_MAX_CONNECTIONS)
                .await
                .expect("failed to connect to PostgreSQL");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL entity store");
            serve(&config, store, publisher, metrics_handle).await;
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory entity store");
            serve(&config, InMemoryStore::new(), publisher, metrics_handle).await;
        }
    }
}
