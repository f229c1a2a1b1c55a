//! coursegate service entrypoint.
//!
//! Loads and validates configuration, connects the PostgreSQL pool, wires
//! the adapters into the application handlers, starts the background
//! fulfillment worker, and serves the HTTP API. Shutdown is coordinated:
//! the HTTP server drains first, then the worker finishes queued and
//! in-flight fulfillment runs so no processing lock is abandoned by a clean
//! exit.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coursegate::adapters::email::SmtpNotifier;
use coursegate::adapters::http::fulfillment::dto::ConfigReport;
use coursegate::adapters::http::fulfillment::{app_router, FulfillmentAppState};
use coursegate::adapters::postgres::{
    PostgresBatchRepository, PostgresLockStore, PostgresPaymentRepository, PostgresUserRepository,
};
use coursegate::adapters::queue::ChannelFulfillmentQueue;
use coursegate::adapters::telegram::TelegramInviteProvisioner;
use coursegate::application::handlers::fulfillment::{FulfillPaymentHandler, PollConfig};
use coursegate::application::worker::FulfillmentWorker;
use coursegate::config::AppConfig;
use coursegate::domain::fulfillment::{FulfillmentSettings, WebhookSignatureVerifier};
use coursegate::ports::{
    BatchRepository, FulfillmentNotifier, FulfillmentQueue, InviteProvisioner, PaymentRepository,
    ProcessingLockStore, UserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    // Persistence adapters.
    let payments: Arc<dyn PaymentRepository> =
        Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let batches: Arc<dyn BatchRepository> = Arc::new(PostgresBatchRepository::new(pool.clone()));
    let locks: Arc<dyn ProcessingLockStore> = Arc::new(PostgresLockStore::new(pool));

    // External collaborators.
    let provisioner: Arc<dyn InviteProvisioner> =
        Arc::new(TelegramInviteProvisioner::new(config.telegram.clone()));
    let notifier: Arc<dyn FulfillmentNotifier> = Arc::new(SmtpNotifier::new(&config.email)?);

    // Settings snapshot passed into every unit of work.
    let settings = FulfillmentSettings::new(
        config.email.from_name.clone(),
        config.email.from_email.clone(),
    );

    // Background worker behind the bounded queue.
    let (queue, jobs) = ChannelFulfillmentQueue::bounded(config.server.queue_capacity);
    let orchestrator = Arc::new(FulfillPaymentHandler::new(
        payments.clone(),
        users.clone(),
        batches.clone(),
        locks.clone(),
        provisioner,
        notifier,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(FulfillmentWorker::new(orchestrator, jobs).run(shutdown_rx));

    let state = FulfillmentAppState {
        payments,
        users,
        batches,
        locks,
        queue: Arc::new(queue) as Arc<dyn FulfillmentQueue>,
        verifier: WebhookSignatureVerifier::new(config.payment.webhook_secret.clone()),
        settings,
        poll: PollConfig::default(),
        config_report: ConfigReport::from_config(&config),
    };

    let mut app = app_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let cors_origins = config.server.cors_origins_list();
    if !cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        app = app.layer(CorsLayer::new().allow_origin(AllowOrigin::list(origins)));
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "coursegate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server has drained; let the worker finish queued and in-flight
    // fulfillment runs before the process exits.
    tracing::info!("http server stopped; draining fulfillment worker");
    let _ = shutdown_tx.send(true);
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
