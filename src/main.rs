//! Chatterbox server binary.
//!
//! Wires configuration, storage adapters, the connection hub and the HTTP
//! router, then serves until SIGINT/SIGTERM.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chatterbox::adapters::auth::JwtSessionValidator;
use chatterbox::adapters::http::{app_router, AuthState, MessageHandlers};
use chatterbox::adapters::memory::{InMemoryMessageOutbox, InMemoryRelationshipStore};
use chatterbox::adapters::postgres::{PostgresMessageOutbox, PostgresRelationshipChecker};
use chatterbox::adapters::websocket::{FrameDispatcher, Hub, HubBroadcaster, WebSocketState};
use chatterbox::application::handlers::messaging::{
    ConfirmDeliveryHandler, FetchPendingHandler, PollPendingHandler, SubmitMessageHandler,
};
use chatterbox::config::AppConfig;
use chatterbox::ports::{MessageBroadcaster, MessageOutbox, RelationshipChecker, SessionValidator};

const HUB_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (outbox, relationships) = storage(&config).await?;

    let (hub, hub_task) = Hub::spawn();
    let broadcaster: Arc<dyn MessageBroadcaster> = Arc::new(HubBroadcaster::new(hub.clone()));
    let validator: Arc<dyn SessionValidator> = Arc::new(JwtSessionValidator::new(&config.auth));

    let dispatcher = Arc::new(FrameDispatcher::new(
        SubmitMessageHandler::new(
            outbox.clone(),
            relationships,
            broadcaster.clone(),
            config.delivery.outbox_ttl(),
        ),
        ConfirmDeliveryHandler::new(outbox.clone()),
        broadcaster,
    ));
    let fetch = Arc::new(FetchPendingHandler::new(
        outbox,
        config.delivery.page_limits(),
    ));
    let poll = Arc::new(PollPendingHandler::new(
        fetch.clone(),
        config.delivery.to_poll_settings(),
    ));

    let ws_state = WebSocketState::new(
        hub,
        dispatcher,
        validator.clone(),
        config.delivery.to_session_settings(),
    );
    let auth: AuthState = validator;
    let app = app_router(
        ws_state,
        MessageHandlers::new(fetch, poll),
        auth,
        &config.server.cors_origins_list(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "chatterbox listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Upgraded sockets outlive the server future; give their sessions a moment to drain.
    match tokio::time::timeout(HUB_DRAIN_TIMEOUT, hub_task).await {
        Ok(Err(err)) => tracing::warn!(error = %err, "hub task ended abnormally"),
        Err(_) => tracing::warn!("sessions still open at shutdown"),
        Ok(Ok(())) => {}
    }
    tracing::info!("chatterbox stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

async fn storage(
    config: &AppConfig,
) -> Result<(Arc<dyn MessageOutbox>, Arc<dyn RelationshipChecker>), sqlx::Error> {
    match &config.database {
        Some(database) => {
            let pool = database.pool_options().connect(&database.url).await?;
            tracing::info!(
                max_connections = database.max_connections,
                "connected to PostgreSQL"
            );
            let outbox: Arc<dyn MessageOutbox> = Arc::new(PostgresMessageOutbox::new(pool.clone()));
            let relationships: Arc<dyn RelationshipChecker> =
                Arc::new(PostgresRelationshipChecker::new(pool));
            Ok((outbox, relationships))
        }
        None => {
            tracing::warn!("no database configured; pending messages are kept in memory");
            let store = Arc::new(InMemoryRelationshipStore::new());
            let outbox: Arc<dyn MessageOutbox> = Arc::new(InMemoryMessageOutbox::new(store.clone()));
            let relationships: Arc<dyn RelationshipChecker> = store;
            Ok((outbox, relationships))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
