use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{
    delete_email, get_email, health_check, list_emails, subscribe, update_email, AppState,
};
use crate::middleware::logging_middleware;
use crate::rate_limiter::start_sweeper;

/// Build the router over the given state. Kept separate from `Server` so
/// tests can drive the app without binding a socket.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/emails", get(list_emails).post(subscribe))
        .route(
            "/api/emails/:id",
            get(get_email)
                .delete(delete_email)
                .patch(update_email),
        )
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let state = AppState::from_config(&config);
        Self { config, state }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = create_app(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        // The sweep runs for the lifetime of the server and is cancelled
        // once graceful shutdown completes.
        let sweeper = start_sweeper(Arc::clone(&self.state.limiter));

        tracing::info!("waitlist server listening on {}", self.config.bind_addr);
        tracing::info!("signup endpoint at /api/emails, health check at /health");

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        sweeper.abort();
        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
