//! Server Implementation
//!
//! HTTP server startup, background task wiring and graceful shutdown.

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, ServerState};
use crate::services::{AbsenceMonitor, AutoStopService};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (used by tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut tasks = BackgroundTasks::new();

        let state = match self.state {
            Some(s) => s,
            None => ServerState::initialize(&self.config, tasks.shutdown_token()).await,
        };

        // Periodic passes: absence purge and admission control, each on
        // its own timer and cancellation token
        let monitor = AbsenceMonitor::new(
            state.scheduler.clone(),
            self.config.absence_check_period(),
            tasks.shutdown_token(),
        );
        tasks.spawn("absence_monitor", TaskKind::Periodic, monitor.run());

        let auto_stop = AutoStopService::new(
            state.scheduler.clone(),
            self.config.auto_stop_check_period(),
            tasks.shutdown_token(),
        );
        tasks.spawn("auto_stop", TaskKind::Periodic, auto_stop.run());

        let app = api::create_router(state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Gate server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        tasks.shutdown().await;
        Ok(())
    }
}
