//! API server initialization (spec §4.9, §6): the admission role's only
//! externally visible surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::auth::{AuthState, require_auth};
use super::middleware;
use super::routes::{self, TasksState};
use crate::broker::Broker;
use crate::core::config::AdmissionConfig;
use crate::core::shutdown::ShutdownService;

pub struct ApiServer {
    broker: Arc<dyn Broker>,
    config: AdmissionConfig,
    shutdown: ShutdownService,
}

impl ApiServer {
    pub fn new(broker: Arc<dyn Broker>, config: AdmissionConfig, shutdown: ShutdownService) -> Self {
        Self {
            broker,
            config,
            shutdown,
        }
    }

    pub async fn start(self) -> Result<()> {
        let Self {
            broker,
            config,
            shutdown,
        } = self;

        let addr = SocketAddr::new(config.host.parse()?, config.port);

        let tasks_state = TasksState {
            broker: broker.clone(),
        };

        let task_routes = Router::new()
            .route("/scrape-rag-task", post(routes::create_tasks))
            .route("/tasks-status", get(routes::tasks_status))
            .with_state(tasks_state)
            .layer(axum::middleware::from_fn_with_state(
                AuthState {
                    jwt_secret: config.jwt_secret.clone(),
                },
                require_auth,
            ));

        let router = Router::new()
            .route("/ping", get(routes::ping))
            .merge(task_routes)
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(middleware::cors());

        tracing::info!(%addr, "Admission API listening");

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(())
    }
}
