//! HTTP front-end over `ChangelogGenerator`.
//!
//! - `GET /api/changelog`: structured JSON changelog
//! - `POST /changelog`: Markdown download

pub mod error;
pub mod routes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::changelog::ChangelogGenerator;
use crate::config::{Config, GithubConfig};
use crate::error::Result;

pub type SharedGenerators = Arc<GeneratorPool>;

struct PooledGenerator {
    generator: Arc<ChangelogGenerator>,
    last_used: u64,
}

#[derive(Default)]
struct PoolState {
    clock: u64,
    generators: HashMap<String, PooledGenerator>,
}

/// One generator per credential, so each caller's cache outlives a request.
/// Requests without a credential use `default_token`. At most `capacity`
/// generators are kept; the least recently used one is dropped first.
pub struct GeneratorPool {
    config: GithubConfig,
    default_token: Option<String>,
    capacity: usize,
    state: Mutex<PoolState>,
}

impl GeneratorPool {
    pub fn new(config: GithubConfig, default_token: Option<String>, capacity: usize) -> Self {
        Self {
            config,
            default_token,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState::default()),
        }
    }

    pub fn for_token(&self, token: Option<String>) -> Result<Arc<ChangelogGenerator>> {
        let token = token.or_else(|| self.default_token.clone());
        let key = token.clone().unwrap_or_default();

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.clock += 1;
        let now = state.clock;
        if let Some(entry) = state.generators.get_mut(&key) {
            entry.last_used = now;
            return Ok(entry.generator.clone());
        }

        let generator = Arc::new(ChangelogGenerator::from_config(token, &self.config)?);
        if state.generators.len() >= self.capacity {
            let oldest = state
                .generators
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                state.generators.remove(&oldest);
                debug!("generator pool full, evicted least recently used entry");
            }
        }
        state.generators.insert(
            key,
            PooledGenerator {
                generator: generator.clone(),
                last_used: now,
            },
        );
        Ok(generator)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .generators
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn create_router(generators: SharedGenerators) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::routes(generators)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: Config, default_token: Option<String>) -> anyhow::Result<()> {
    let generators = Arc::new(GeneratorPool::new(
        config.github,
        default_token,
        config.server.max_generators,
    ));
    let app = create_router(generators);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
