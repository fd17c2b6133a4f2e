//! viewsmith server entry point
//!
//! Wires the pipeline together: configuration, the model gateway, the
//! process-wide scope registry, one session, the project store, and the
//! axum facade the shell talks to.

mod config;
mod constants;
mod http;

use std::sync::Arc;

use viewsmith_pipeline::{
    HttpGateway, ProjectStore, PromptBuilder, SandboxRenderer, ScopeRegistry, Session,
};

use config::AppConfig;
use http::AppState;

fn data_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("viewsmith")
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let dir = data_dir();
    let config = match AppConfig::load(&dir).await {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let api_key = config.effective_api_key();
    if api_key.is_none() {
        log::warn!(
            "no API key configured; set {} or add api_key to {:?}",
            constants::env_keys::API_KEY,
            dir.join("config.json")
        );
    }

    let gateway = Arc::new(HttpGateway::new(config.base_url.clone(), api_key));
    let scopes = Arc::new(ScopeRegistry::new());
    let prompts = PromptBuilder::new(config.simple_model.clone(), config.complex_model.clone());
    let renderer = SandboxRenderer::new(config.sandbox.eval_timeout_ms);

    let state = AppState {
        session: Arc::new(Session::new(gateway, scopes, prompts, renderer)),
        store: Arc::new(ProjectStore::new(dir.join("projects.json"))),
    };

    let app = http::router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind {}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    log::info!("viewsmith listening on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server error: {e}");
        std::process::exit(1);
    }
}
