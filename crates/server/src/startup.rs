use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured store and wrap it in the shared handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = service::runtime::open_store(&cfg.storage)
        .await
        .map_err(|e| StartupError::Storage(format!("{e:#}")))?;
    Ok(ServerState::new(store, cfg.storage.register_required_fields.clone()))
}

/// Router with CORS and request tracing, ready to serve.
pub fn app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    shutdown_on(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires; never resolves if listening failed.
async fn shutdown_on(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!(event = "shutdown_signal", "received Ctrl+C, draining in-flight requests"),
        Err(e) => {
            // 无法监听信号时不要立即停机，保持运行
            error!(event = "shutdown_signal", error = %e, "failed to listen for Ctrl+C; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let state = build_state(&cfg).await?;
    let app = app(state);

    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    info!(
        %addr,
        backend = ?cfg.storage.backend,
        root = %cfg.storage.root.display(),
        "farm save server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
