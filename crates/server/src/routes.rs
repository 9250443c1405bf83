pub mod saves;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::{debug, Level};

use common::types::Health;

pub use saves::ServerState;

pub async fn health() -> Json<Health> {
    debug!("health check");
    Json(Health::healthy())
}

async fn metrics() -> (StatusCode, String) {
    crate::metrics::encode_metrics()
}

/// Build the full application router: save routes, their legacy aliases,
/// health and metrics.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let saves = Router::new()
        .route("/register", post(saves::register))
        .route("/login", post(saves::login))
        .route("/save", post(saves::save))
        // 旧版客户端使用的路径
        .route("/load_game", post(saves::login))
        .route("/save_game", post(saves::save))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(saves)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::DEBUG),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
