use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::fonts::FontSet;
use crate::settings::Settings;

use super::generate::{ServerError, generate_image};
use super::models::ErrorResponse;
use super::rate_limit::RateLimiter;
use super::state::ServerState;

pub async fn run_server(settings: Settings, fonts: FontSet) -> Result<()> {
    let addr = format!("0.0.0.0:{}", settings.port);
    let limiter = RateLimiter::new(
        Duration::from_secs(settings.rate_window_secs),
        settings.rate_max_requests,
    );
    let body_limit = settings.body_limit_bytes;
    let state = Arc::new(ServerState {
        settings,
        fonts: Arc::new(fonts),
        limiter,
    });
    let app = router(state).layer(DefaultBodyLimit::max(body_limit));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    tracing::info!("listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Unknown paths fall back at the router level; wrong methods on known
/// paths fall back at the method-router level. Both answer 403.
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(health).fallback(forbidden))
        .route("/generate", post(generate).fallback(forbidden))
        .fallback(forbidden)
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state,
            rate_limit_middleware,
        ))
}

async fn health() -> &'static str {
    "og-image-server is running"
}

/// Every route other than `/` and `POST /generate` is forbidden.
async fn forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new("Forbidden")),
    )
}

async fn rate_limit_middleware(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.limiter.try_acquire(addr.ip()) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("Too many requests")),
        )
            .into_response();
    }
    next.run(request).await
}

async fn generate(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let result = tokio::task::spawn_blocking(move || {
        generate_image(state.as_ref(), api_key.as_deref(), payload)
    })
    .await;
    match result {
        Ok(Ok(image)) => {
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, image.content_type)],
                image.bytes,
            )
                .into_response();
            if let Some(disposition) = image
                .attachment
                .as_deref()
                .and_then(|value| value.parse().ok())
            {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, disposition);
            }
            response
        }
        Ok(Err(err)) => err.into_response(),
        Err(join_err) => {
            tracing::error!("render task failed: {}", join_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to render image")),
            )
                .into_response()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let settings = Settings::default();
        let limiter = RateLimiter::new(
            Duration::from_secs(settings.rate_window_secs),
            settings.rate_max_requests,
        );
        let state = Arc::new(ServerState {
            settings,
            fonts: Arc::new(FontSet::from_data(
                "Test Face",
                b"reg".to_vec(),
                b"bold".to_vec(),
                b"ital".to_vec(),
            )),
            limiter,
        });
        router(state)
    }

    async fn send(method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
        let response = test_router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn wrong_method_on_known_paths_is_forbidden() {
        let (status, body) = send(Method::GET, "/generate").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");

        let (status, body) = send(Method::POST, "/").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn unknown_paths_are_forbidden() {
        let (status, body) = send(Method::GET, "/nope").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn health_check_is_reachable() {
        let (status, _) = send(Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
    }
}
