use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::SignedCookieJar;

use crate::services::AppState;

pub const ADMIN_COOKIE: &str = "admin_session";

/// Middleware для защиты админских маршрутов: пропускает только запросы с
/// валидной подписанной админской cookie.
pub async fn admin_guard_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let jar = SignedCookieJar::from_headers(request.headers(), state.cookie_key.clone());
    match jar.get(ADMIN_COOKIE) {
        Some(cookie) if cookie.value() == "1" => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Access denied: admin session required");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
