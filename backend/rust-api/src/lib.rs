#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Visitor quiz flow (attempt state lives in a signed cookie)
        .nest("/api/v1/quiz", quiz_routes())
        // Admin endpoints (mixed: login public, the rest behind the guard)
        .nest("/api/v1/admin", admin_routes(app_state.clone()))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/start", post(handlers::quiz::start_quiz))
        .route("/current", get(handlers::quiz::current_question))
        .route("/answer", post(handlers::quiz::submit_answer))
        .route("/result", get(handlers::quiz::view_result))
        .route("/restart", post(handlers::quiz::restart_quiz))
}

fn admin_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new().route("/login", post(handlers::admin::login));

    // Protected routes (require the signed admin cookie)
    let protected_routes = Router::new()
        .route("/logout", post(handlers::admin::logout))
        .route("/dashboard", get(handlers::admin::dashboard))
        .route("/bank", put(handlers::admin::update_bank))
        .route("/export", get(handlers::admin::export_results))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::admin_guard_middleware,
        ));

    public_routes.merge(protected_routes)
}
