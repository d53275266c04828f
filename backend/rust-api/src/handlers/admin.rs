use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::convert::Infallible;
use std::sync::Arc;
use time::Duration;

use crate::extractors::AppJson;
use crate::handlers::{removal_cookie, ApiError};
use crate::metrics;
use crate::middlewares::auth::ADMIN_COOKIE;
use crate::models::admin::{
    AdminLoginRequest, DashboardResponse, UpdateBankRequest, UpdateBankResponse,
};
use crate::services::{
    admin_service::{csv_line, export_filename, AdminService, UpdateBankError, CSV_HEADER},
    AppState, SignedCookieJar,
};

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar,
    AppJson(req): AppJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = admin_service(&state);

    if !service.verify_credentials(&req.username, &req.password) {
        tracing::warn!(username = %req.username, "admin login rejected");
        return Err(ApiError::unauthorized("Неверный логин или пароль"));
    }

    tracing::info!(username = %req.username, "admin logged in");

    let mut cookie = Cookie::new(ADMIN_COOKIE, "1");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::hours(12));

    Ok((StatusCode::NO_CONTENT, jar.add(cookie)))
}

pub async fn logout(jar: SignedCookieJar) -> impl IntoResponse {
    tracing::info!("Admin logged out");
    (StatusCode::NO_CONTENT, jar.remove(removal_cookie(ADMIN_COOKIE)))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let service = admin_service(&state);

    let (results, bank) = service.dashboard().await.map_err(|e| {
        tracing::error!("Failed to load admin dashboard: {}", e);
        ApiError::internal("Failed to load dashboard")
    })?;

    Ok(Json(DashboardResponse { results, bank }))
}

pub async fn update_bank(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateBankRequest>,
) -> Result<Json<UpdateBankResponse>, ApiError> {
    tracing::info!(entries = req.items.len(), "Updating question bank");

    let service = admin_service(&state);
    match service.update_bank(req.items).await {
        Ok(accepted) => {
            metrics::BANK_UPDATES_TOTAL
                .with_label_values(&["success"])
                .inc();
            Ok(Json(UpdateBankResponse { accepted }))
        }
        Err(UpdateBankError::Empty) => {
            metrics::BANK_UPDATES_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            Err(ApiError::bad_request(
                "Конфигурация должна содержать хотя бы одну карточку",
            ))
        }
        Err(UpdateBankError::Bank(e)) => {
            metrics::BANK_UPDATES_TOTAL
                .with_label_values(&["error"])
                .inc();
            tracing::error!("Failed to save question bank: {}", e);
            Err(ApiError::internal("Failed to save question bank"))
        }
    }
}

pub async fn export_results(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    tracing::info!("Exporting results to CSV");

    let service = admin_service(&state);
    let rows = service.export_rows().await.map_err(|e| {
        tracing::error!("Failed to read results for export: {}", e);
        ApiError::internal("Failed to export results")
    })?;

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!("{}\n", CSV_HEADER));
    for row in &rows {
        lines.push(format!("{}\n", csv_line(row)));
    }

    metrics::EXPORTS_GENERATED_TOTAL
        .with_label_values(&["csv"])
        .inc();
    tracing::info!(rows = rows.len(), "CSV export generated");

    let filename = export_filename(chrono::Utc::now());
    let stream = futures::stream::iter(lines.into_iter().map(Ok::<String, Infallible>));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build export response: {}", e)))
}

fn admin_service(state: &AppState) -> AdminService {
    AdminService::new(
        state.bank.clone(),
        state.results.clone(),
        state.config.admin_username.clone(),
        state.config.admin_password.clone(),
    )
}
