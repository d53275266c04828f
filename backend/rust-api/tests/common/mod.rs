#![allow(dead_code)]

use axum::Router;
use spamquiz_api::{config::Config, create_router, services::AppState};
use std::sync::Arc;
use tempfile::TempDir;

/// Два вопроса: первый — спам, второй — нет.
pub const TEST_BANK: &str = r#"[
    {"image": "phishing_mail.png", "correct": "spam"},
    {"image": "bank_notice.png", "correct": "not_spam"}
]"#;

pub async fn create_test_app() -> (Router, TempDir) {
    create_test_app_with_bank(TEST_BANK).await
}

/// Каждый тест получает собственный каталог: свою базу результатов
/// и свой файл банка вопросов. Каталог должен жить, пока жив роутер.
pub async fn create_test_app_with_bank(bank_json: &str) -> (Router, TempDir) {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let dir = TempDir::new().expect("Failed to create temp dir");
    let bank_path = dir.path().join("config.json");
    std::fs::write(&bank_path, bank_json).expect("Failed to seed question bank");

    let config = Config {
        database_path: dir.path().join("quiz.db").to_string_lossy().into_owned(),
        question_bank_path: bank_path.to_string_lossy().into_owned(),
        secret_key: "integration-test-secret".to_string(),
        admin_username: "admin".to_string(),
        admin_password: "secret".to_string(),
    };

    let app_state = Arc::new(
        AppState::new(config)
            .await
            .expect("Failed to initialize test app state"),
    );

    (create_router(app_state), dir)
}

/// Вынимает пару `name=value` из заголовков Set-Cookie ответа,
/// готовую к отправке обратно в заголовке Cookie.
pub fn cookie_pair<B>(response: &axum::http::Response<B>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(|value| value.split(';').next().unwrap_or(value).to_string())
}
