use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

const QUIZ_COOKIE: &str = "quiz_session";

#[tokio::test]
async fn test_start_rejects_blank_name() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "   ", "phone": "+79991234567"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Введите имя");
}

#[tokio::test]
async fn test_start_rejects_bad_phone() {
    let (app, _dir) = common::create_test_app().await;

    for phone in [
        "89991234567",
        "+7999123456",
        "+7 999 123 45 67",
        "+79991234567x",
    ] {
        let response = send(
            &app,
            "POST",
            "/api/v1/quiz/start",
            None,
            Some(json!({"name": "Алиса", "phone": phone})),
        )
        .await;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "phone {:?} must be rejected",
            phone
        );
        let body = json_body(response).await;
        assert_eq!(body["error"], "Введите номер в формате +7XXXXXXXXXX");
    }
}

#[tokio::test]
async fn test_start_accepts_valid_input_and_sets_cookie() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "  Алиса  ", "phone": "+79991234567"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    common::cookie_pair(&response, QUIZ_COOKIE).expect("quiz cookie must be set");

    let body = json_body(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["index"], 0);
    assert_eq!(body["total"], 2);
    assert_eq!(body["image"], "phishing_mail.png");
}

#[tokio::test]
async fn test_start_with_empty_bank_is_rejected() {
    let (app, _dir) = common::create_test_app_with_bank("[]").await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Нет доступных карточек для викторины. Обратитесь к администратору."
    );
}

#[tokio::test]
async fn test_full_quiz_flow() {
    let (app, _dir) = common::create_test_app().await;

    // Старт: выдаётся первый вопрос
    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    // Текущий вопрос совпадает с выданным на старте
    let response = send(&app, "GET", "/api/v1/quiz/current", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["index"], 0);
    assert_eq!(body["image"], "phishing_mail.png");

    // Верный ответ на первый вопрос
    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 0, "answer": "spam"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["index"], 1);
    assert_eq!(body["image"], "bank_notice.png");

    // Неверный ответ на второй
    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 1, "answer": "spam"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["index"], 2);

    // Результат: один балл из двух, ответы в исходном порядке
    let response = send(&app, "GET", "/api/v1/quiz/result", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["name"], "Алиса");
    assert_eq!(body["correct"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["answers"][0]["image"], "phishing_mail.png");
    assert_eq!(body["answers"][0]["answer"], "spam");
    assert_eq!(body["answers"][0]["correct"], true);
    assert_eq!(body["answers"][1]["image"], "bank_notice.png");
    assert_eq!(body["answers"][1]["correct"], false);
    assert!(body["result_id"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn test_replayed_answer_is_discarded() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 0, "answer": "spam"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    // Повтор уже отвеченного вопроса: попытка не двигается, счёт не меняется
    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 0, "answer": "not_spam"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::cookie_pair(&response, QUIZ_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["index"], 1);

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 1, "answer": "not_spam"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    // Оба ответа верные: повтор не перезаписал балл за первый вопрос
    let response = send(&app, "GET", "/api/v1/quiz/result", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert_eq!(body["correct"], 2);
}

#[tokio::test]
async fn test_answer_after_completion_is_noop() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = complete_quiz(&app, "Алиса", "+79991234567").await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 2, "answer": "spam"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(common::cookie_pair(&response, QUIZ_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["index"], 2);
}

#[tokio::test]
async fn test_result_is_finalized_once() {
    let (app, _dir) = common::create_test_app().await;
    let cookie = complete_quiz(&app, "Алиса", "+79991234567").await;

    let response = send(&app, "GET", "/api/v1/quiz/result", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();
    let first = json_body(response).await;

    // Повторный просмотр возвращает ту же запись, а не создаёт новую
    let response = send(&app, "GET", "/api/v1/quiz/result", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;

    assert_eq!(first["result_id"], second["result_id"]);
    assert_eq!(first["correct"], second["correct"]);
}

#[tokio::test]
async fn test_result_before_completion_reports_progress() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    let response = send(&app, "GET", "/api/v1/quiz/result", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["index"], 0);
}

#[tokio::test]
async fn test_current_without_session_returns_404() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(&app, "GET", "/api/v1/quiz/current", None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Session not found");
}

#[tokio::test]
async fn test_forged_session_cookie_is_rejected() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "GET",
        "/api/v1/quiz/current",
        Some("quiz_session=forged-value"),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restart_drops_session() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    let response = send(&app, "POST", "/api/v1/quiz/restart", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let removal = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("quiz_session="))
        .expect("removal cookie must be set");
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_bank_shrink_drops_active_session() {
    let (app, dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 0, "answer": "spam"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    // Банк заменили на один вопрос, пока попытка стояла на втором
    std::fs::write(
        dir.path().join("config.json"),
        r#"[{"image": "only.png", "correct": "spam"}]"#,
    )
    .unwrap();

    let response = send(&app, "GET", "/api/v1/quiz/current", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let removal = response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("quiz_session="))
        .expect("session cookie must be dropped");
    assert!(removal.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_unknown_answer_label_is_rejected() {
    let (app, _dir) = common::create_test_app().await;

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": "Алиса", "phone": "+79991234567"})),
    )
    .await;
    let cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    let response = send(
        &app,
        "POST",
        "/api/v1/quiz/answer",
        Some(&cookie),
        Some(json!({"question": 0, "answer": "banana"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Попытка не сдвинулась
    let response = send(&app, "GET", "/api/v1/quiz/current", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert_eq!(body["index"], 0);
}

/// Проходит викторину целиком (оба раза отвечая «спам») и возвращает
/// cookie завершённой попытки.
async fn complete_quiz(app: &axum::Router, name: &str, phone: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/v1/quiz/start",
        None,
        Some(json!({"name": name, "phone": phone})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let mut cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();

    for question in 0..2 {
        let response = send(
            app,
            "POST",
            "/api/v1/quiz/answer",
            Some(&cookie),
            Some(json!({"question": question, "answer": "spam"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        cookie = common::cookie_pair(&response, QUIZ_COOKIE).unwrap();
    }

    cookie
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::http::Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(pair) = cookie {
        builder = builder.header("cookie", pair);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body is not JSON: {} ({})",
            String::from_utf8_lossy(&bytes),
            e
        )
    })
}
