use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;
use time::Duration;

use crate::extractors::AppJson;
use crate::handlers::{removal_cookie, ApiError};
use crate::metrics;
use crate::models::{
    quiz::{
        AnswerView, QuizPhase, QuizResultResponse, QuizStateResponse, StartQuizRequest,
        SubmitAnswerRequest,
    },
    QuestionItem, SessionState,
};
use crate::services::{quiz_engine, quiz_engine::StartError, AppState, SignedCookieJar};

/// Имя cookie, в которой живёт подписанное состояние текущей попытки.
pub const QUIZ_COOKIE: &str = "quiz_session";

pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar,
    AppJson(req): AppJson<StartQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Starting new quiz attempt");

    let bank = state.bank.load().await;
    let session = quiz_engine::start(&req.name, &req.phone, &bank)
        .map_err(|e| ApiError::bad_request(start_error_message(&e)))?;

    metrics::ATTEMPTS_TOTAL.with_label_values(&["started"]).inc();
    tracing::info!(total = session.total, "quiz attempt started");

    let response = phase_response(&session, &bank);
    let jar = jar.add(session_cookie(&session)?);
    Ok((StatusCode::CREATED, jar, Json(response)))
}

pub async fn current_question(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar,
) -> Result<Response, ApiError> {
    let session = read_session(&jar).ok_or_else(|| ApiError::not_found("Session not found"))?;

    let bank = state.bank.load().await;
    if !quiz_engine::is_complete(&session)
        && quiz_engine::current_question(&session, &bank).is_none()
    {
        return Ok(drop_shrunk_session(&session, &bank, jar));
    }

    Ok(Json(phase_response(&session, &bank)).into_response())
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<Response, ApiError> {
    let mut session =
        read_session(&jar).ok_or_else(|| ApiError::not_found("Session not found"))?;
    let bank = state.bank.load().await;

    // Повтор за уже отвеченный вопрос или ответ после завершения:
    // состояние не трогаем, просто возвращаем его текущую фазу.
    if quiz_engine::is_complete(&session) || req.question != session.current_index {
        tracing::debug!(
            submitted = req.question,
            current = session.current_index,
            "discarding out-of-sequence answer"
        );
        return Ok(Json(phase_response(&session, &bank)).into_response());
    }

    if !quiz_engine::answer_current(&mut session, &bank, req.answer) {
        return Ok(drop_shrunk_session(&session, &bank, jar));
    }

    let was_correct = session.answers.last().map(|a| a.was_correct).unwrap_or(false);
    metrics::ANSWERS_SUBMITTED_TOTAL
        .with_label_values(&[if was_correct { "true" } else { "false" }])
        .inc();

    let response = phase_response(&session, &bank);
    let jar = jar.add(session_cookie(&session)?);
    Ok((jar, Json(response)).into_response())
}

pub async fn view_result(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar,
) -> Result<Response, ApiError> {
    let mut session =
        read_session(&jar).ok_or_else(|| ApiError::not_found("Session not found"))?;

    if !quiz_engine::is_complete(&session) {
        // Попытка ещё идёт, на страницу результата рано.
        let bank = state.bank.load().await;
        return Ok(Json(phase_response(&session, &bank)).into_response());
    }

    let newly_persisted = !session.result_persisted;
    let result_id = quiz_engine::finalize_once(&mut session, &state.results)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist quiz result: {}", e);
            ApiError::internal("Failed to save result")
        })?;

    if newly_persisted {
        metrics::RESULTS_PERSISTED_TOTAL.inc();
        metrics::ATTEMPTS_TOTAL
            .with_label_values(&["completed"])
            .inc();
        tracing::info!(
            result_id,
            correct = session.correct_count,
            total = session.total,
            "quiz attempt finalized"
        );
    }

    let response = QuizResultResponse {
        status: QuizPhase::Completed,
        name: session.visitor_name.clone(),
        correct: session.correct_count,
        total: session.total,
        answers: session.answers.iter().map(AnswerView::from).collect(),
        result_id,
    };
    let jar = jar.add(session_cookie(&session)?);
    Ok((jar, Json(response)).into_response())
}

pub async fn restart_quiz(jar: SignedCookieJar) -> impl IntoResponse {
    tracing::info!("Restarting quiz, dropping current session");
    (StatusCode::NO_CONTENT, jar.remove(removal_cookie(QUIZ_COOKIE)))
}

fn start_error_message(error: &StartError) -> &'static str {
    match error {
        StartError::EmptyName => "Введите имя",
        StartError::InvalidPhone => "Введите номер в формате +7XXXXXXXXXX",
        StartError::EmptyBank => {
            "Нет доступных карточек для викторины. Обратитесь к администратору."
        }
    }
}

/// Достаёт состояние попытки из подписанной cookie. Повреждённое или
/// рассогласованное состояние равнозначно отсутствию сессии.
fn read_session(jar: &SignedCookieJar) -> Option<SessionState> {
    let cookie = jar.get(QUIZ_COOKIE)?;
    let raw = general_purpose::URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
    let session: SessionState = serde_json::from_slice(&raw).ok()?;
    session.is_consistent().then_some(session)
}

fn session_cookie(session: &SessionState) -> Result<Cookie<'static>, ApiError> {
    // JSON кодируется в base64: в значении cookie допустим только узкий
    // ASCII-набор, а имя посетителя может быть кириллицей.
    let payload = serde_json::to_string(session)
        .map_err(|e| ApiError::internal(format!("Failed to encode session: {}", e)))?;
    let mut cookie = Cookie::new(QUIZ_COOKIE, general_purpose::URL_SAFE_NO_PAD.encode(payload));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::hours(12));
    Ok(cookie)
}

fn phase_response(session: &SessionState, bank: &[QuestionItem]) -> QuizStateResponse {
    if quiz_engine::is_complete(session) {
        QuizStateResponse {
            status: QuizPhase::Completed,
            index: session.current_index,
            total: session.total,
            image: None,
        }
    } else {
        QuizStateResponse {
            status: QuizPhase::InProgress,
            index: session.current_index,
            total: session.total,
            image: quiz_engine::current_question(session, bank).map(|item| item.image.clone()),
        }
    }
}

/// Банк заменили на меньший, пока попытка шла: продолжать нечем,
/// сессия сбрасывается.
fn drop_shrunk_session(session: &SessionState, bank: &[QuestionItem], jar: SignedCookieJar) -> Response {
    tracing::warn!(
        index = session.current_index,
        bank_size = bank.len(),
        "question bank shrank below active attempt, dropping session"
    );
    let jar = jar.remove(removal_cookie(QUIZ_COOKIE));
    (
        StatusCode::NOT_FOUND,
        jar,
        Json(json!({ "error": "Session not found" })),
    )
        .into_response()
}
