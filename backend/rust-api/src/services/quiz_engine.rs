//! Машина состояний одной попытки: регистрация → ответы → результат →
//! однократное сохранение. Вся валидация входа живёт здесь, границе остаётся
//! только отбрасывать повторные отправки по устаревшему индексу.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::models::{Answer, Label, QuestionItem, SessionState};
use crate::services::result_store::{ResultStore, StoreError};

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+7[0-9]{10}$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("name is empty")]
    EmptyName,
    #[error("phone must be +7 followed by 10 digits")]
    InvalidPhone,
    #[error("question bank is empty")]
    EmptyBank,
}

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("attempt is not complete")]
    NotComplete,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates a fresh attempt. The only place name/phone/bank validation occurs;
/// name and phone are stored trimmed.
pub fn start(name: &str, phone: &str, bank: &[QuestionItem]) -> Result<SessionState, StartError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StartError::EmptyName);
    }
    let phone = phone.trim();
    if !PHONE_RE.is_match(phone) {
        return Err(StartError::InvalidPhone);
    }
    if bank.is_empty() {
        return Err(StartError::EmptyBank);
    }
    Ok(SessionState {
        visitor_name: name.to_string(),
        visitor_phone: phone.to_string(),
        current_index: 0,
        correct_count: 0,
        total: bank.len(),
        answers: Vec::new(),
        result_persisted: false,
        result_id: None,
    })
}

/// The question the visitor should see now, or `None` when the attempt is
/// complete or the live bank no longer has an item at this index.
pub fn current_question<'a>(
    state: &SessionState,
    bank: &'a [QuestionItem],
) -> Option<&'a QuestionItem> {
    if state.current_index >= state.total {
        return None;
    }
    bank.get(state.current_index)
}

/// Records the visitor's choice for the current question and advances the
/// attempt. Returns `false` without touching the state when the attempt is
/// already complete or the live bank has no item at the current index.
pub fn answer_current(state: &mut SessionState, bank: &[QuestionItem], chosen: Label) -> bool {
    if state.current_index >= state.total {
        return false;
    }
    let Some(item) = bank.get(state.current_index) else {
        return false;
    };
    let was_correct = chosen == item.correct;
    state.answers.push(Answer {
        image: item.image.clone(),
        chosen,
        was_correct,
    });
    if was_correct {
        state.correct_count += 1;
    }
    state.current_index += 1;
    true
}

pub fn is_complete(state: &SessionState) -> bool {
    state.current_index >= state.total
}

/// Persists a completed attempt exactly once. The first call writes through
/// the store and records the id in the state; every later call returns that
/// id without writing. On a store failure the state is left untouched, so
/// the caller can retry.
pub async fn finalize_once(
    state: &mut SessionState,
    store: &ResultStore,
) -> Result<i64, FinalizeError> {
    if !is_complete(state) {
        return Err(FinalizeError::NotComplete);
    }
    if state.result_persisted {
        if let Some(id) = state.result_id {
            return Ok(id);
        }
    }
    let id = store.persist(state).await?;
    state.result_persisted = true;
    state.result_id = Some(id);
    Ok(id)
}
