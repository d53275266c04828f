use serde::{Deserialize, Serialize};

use super::{Answer, Label};

#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Index of the question this submission answers. A stale index (already
    /// advanced past) makes the request a no-op instead of double-counting.
    pub question: usize,
    pub answer: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    InProgress,
    Completed,
}

/// Phase-shaped reply shared by start/current/answer so the client always
/// knows which screen to show next.
#[derive(Debug, Serialize)]
pub struct QuizStateResponse {
    pub status: QuizPhase,
    pub index: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResultResponse {
    pub status: QuizPhase,
    pub name: String,
    pub correct: u32,
    pub total: usize,
    pub answers: Vec<AnswerView>,
    pub result_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AnswerView {
    pub image: String,
    pub answer: Label,
    pub correct: bool,
}

impl From<&Answer> for AnswerView {
    fn from(answer: &Answer) -> Self {
        AnswerView {
            image: answer.image.clone(),
            answer: answer.chosen,
            correct: answer.was_correct,
        }
    }
}
