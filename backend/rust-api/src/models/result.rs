use serde::Serialize;

use super::Label;

/// One persisted attempt, as stored in the `results` table.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub correct_answers: i64,
    pub total_questions: i64,
    /// UTC, `YYYY-MM-DDTHH:MM:SS`.
    pub created_at: String,
}

/// Per-question breakdown row from the `answers` table.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub id: i64,
    pub result_id: i64,
    pub image_name: String,
    pub user_answer: Label,
    pub is_correct: bool,
}
