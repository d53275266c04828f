use serde::{Deserialize, Serialize};

/// Классификация карточки: спам или не спам.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Spam,
    NotSpam,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::NotSpam => "not_spam",
        }
    }

    /// Lenient parse used for admin-supplied values: anything that is not
    /// exactly "spam" falls back to NotSpam. File and API payloads are parsed
    /// strictly through serde instead.
    pub fn parse_lenient(value: &str) -> Label {
        if value == "spam" {
            Label::Spam
        } else {
            Label::NotSpam
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub image: String,
    pub correct: Label,
}

/// One recorded choice; created at submission time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub image: String,
    pub chosen: Label,
    pub was_correct: bool,
}

/// Состояние одной попытки викторины, хранится в подписанной cookie посетителя.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub current_index: usize,
    pub correct_count: u32,
    /// Bank size snapshotted at attempt start; the attempt stays bound to it
    /// even if the bank is edited mid-attempt.
    pub total: usize,
    pub answers: Vec<Answer>,
    pub result_persisted: bool,
    pub result_id: Option<i64>,
}

impl SessionState {
    /// Structural check applied to every state read back from the cookie.
    /// A payload that fails it is treated as "no session".
    pub fn is_consistent(&self) -> bool {
        self.answers.len() == self.current_index
            && (self.correct_count as usize) <= self.current_index
            && self.current_index <= self.total
            && (!self.result_persisted || self.result_id.is_some())
    }
}

pub mod admin;
pub mod quiz;
pub mod result;
