use serde::{Deserialize, Serialize};

use super::QuestionItem;
use super::result::ResultRecord;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Full replacement payload for the question bank. Entries without a usable
/// image are skipped; a missing or unrecognized label means "not_spam".
#[derive(Debug, Deserialize)]
pub struct UpdateBankRequest {
    pub items: Vec<BankEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BankEntry {
    pub image: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateBankResponse {
    pub accepted: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub results: Vec<ResultRecord>,
    pub bank: Vec<QuestionItem>,
}
