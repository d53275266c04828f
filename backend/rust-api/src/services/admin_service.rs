use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::admin::BankEntry;
use crate::models::result::ResultRecord;
use crate::models::{Label, QuestionItem};
use crate::services::question_bank::{BankError, QuestionBank};
use crate::services::result_store::{ResultStore, StoreError};

pub const CSV_HEADER: &str = "name,phone,correct_answers,total_questions,created_at";

#[derive(Debug, Error)]
pub enum UpdateBankError {
    #[error("update contains no valid entries")]
    Empty,
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Админские операции: проверка пары логин/пароль, полная замена банка
/// вопросов, данные для дашборда и строки экспорта.
pub struct AdminService {
    bank: QuestionBank,
    results: ResultStore,
    admin_username: String,
    admin_password: String,
}

impl AdminService {
    pub fn new(
        bank: QuestionBank,
        results: ResultStore,
        admin_username: String,
        admin_password: String,
    ) -> Self {
        Self {
            bank,
            results,
            admin_username,
            admin_password,
        }
    }

    /// Plain comparison against the configured pair. No hashing or lockout;
    /// the credential source is deployment configuration.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }

    /// Replaces the whole bank from admin input. Entries without a usable
    /// image are skipped and a missing or unrecognized label means "not_spam".
    /// An update that filters down to nothing is rejected so the existing
    /// bank is never overwritten with an empty one.
    pub async fn update_bank(&self, entries: Vec<BankEntry>) -> Result<usize, UpdateBankError> {
        let items: Vec<QuestionItem> = entries
            .into_iter()
            .filter_map(|entry| {
                let image = entry.image?;
                let image = image.trim();
                if image.is_empty() {
                    return None;
                }
                let correct = entry
                    .label
                    .as_deref()
                    .map_or(Label::NotSpam, Label::parse_lenient);
                Some(QuestionItem {
                    image: image.to_string(),
                    correct,
                })
            })
            .collect();

        if items.is_empty() {
            return Err(UpdateBankError::Empty);
        }

        let accepted = items.len();
        self.bank.replace(items).await?;
        tracing::info!(accepted, "question bank replaced");
        Ok(accepted)
    }

    pub async fn dashboard(&self) -> Result<(Vec<ResultRecord>, Vec<QuestionItem>), StoreError> {
        let results = self.results.list_all().await?;
        let bank = self.bank.load().await;
        Ok((results, bank))
    }

    pub async fn export_rows(&self) -> Result<Vec<ResultRecord>, StoreError> {
        self.results.list_all().await
    }
}

/// Escapes CSV field to prevent formula injection attacks.
/// Prefixes dangerous characters (=, +, @, -, tab, newline) with a tab to neutralize them.
/// Also wraps fields containing special characters in quotes.
fn escape_csv_field(value: &str) -> String {
    // Prevent formula injection by prefixing dangerous characters with tab
    let sanitized = if value.starts_with(['=', '+', '@', '-', '\t', '\r', '\n']) {
        format!("\t{}", value)
    } else {
        value.to_string()
    };

    // Escape quotes and wrap in quotes if contains special characters
    if sanitized.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", sanitized.replace('"', "\"\""))
    } else {
        sanitized
    }
}

pub fn csv_line(record: &ResultRecord) -> String {
    format!(
        "{},{},{},{},{}",
        escape_csv_field(&record.name),
        escape_csv_field(&record.phone),
        record.correct_answers,
        record.total_questions,
        escape_csv_field(&record.created_at),
    )
}

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("spam_quiz_results_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
