use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::QuestionItem;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("bank file io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bank file parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bank task failed: {0}")]
    Task(String),
}

/// Файл-хранилище банка вопросов. Читается перед каждым запросом, полностью
/// перезаписывается админкой.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    path: PathBuf,
}

impl QuestionBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        QuestionBank { path: path.into() }
    }

    /// Reads the current bank. An absent file means an empty bank; a file that
    /// fails to read or parse also degrades to an empty bank with a warning,
    /// so a broken config never takes the service down.
    pub async fn load(&self) -> Vec<QuestionItem> {
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || read_items(&path)).await;
        match result {
            Ok(Ok(items)) => items,
            Ok(Err(err)) => {
                tracing::warn!(path = %self.path.display(), "failed to load question bank: {err}");
                Vec::new()
            }
            Err(err) => {
                tracing::error!("question bank load task failed: {err}");
                Vec::new()
            }
        }
    }

    /// Atomically replaces the stored bank: the new set is written to a temp
    /// file next to the target and renamed over it, so readers only ever see
    /// the old or the new file, never a partial write.
    pub async fn replace(&self, items: Vec<QuestionItem>) -> Result<(), BankError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_items(&path, &items))
            .await
            .map_err(|err| BankError::Task(err.to_string()))?
    }
}

fn read_items(path: &Path) -> Result<Vec<QuestionItem>, BankError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let items = serde_json::from_str(&raw)?;
    Ok(items)
}

fn write_items(path: &Path, items: &[QuestionItem]) -> Result<(), BankError> {
    let payload = serde_json::to_string_pretty(items)?;
    let tmp = match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => {
            let mut tmp_name = std::ffi::OsString::from(".");
            tmp_name.push(name);
            tmp_name.push(".tmp");
            dir.join(tmp_name)
        }
        _ => {
            return Err(BankError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "bank path has no file name",
            )))
        }
    };
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
