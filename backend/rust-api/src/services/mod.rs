use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::config::Config;
use question_bank::QuestionBank;
use result_store::ResultStore;

pub struct AppState {
    pub config: Config,
    pub bank: QuestionBank,
    pub results: ResultStore,
    pub cookie_key: Key,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let cookie_key = derive_cookie_key(&config.secret_key);

        tracing::info!("Opening results database at {}", config.database_path);
        let results = ResultStore::open(&config.database_path)
            .await
            .context("failed to open results database")?;

        // Test connection
        results
            .ping()
            .await
            .context("results database ping failed")?;
        tracing::info!("Results database ready");

        let bank = QuestionBank::new(&config.question_bank_path);
        let items = bank.load().await;
        tracing::info!("Question bank loaded: {} items", items.len());

        Ok(Self {
            config,
            bank,
            results,
            cookie_key,
        })
    }
}

// Lets SignedCookieJar extract its key straight from the shared state.
// The orphan rule forbids `impl FromRef<Arc<AppState>> for Key` (all three
// are foreign types), so the jar is parameterized with this local newtype.
#[derive(Clone)]
pub struct CookieKey(Key);

impl From<CookieKey> for Key {
    fn from(key: CookieKey) -> Key {
        key.0
    }
}

impl FromRef<Arc<AppState>> for CookieKey {
    fn from_ref(state: &Arc<AppState>) -> CookieKey {
        CookieKey(state.cookie_key.clone())
    }
}

pub type SignedCookieJar = axum_extra::extract::cookie::SignedCookieJar<CookieKey>;

/// Ключ подписи cookie выводится из SECRET_KEY: SHA-512 даёт ровно те 64
/// байта, которых требует `Key::from`.
fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub mod admin_service;
pub mod question_bank;
pub mod quiz_engine;
pub mod result_store;
