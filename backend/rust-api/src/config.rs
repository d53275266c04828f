use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_path: String,
    pub question_bank_path: String,
    pub secret_key: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from .env file
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        // Extract values with fallbacks to ENV or defaults
        let database_path = settings
            .get_string("storage.database_path")
            .or_else(|_| env::var("DATABASE_PATH"))
            .unwrap_or_else(|_| "spam_quiz.db".to_string());

        let question_bank_path = settings
            .get_string("storage.question_bank_path")
            .or_else(|_| env::var("QUESTION_BANK_PATH"))
            .unwrap_or_else(|_| "config.json".to_string());

        let secret_key = settings
            .get_string("auth.secret_key")
            .or_else(|_| env::var("SECRET_KEY"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: SECRET_KEY must be set in production!");
                }
                eprintln!("WARNING: Using default SECRET_KEY (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let admin_username = settings
            .get_string("auth.admin_username")
            .or_else(|_| env::var("ADMIN_USERNAME"))
            .unwrap_or_else(|_| "admin".to_string());

        let admin_password = settings
            .get_string("auth.admin_password")
            .or_else(|_| env::var("ADMIN_PASSWORD"))
            .unwrap_or_else(|_| {
                eprintln!("WARNING: Using default ADMIN_PASSWORD, change it before deploying");
                "admin".to_string()
            });

        Ok(Config {
            database_path,
            question_bank_path,
            secret_key,
            admin_username,
            admin_password,
        })
    }
}
