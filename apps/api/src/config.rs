use std::path::PathBuf;

use anyhow::{Context, Result};

/// Secrets shipped in sample env files; never acceptable in production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret", "your-secret-key"];

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or numbers don't parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub access_token_ttl_minutes: i64,
    pub cors_origins: Vec<String>,
    pub latex_bin: String,
    pub latex_timeout_secs: u64,
    /// Parent for per-compile scratch directories; system temp dir if unset.
    pub latex_scratch_dir: Option<PathBuf>,
    pub token_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            access_token_ttl_minutes: parse_env::<i64>("ACCESS_TOKEN_TTL_MINUTES", 30)?.max(1),
            cors_origins: match std::env::var("CORS_ORIGINS") {
                Ok(raw) => parse_origins(&raw)?,
                Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            },
            latex_bin: std::env::var("LATEX_BIN").unwrap_or_else(|_| "pdflatex".to_string()),
            latex_timeout_secs: parse_env("LATEX_TIMEOUT_SECS", 60)?,
            latex_scratch_dir: std::env::var_os("LATEX_SCRATCH_DIR").map(PathBuf::from),
            token_sweep_interval_secs: parse_env::<u64>("TOKEN_SWEEP_INTERVAL_SECS", 86_400)?
                .max(1),
        })
    }

    pub fn has_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS
            .iter()
            .any(|p| self.jwt_secret.eq_ignore_ascii_case(p))
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Accepts either a JSON array of strings or a comma-separated list.
fn parse_origins(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let origins: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).context("CORS_ORIGINS is not a valid JSON array of strings")?
    } else {
        raw.split(',').map(|s| s.trim().to_string()).collect()
    };
    Ok(origins.into_iter().filter(|o| !o.is_empty()).collect())
}
