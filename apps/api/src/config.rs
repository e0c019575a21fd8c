use std::str::FromStr;

use anyhow::{Context, Result};

/// Which extraction contract the registration step talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorMode {
    /// `/upload` + `/extract` with `{ success, data, error }` envelopes.
    Remote,
    /// Single `/upload` returning a flat record, plus `/profile`.
    Legacy,
    /// No network; PDFs resolve to a fixed sample record.
    Mock,
}

impl FromStr for ExtractorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(ExtractorMode::Remote),
            "legacy" => Ok(ExtractorMode::Legacy),
            "mock" => Ok(ExtractorMode::Mock),
            other => anyhow::bail!("Unknown extractor mode '{other}' (expected remote, legacy or mock)"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub extractor_mode: ExtractorMode,
    pub extractor_base_url: String,
    /// When unset, transfer slots are kept in process memory.
    pub redis_url: Option<String>,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            extractor_mode: env_or("EXTRACTOR_MODE", "mock")
                .parse()
                .context("EXTRACTOR_MODE is invalid")?,
            extractor_base_url: env_or("EXTRACTOR_BASE_URL", "http://127.0.0.1:5000"),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            session_ttl_secs: env_or("SESSION_TTL_SECS", "1800")
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_mode_parse() {
        assert_eq!("Remote".parse::<ExtractorMode>().unwrap(), ExtractorMode::Remote);
        assert_eq!(" legacy ".parse::<ExtractorMode>().unwrap(), ExtractorMode::Legacy);
        assert_eq!("mock".parse::<ExtractorMode>().unwrap(), ExtractorMode::Mock);
        assert!("flask".parse::<ExtractorMode>().is_err());
    }
}
