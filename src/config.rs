//! Environment configuration

use crate::error::RankingError;
use crate::llm::{DEFAULT_CHAT_URL, DEFAULT_MODEL};
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_AI_TIMEOUT_SECS: u64 = 8;
const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 3000;
const DEFAULT_PORT: u16 = 8080;

/// Ranking model settings. Absent when no API key is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub crm_api_base_url: Option<String>,
    pub ai: Option<AiConfig>,
    pub ai_timeout: Duration,
    pub source_timeout: Duration,
    pub port: u16,
}

impl EngineConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let ai = get("PRIORITY_AI_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .map(|api_key| AiConfig {
                api_key,
                base_url: get("PRIORITY_AI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
                model: get("PRIORITY_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            });

        let ai_timeout_secs: u64 = parse_or(
            get("PRIORITY_AI_TIMEOUT_SECS"),
            "PRIORITY_AI_TIMEOUT_SECS",
            DEFAULT_AI_TIMEOUT_SECS,
        )?;
        let source_timeout_ms: u64 = parse_or(
            get("PRIORITY_SOURCE_TIMEOUT_MS"),
            "PRIORITY_SOURCE_TIMEOUT_MS",
            DEFAULT_SOURCE_TIMEOUT_MS,
        )?;
        let port: u16 = parse_or(
            get("PORT").or_else(|| get("API_PORT")),
            "PORT",
            DEFAULT_PORT,
        )?;

        Ok(Self {
            crm_api_base_url: get("CRM_API_BASE_URL"),
            ai,
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            source_timeout: Duration::from_millis(source_timeout_ms),
            port,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| RankingError::Config(format!("{} must be a number, got {:?}", key, raw))),
    }
}
