use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use dotenv::dotenv;

const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_host: String,
    pub server_port: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: String,
    pub log_json: bool,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let server_host =
            load_env(&lookup, "SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string());
        let server_port = load_env(&lookup, "SERVER_PORT")?;
        let database_url = load_env(&lookup, "DATABASE_URL")?;
        let database_max_connections = parse_env(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;
        let log_level =
            load_env(&lookup, "LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let log_json = parse_env(&lookup, "LOG_JSON", false)?;
        let request_timeout = Duration::from_secs(parse_env(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);

        Ok(Config {
            server_host,
            server_port,
            database_url,
            database_max_connections,
            log_level,
            log_json,
            request_timeout,
        })
    }
}

fn load_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("missing environment variable {}", key))
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match load_env(lookup, key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow!("{}", e))
            .with_context(|| format!("failed to parse environment variable {}", key)),
        Err(_) => Ok(default),
    }
}
