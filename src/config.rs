use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::draws::DrawRules;

const DEFAULT_API_URL: &str = "https://loteriascaixa-api.herokuapp.com/api/lotofacil/";
const DEFAULT_CSV_PATH: &str = "lotofacil_results.csv";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_REDIS_KEY: &str = "lotofacil_results";

/// Environment-driven settings with Lotofácil defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_endpoint: String,
    pub csv_path: PathBuf,
    pub redis_url: String,
    pub redis_key: String,
    pub rules: DrawRules,
    pub prediction_count: usize,
}

impl Settings {
    pub fn from_env() -> Result<Settings> {
        let defaults = DrawRules::lotofacil();

        Ok(Settings {
            api_endpoint: env_or("LOTO_API_URL", DEFAULT_API_URL),
            csv_path: PathBuf::from(env_or("LOTO_CSV_PATH", DEFAULT_CSV_PATH)),
            redis_url: env_or("LOTO_REDIS_URL", DEFAULT_REDIS_URL),
            redis_key: env_or("LOTO_REDIS_KEY", DEFAULT_REDIS_KEY),
            rules: DrawRules {
                min_number: parsed_env("LOTO_MIN_NUMBER", defaults.min_number)?,
                max_number: parsed_env("LOTO_MAX_NUMBER", defaults.max_number)?,
                numbers_per_draw: parsed_env("LOTO_NUMBERS_PER_DRAW", defaults.numbers_per_draw)?,
            },
            prediction_count: parsed_env("LOTO_PREDICTION_COUNT", 11)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
