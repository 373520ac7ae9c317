use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::selection::MAX_CANDIDATES;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_SELECTION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_QUEUE_DISPLAY_LIMIT: usize = 10;
const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub prefix: String,
    pub selection_timeout: Duration,
    pub search_candidates: usize,
    pub queue_display_limit: usize,
    pub ytdlp_path: String,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let prefix = lookup("BOT_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let timeout_secs = parse_or(&lookup, "SELECTION_TIMEOUT_SECS", DEFAULT_SELECTION_TIMEOUT_SECS)?;
        let search_candidates = parse_or(&lookup, "SEARCH_CANDIDATES", MAX_CANDIDATES)?.clamp(1, MAX_CANDIDATES);
        let queue_display_limit = parse_or(&lookup, "QUEUE_DISPLAY_LIMIT", DEFAULT_QUEUE_DISPLAY_LIMIT)?.max(1);

        let ytdlp_path = lookup("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string());

        Ok(Config {
            token,
            prefix,
            selection_timeout: Duration::from_secs(timeout_secs),
            search_candidates,
            queue_display_limit,
            ytdlp_path,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config = config_from(&[("DISCORD_TOKEN", "secret")]).unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.selection_timeout, Duration::from_secs(60));
        assert_eq!(config.search_candidates, 5);
        assert_eq!(config.queue_display_limit, 10);
        assert_eq!(config.ytdlp_path, "yt-dlp");
    }

    #[test]
    fn token_is_required() {
        assert_eq!(config_from(&[]), Err(ConfigError::Missing("DISCORD_TOKEN")));
        assert_eq!(config_from(&[("DISCORD_TOKEN", "  ")]), Err(ConfigError::Missing("DISCORD_TOKEN")));
    }

    #[test]
    fn overrides_are_parsed_and_clamped() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "secret"),
            ("BOT_PREFIX", "$"),
            ("SELECTION_TIMEOUT_SECS", "15"),
            ("SEARCH_CANDIDATES", "12"),
        ])
        .unwrap();

        assert_eq!(config.prefix, "$");
        assert_eq!(config.selection_timeout, Duration::from_secs(15));
        assert_eq!(config.search_candidates, 5);
    }

    #[test]
    fn queue_display_limit_is_at_least_one() {
        let config = config_from(&[("DISCORD_TOKEN", "secret"), ("QUEUE_DISPLAY_LIMIT", "0")]).unwrap();

        assert_eq!(config.queue_display_limit, 1);
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let error = config_from(&[("DISCORD_TOKEN", "secret"), ("QUEUE_DISPLAY_LIMIT", "lots")]).unwrap_err();

        assert_eq!(
            error,
            ConfigError::Invalid {
                key: "QUEUE_DISPLAY_LIMIT",
                value: "lots".to_string()
            }
        );
    }
}
