use std::{net::SocketAddr, str::FromStr};

use chrono::TimeDelta;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Production,
}

impl Env {
    pub fn from_env() -> Self {
        match var("ENVIRONMENT") {
            Ok(Some(env)) => match env.as_str() {
                "dev" => Env::Dev,
                "staging" => Env::Staging,
                "production" => Env::Production,
                _ => Env::Dev,
            },
            _ => Env::Dev,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub env: Env,
    pub database_url: String,
    pub database_max_connections: usize,
    pub listen_addr: SocketAddr,
    /// Empty means any origin in dev and same-origin only elsewhere.
    pub cors_allowed_origins: Vec<String>,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardConfig {
    pub window: TimeDelta,
    pub limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        LeaderboardConfig {
            window: TimeDelta::hours(24),
            limit: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: Env::Dev,
            database_url: String::new(),
            database_max_connections: 10,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_allowed_origins: vec![],
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

fn var(key: &str) -> Result<Option<String>, String> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(e) => match e {
            std::env::VarError::NotPresent => Ok(None),
            std::env::VarError::NotUnicode(_) => Err(format!(
                "Could not get the environment variable `{key}` due to unicode error"
            )),
        },
    }
}

fn required_var(key: &str) -> String {
    let val = var(key);
    match val {
        Ok(val) => match val {
            Some(val) => val,
            None => {
                tracing::error!("Environment variable `{key}` is required");
                std::process::exit(1)
            }
        },
        Err(e) => {
            tracing::error!(
                "Environment variable `{key}` is required, but could not retrieve: {e}"
            );
            std::process::exit(1)
        }
    }
}

/// Parses an optional variable, falling back to `default` when it is missing
/// or malformed.
fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Ok(Some(raw)) => match raw.trim().parse() {
            Ok(val) => val,
            Err(_) => {
                tracing::warn!("Could not parse environment variable `{key}` ({raw}), using default");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            tracing::warn!("{e}, using default");
            default
        }
    }
}

fn list_var(key: &str) -> Vec<String> {
    match var(key) {
        Ok(Some(raw)) => parse_list(&raw),
        _ => vec![],
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl ServerConfig {
    pub fn new_from_env() -> Self {
        let defaults = ServerConfig::default();

        let window_hours = parsed_var("LEADERBOARD_WINDOW_HOURS", 24i64);
        let window = TimeDelta::try_hours(window_hours)
            .filter(|w| *w > TimeDelta::zero())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid leaderboard window of {window_hours} hours, using the default"
                );
                defaults.leaderboard.window
            });

        ServerConfig {
            env: Env::from_env(),
            database_url: required_var("DATABASE_URL"),
            database_max_connections: parsed_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            listen_addr: parsed_var("LISTEN_ADDR", defaults.listen_addr),
            cors_allowed_origins: list_var("CORS_ALLOWED_ORIGINS"),
            leaderboard: LeaderboardConfig {
                window,
                limit: parsed_var("LEADERBOARD_LIMIT", defaults.leaderboard.limit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_defaults_to_top_five_in_a_day() {
        let config = ServerConfig::default();
        assert_eq!(config.leaderboard.window, TimeDelta::hours(24));
        assert_eq!(config.leaderboard.limit, 5);
        assert_eq!(config.env, Env::Dev);
    }

    #[test]
    fn origin_lists_skip_blank_entries() {
        assert_eq!(
            parse_list(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_list("").is_empty());
    }
}
