//! Engine configuration.
//!
//! Built once at startup and passed down; nothing reads the environment
//! after `EngineConfig::from_env` returns.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHARACTERS_DIR: &str = "characters";
pub const DEFAULT_COMMAND_RATE_LIMIT: u32 = 10;
pub const DEFAULT_COMMAND_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MENTION_RATE_LIMIT: u32 = 5;
pub const DEFAULT_MENTION_RATE_WINDOW_SECS: u64 = 60;

/// Sliding-window limit: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding one `<user_key>.json` per character
    pub characters_dir: PathBuf,
    pub command_rate_limit: RateLimitConfig,
    /// Limit for conversational mentions, which are costlier than commands
    pub mention_rate_limit: RateLimitConfig,
    /// Fixed RNG seed for reproducible rolls; `None` uses the thread RNG
    pub dice_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            characters_dir: PathBuf::from(DEFAULT_CHARACTERS_DIR),
            command_rate_limit: RateLimitConfig::new(
                DEFAULT_COMMAND_RATE_LIMIT,
                DEFAULT_COMMAND_RATE_WINDOW_SECS,
            ),
            mention_rate_limit: RateLimitConfig::new(
                DEFAULT_MENTION_RATE_LIMIT,
                DEFAULT_MENTION_RATE_WINDOW_SECS,
            ),
            dice_seed: None,
        }
    }
}

impl EngineConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let characters_dir = lookup("TAVERN_CHARACTERS_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHARACTERS_DIR));

        let dice_seed = lookup("TAVERN_DICE_SEED").and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!(value = %raw, "Unparseable TAVERN_DICE_SEED, using thread RNG");
                None
            }
        });

        Self {
            characters_dir,
            command_rate_limit: RateLimitConfig::new(
                parse_or_default(&lookup, "TAVERN_COMMAND_RATE_LIMIT", DEFAULT_COMMAND_RATE_LIMIT),
                parse_or_default(
                    &lookup,
                    "TAVERN_COMMAND_RATE_WINDOW_SECS",
                    DEFAULT_COMMAND_RATE_WINDOW_SECS,
                ),
            ),
            mention_rate_limit: RateLimitConfig::new(
                parse_or_default(&lookup, "TAVERN_MENTION_RATE_LIMIT", DEFAULT_MENTION_RATE_LIMIT),
                parse_or_default(
                    &lookup,
                    "TAVERN_MENTION_RATE_WINDOW_SECS",
                    DEFAULT_MENTION_RATE_WINDOW_SECS,
                ),
            ),
            dice_seed,
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Unparseable setting, using default"
                );
                default
            }
        },
    }
}
