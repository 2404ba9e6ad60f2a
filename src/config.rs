//! Runtime configuration, read from the environment (and `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use poise::serenity_prelude::GuildId;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Guild that also gets the commands registered directly, for testing.
    pub dev_guild: Option<GuildId>,
    /// How often to check for an empty voice channel.
    pub idle_timeout: Duration,
    /// Number of queued tracks `/queue` shows.
    pub queue_page_size: usize,
    /// yt-dlp search provider for free-text queries.
    pub search_prefix: String,
    pub ytdlp_path: String,
}

impl Config {
    pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
    pub const DEFAULT_QUEUE_PAGE_SIZE: usize = 10;
    pub const DEFAULT_SEARCH_PREFIX: &'static str = "ytsearch1";
    pub const DEFAULT_YTDLP_PATH: &'static str = "yt-dlp";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingEnv("DISCORD_TOKEN"))?;

        let dev_guild = parse::<u64>(&lookup, "DEV_GUILD_ID")?
            .filter(|id| *id != 0)
            .map(GuildId::new);

        let idle_secs = parse::<u64>(&lookup, "IDLE_TIMEOUT_SECS")?
            .unwrap_or(Self::DEFAULT_IDLE_TIMEOUT_SECS);
        if idle_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "IDLE_TIMEOUT_SECS",
                value: idle_secs.to_string(),
            });
        }

        let queue_page_size = parse::<usize>(&lookup, "QUEUE_PAGE_SIZE")?
            .unwrap_or(Self::DEFAULT_QUEUE_PAGE_SIZE);
        if queue_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "QUEUE_PAGE_SIZE",
                value: queue_page_size.to_string(),
            });
        }

        Ok(Self {
            token,
            dev_guild,
            idle_timeout: Duration::from_secs(idle_secs),
            queue_page_size,
            search_prefix: lookup("SEARCH_PREFIX")
                .unwrap_or_else(|| Self::DEFAULT_SEARCH_PREFIX.to_string()),
            ytdlp_path: lookup("YTDLP_PATH")
                .unwrap_or_else(|| Self::DEFAULT_YTDLP_PATH.to_string()),
        })
    }
}

/// Reads an optional variable and parses it.
fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
