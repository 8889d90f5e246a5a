use std::{env, path::PathBuf, time::Duration};

use log::{debug, error, info};
use poise::serenity_prelude::{ChannelId, RoleId};

use crate::error::{BotError, Result};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TICKET_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_RELEASE_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_YTDLP_COOKIES: &str = "cookies.txt";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Artist polled for new releases.
    pub artist_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_key: String,
    /// Channel polled for new uploads.
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleConfig {
    pub member: Option<RoleId>,
    pub moderator: Option<RoleId>,
    pub artist: Option<RoleId>,
    pub admin: Option<RoleId>,
}

impl RoleConfig {
    /// Roles allowed to announce and post.
    #[must_use]
    pub fn staff_roles(&self) -> Vec<RoleId> {
        [self.moderator, self.artist, self.admin]
            .into_iter()
            .flatten()
            .collect()
    }

    #[must_use]
    pub fn member_mention(&self) -> Option<String> {
        self.member.map(|id| format!("<@&{id}>"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    pub welcome: Option<ChannelId>,
    pub spotify_announcements: Option<ChannelId>,
    pub youtube_announcements: Option<ChannelId>,
    pub ticket_log: Option<ChannelId>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    pub openai: Option<OpenAiConfig>,
    pub spotify: Option<SpotifyConfig>,
    pub youtube: Option<YoutubeConfig>,
    pub roles: RoleConfig,
    pub channels: ChannelConfig,
    pub ticket_timeout: Duration,
    pub release_poll_interval: Duration,
    pub ytdlp_cookies: PathBuf,
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        error!("Invalid value for {name}: {e}");
        BotError::Config(format!("{name} must be a positive integer, got '{value}'"))
    })
}

fn parse_id(name: &str, value: &str) -> Result<u64> {
    match parse_u64(name, value)? {
        0 => Err(BotError::Config(format!("{name} must not be zero"))),
        id => Ok(id),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|name| env::var(name).ok())?;

        info!("Configuration loaded successfully");
        debug!(
            "Discord token length: {} characters",
            config.discord_token.len()
        );
        debug!("AI answers enabled: {}", config.openai.is_some());
        debug!("Spotify enabled: {}", config.spotify.is_some());
        debug!("YouTube enabled: {}", config.youtube.is_some());

        Ok(config)
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let id = |name: &str| get(name).map(|value| parse_id(name, &value)).transpose();
        let secs = |name: &str, default: u64| {
            get(name)
                .map(|value| parse_u64(name, &value))
                .transpose()
                .map(|value| Duration::from_secs(value.unwrap_or(default)))
        };

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| {
            error!("Failed to load DISCORD_TOKEN from environment");
            BotError::Config("DISCORD_TOKEN is required".to_string())
        })?;

        let openai = get("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            api_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
        });

        let spotify = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyConfig {
                client_id,
                client_secret,
                artist_id: get("SPOTIFY_ARTIST_ID"),
            }),
            (None, None) => None,
            _ => {
                return Err(BotError::Config(
                    "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set together".to_string(),
                ));
            }
        };

        let youtube = get("YOUTUBE_API_KEY").map(|api_key| YoutubeConfig {
            api_key,
            channel_id: get("YOUTUBE_CHANNEL_ID"),
        });

        let roles = RoleConfig {
            member: id("MEMBER_ROLE_ID")?.map(RoleId::new),
            moderator: id("MODERATOR_ROLE_ID")?.map(RoleId::new),
            artist: id("ARTIST_ROLE_ID")?.map(RoleId::new),
            admin: id("ADMIN_ROLE_ID")?.map(RoleId::new),
        };

        let channels = ChannelConfig {
            welcome: id("WELCOME_CHANNEL_ID")?.map(ChannelId::new),
            spotify_announcements: id("SPOTIFY_ANNOUNCEMENT_CHANNEL_ID")?.map(ChannelId::new),
            youtube_announcements: id("YOUTUBE_ANNOUNCEMENT_CHANNEL_ID")?.map(ChannelId::new),
            ticket_log: id("TICKET_LOG_CHANNEL_ID")?.map(ChannelId::new),
        };

        let release_poll_interval =
            secs("RELEASE_POLL_INTERVAL_SECS", DEFAULT_RELEASE_POLL_INTERVAL_SECS)?;
        if release_poll_interval.is_zero() {
            return Err(BotError::Config(
                "RELEASE_POLL_INTERVAL_SECS must not be zero".to_string(),
            ));
        }

        Ok(Self {
            discord_token,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            openai,
            spotify,
            youtube,
            roles,
            channels,
            ticket_timeout: secs("TICKET_TIMEOUT_SECS", DEFAULT_TICKET_TIMEOUT_SECS)?,
            release_poll_interval,
            ytdlp_cookies: PathBuf::from(
                get("YTDLP_COOKIES").unwrap_or_else(|| DEFAULT_YTDLP_COOKIES.to_string()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_only_uses_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "token")]).expect("valid config");
        assert_eq!(config.command_prefix, "!");
        assert!(config.openai.is_none());
        assert!(config.spotify.is_none());
        assert!(config.youtube.is_none());
        assert_eq!(config.ticket_timeout, Duration::from_secs(3600));
        assert_eq!(config.release_poll_interval, Duration::from_secs(600));
        assert_eq!(config.ytdlp_cookies, PathBuf::from("cookies.txt"));
        assert!(config.roles.member_mention().is_none());
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(matches!(config_from(&[]), Err(BotError::Config(_))));
        assert!(matches!(
            config_from(&[("DISCORD_TOKEN", "  ")]),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn openai_defaults_apply_when_key_is_present() {
        let config = config_from(&[("DISCORD_TOKEN", "t"), ("OPENAI_API_KEY", "k")])
            .expect("valid config");
        let openai = config.openai.expect("openai configured");
        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(
            openai.api_url,
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn half_configured_spotify_is_rejected() {
        let result = config_from(&[("DISCORD_TOKEN", "t"), ("SPOTIFY_CLIENT_ID", "id")]);
        assert!(matches!(result, Err(BotError::Config(_))));
    }

    #[test]
    fn ids_are_parsed() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "t"),
            ("MEMBER_ROLE_ID", "1407630846294491168"),
            ("MODERATOR_ROLE_ID", "11"),
            ("ADMIN_ROLE_ID", "12"),
            ("TICKET_LOG_CHANNEL_ID", "99"),
        ])
        .expect("valid config");
        assert_eq!(
            config.roles.member_mention().as_deref(),
            Some("<@&1407630846294491168>")
        );
        assert_eq!(
            config.roles.staff_roles(),
            vec![RoleId::new(11), RoleId::new(12)]
        );
        assert_eq!(config.channels.ticket_log, Some(ChannelId::new(99)));
    }

    #[test]
    fn invalid_ids_are_rejected() {
        for value in ["abc", "0", "-5"] {
            let result = config_from(&[("DISCORD_TOKEN", "t"), ("WELCOME_CHANNEL_ID", value)]);
            assert!(matches!(result, Err(BotError::Config(_))), "{value}");
        }
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = config_from(&[("DISCORD_TOKEN", "t"), ("RELEASE_POLL_INTERVAL_SECS", "0")]);
        assert!(matches!(result, Err(BotError::Config(_))));
    }
}
