use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AI API error ({status}): {message}")]
    OpenAiApi { status: StatusCode, message: String },

    #[error("AI response error: {0}")]
    OpenAiResponse(String),

    #[error("AI answers are not configured")]
    AiNotConfigured,

    #[error("Spotify API error ({status}): {message}")]
    SpotifyApi { status: StatusCode, message: String },

    #[error("Spotify is not configured")]
    SpotifyNotConfigured,

    #[error("YouTube API error ({status}): {message}")]
    YoutubeApi { status: StatusCode, message: String },

    #[error("Unsupported Spotify link: {0}")]
    InvalidSpotifyLink(String),

    #[error("Voice join error: {0}")]
    VoiceJoin(#[from] songbird::error::JoinError),

    #[error("Track control error: {0}")]
    TrackControl(#[from] songbird::error::ControlError),

    #[error("Audio source error: {0}")]
    AudioSource(#[from] songbird::input::AudioStreamError),

    #[error("Songbird voice manager is not registered")]
    MissingVoiceManager,

    #[error("Command used outside of a server")]
    NotInServer,

    #[error("User is not in a voice channel")]
    NotInVoiceChannel,

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Missing permission")]
    MissingPermission,

    #[error("Channel is not a ticket thread")]
    NotATicketThread,
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

fn api_status_message(service: &str, status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => format!(
            "Sorry, I'm having authentication issues with {service}. Please contact the bot administrator."
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            format!("Sorry, {service} is rate limiting me. Please try again in a few moments.")
        }
        status if status.is_server_error() => {
            format!("Sorry, {service} is experiencing issues right now. Please try again later.")
        }
        _ => format!("Sorry, my request to {service} failed. Please try again later."),
    }
}

impl BotError {
    /// Returns a user-friendly error message suitable for displaying in Discord
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::Serenity(_) => {
                "Sorry, I'm having trouble communicating with Discord right now. Please try again later.".to_string()
            }
            BotError::Config(_) => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::Json(_) => {
                "Sorry, I received a response I couldn't understand. Please try again.".to_string()
            }
            BotError::OpenAiApi { status, .. } => api_status_message("the AI service", *status),
            BotError::OpenAiResponse(_) => {
                "Sorry, I received an unexpected response from the AI service. Please try again.".to_string()
            }
            BotError::AiNotConfigured => "AI answers are not enabled on this bot.".to_string(),
            BotError::SpotifyApi { status, .. } => api_status_message("Spotify", *status),
            BotError::SpotifyNotConfigured => {
                "Spotify features are not enabled on this bot.".to_string()
            }
            BotError::YoutubeApi { status, .. } => api_status_message("YouTube", *status),
            BotError::InvalidSpotifyLink(_) => {
                "❌ I can only play Spotify track, album and playlist links.".to_string()
            }
            BotError::VoiceJoin(_) => "❌ I couldn't join your voice channel.".to_string(),
            BotError::TrackControl(_) => {
                "❌ I couldn't control the current track. Please try again.".to_string()
            }
            BotError::AudioSource(_) => "❌ I couldn't load that track.".to_string(),
            BotError::MissingVoiceManager => {
                "Sorry, voice support isn't available right now.".to_string()
            }
            BotError::NotInServer => "This command only works inside a server.".to_string(),
            BotError::NotInVoiceChannel => "❌ You are not in a voice channel!".to_string(),
            BotError::NothingPlaying => "❌ No music is playing right now.".to_string(),
            BotError::MissingPermission => "⛔ You don't have permission.".to_string(),
            BotError::NotATicketThread => "⚠️ This is not a ticket thread.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_names_the_service() {
        let err = BotError::SpotifyApi {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: String::new(),
        };
        assert_eq!(
            err.user_message(),
            "Sorry, Spotify is rate limiting me. Please try again in a few moments."
        );
    }

    #[test]
    fn auth_failures_point_to_the_administrator() {
        let err = BotError::OpenAiApi {
            status: StatusCode::UNAUTHORIZED,
            message: "bad key".to_string(),
        };
        assert!(err.user_message().contains("bot administrator"));
        assert!(!err.user_message().contains("bad key"));
    }

    #[test]
    fn voice_errors_are_actionable() {
        assert_eq!(
            BotError::NotInVoiceChannel.user_message(),
            "❌ You are not in a voice channel!"
        );
        assert_eq!(
            BotError::MissingPermission.user_message(),
            "⛔ You don't have permission."
        );
    }
}
