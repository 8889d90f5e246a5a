//! Persistent playback control buttons.

use log::{debug, info};
use poise::serenity_prelude::{
    ButtonStyle, ComponentInteraction, Context, CreateActionRow, CreateButton,
    CreateInteractionResponse, CreateInteractionResponseMessage,
};
use strum::{Display, EnumString};

use crate::bot::Data;
use crate::error::Result;

use super::playback::{PlaybackContext, stop_playback};
use super::queue::GuildPlayer;

/// Prefix shared by every control button id.
pub const CUSTOM_ID_PREFIX: &str = "music_";

const NOTHING_TO_DO: &str = "Nothing to do right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum MusicButton {
    #[strum(serialize = "music_skip")]
    Skip,
    #[strum(serialize = "music_stop")]
    Stop,
    #[strum(serialize = "music_pause")]
    Pause,
    #[strum(serialize = "music_resume")]
    Resume,
    #[strum(serialize = "music_volup")]
    VolumeUp,
    #[strum(serialize = "music_voldown")]
    VolumeDown,
}

impl MusicButton {
    fn button(self) -> CreateButton {
        let (label, style) = match self {
            Self::Skip => ("⏭ Skip", ButtonStyle::Primary),
            Self::Stop => ("⏹ Stop", ButtonStyle::Danger),
            Self::Pause => ("⏸ Pause", ButtonStyle::Secondary),
            Self::Resume => ("▶ Resume", ButtonStyle::Success),
            Self::VolumeUp => ("🔊 Volume +", ButtonStyle::Primary),
            Self::VolumeDown => ("🔉 Volume -", ButtonStyle::Primary),
        };
        CreateButton::new(self.to_string()).label(label).style(style)
    }
}

#[must_use]
pub fn control_rows() -> Vec<CreateActionRow> {
    vec![
        CreateActionRow::Buttons(vec![
            MusicButton::Skip.button(),
            MusicButton::Stop.button(),
            MusicButton::Pause.button(),
        ]),
        CreateActionRow::Buttons(vec![
            MusicButton::Resume.button(),
            MusicButton::VolumeUp.button(),
            MusicButton::VolumeDown.button(),
        ]),
    ]
}

/// What a press does to the playing track.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackAction {
    Stop,
    Pause,
    Play,
    SetVolume(f32),
    Leave,
}

/// Apply a press to the guild's state, returning the reply and the track action.
fn press(button: MusicButton, player: &mut GuildPlayer) -> Option<(String, TrackAction)> {
    match button {
        MusicButton::Skip => player
            .is_playing()
            .then(|| ("⏭ Skipped!".to_string(), TrackAction::Stop)),
        MusicButton::Stop => Some(("⏹ Stopped and cleared queue!".to_string(), TrackAction::Leave)),
        MusicButton::Pause => player
            .pause()
            .then(|| ("⏸ Paused!".to_string(), TrackAction::Pause)),
        MusicButton::Resume => player
            .resume()
            .then(|| ("▶ Resumed!".to_string(), TrackAction::Play)),
        MusicButton::VolumeUp => {
            let volume = player.volume_up();
            Some((
                format!("🔊 Volume: {}%", player.volume_percent()),
                TrackAction::SetVolume(volume),
            ))
        }
        MusicButton::VolumeDown => {
            let volume = player.volume_down();
            Some((
                format!("🔉 Volume: {}%", player.volume_percent()),
                TrackAction::SetVolume(volume),
            ))
        }
    }
}

async fn reply(ctx: &Context, interaction: &ComponentInteraction, content: String) -> Result<()> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Handle a press of one of the control buttons.
///
/// # Errors
///
/// Returns an error if the track cannot be controlled or Discord rejects the reply.
pub async fn handle(ctx: &Context, interaction: &ComponentInteraction, data: &Data) -> Result<()> {
    let Ok(button) = interaction.data.custom_id.parse::<MusicButton>() else {
        debug!("Unknown music button {}", interaction.data.custom_id);
        return Ok(());
    };
    let Some(guild_id) = interaction.guild_id else {
        return reply(ctx, interaction, NOTHING_TO_DO.to_string()).await;
    };

    let outcome = data
        .jukebox
        .with_existing(guild_id, |player| {
            press(button, player).map(|(message, action)| (message, action, player.track.clone()))
        })
        .await
        .flatten();

    let Some((message, action, track)) = outcome else {
        return reply(ctx, interaction, NOTHING_TO_DO.to_string()).await;
    };
    info!(
        "{} pressed {button} in guild {guild_id}",
        interaction.user.tag()
    );

    match (action, track) {
        (TrackAction::Leave, _) => {
            let pctx = PlaybackContext::new(
                ctx,
                data.http_client.clone(),
                data.jukebox.clone(),
                data.config.ytdlp_cookies.clone(),
            )
            .await?;
            stop_playback(&pctx, guild_id).await?;
        }
        (TrackAction::Stop, Some(track)) => track.stop()?,
        (TrackAction::Pause, Some(track)) => track.pause()?,
        (TrackAction::Play, Some(track)) => track.play()?,
        (TrackAction::SetVolume(volume), Some(track)) => track.set_volume(volume)?,
        (_, None) => debug!("No track attached in guild {guild_id}"),
    }

    reply(ctx, interaction, message).await
}
