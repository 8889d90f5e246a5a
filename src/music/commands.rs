//! Poise commands for music playback.

use log::info;
use poise::CreateReply;
use poise::serenity_prelude::{ChannelId, CreateEmbed, GuildId, UserId};

use crate::bot::Data;
use crate::error::{BotError, Result};
use crate::spotify::{SpotifyClient, SpotifyLink, Track, is_spotify_url};
use crate::types::colors;

use super::controls::control_rows;
use super::playback::{PlaybackContext, start_if_idle, stop_playback, user_voice_channel};
use super::queue::Song;

/// Context type for music commands.
type Context<'a> = poise::Context<'a, Data, BotError>;

fn get_guild_id(ctx: Context<'_>) -> Result<GuildId> {
    ctx.guild_id().ok_or(BotError::NotInServer)
}

async fn playback_context(ctx: Context<'_>) -> Result<PlaybackContext> {
    let data = ctx.data();
    PlaybackContext::new(
        ctx.serenity_context(),
        data.http_client.clone(),
        data.jukebox.clone(),
        data.config.ytdlp_cookies.clone(),
    )
    .await
}

fn song_from_track(track: &Track, requester: UserId, channel_id: ChannelId) -> Song {
    Song::new(&track.name, track.search_query(), requester, channel_id)
}

/// Turn a Spotify link into queued songs.
async fn resolve_spotify(
    spotify: &SpotifyClient,
    link: &SpotifyLink,
    requester: UserId,
    channel_id: ChannelId,
) -> Result<Vec<Song>> {
    let tracks = match link {
        SpotifyLink::Track(id) => {
            let track = spotify.track(id).await?;
            let query = track.search_query();
            return Ok(vec![Song::new(&query, query.clone(), requester, channel_id)]);
        }
        SpotifyLink::Album(id) => spotify.album_tracks(id).await?,
        SpotifyLink::Playlist(id) => spotify.playlist_tracks(id).await?,
    };
    Ok(tracks
        .iter()
        .map(|track| song_from_track(track, requester, channel_id))
        .collect())
}

#[must_use]
pub fn queue_description(current: Option<&Song>, upcoming: &[Song]) -> String {
    let mut description = String::new();
    if let Some(song) = current {
        description.push_str(&format!("▶️ **Now Playing:** {}\n\n", song.title));
    }
    for (i, song) in upcoming.iter().enumerate() {
        description.push_str(&format!("{}. {}\n", i + 1, song.title));
    }
    description
}

/// Play a song, URL or Spotify link in your voice channel.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Song name, URL or Spotify link"]
    #[rest]
    query: String,
) -> Result<()> {
    let guild_id = get_guild_id(ctx)?;
    let requester = ctx.author().id;
    if user_voice_channel(ctx.cache(), guild_id, requester).is_none() {
        return Err(BotError::NotInVoiceChannel);
    }

    ctx.defer().await?;
    let channel_id = ctx.channel_id();
    let data = ctx.data();

    let confirmation = if is_spotify_url(&query) {
        let spotify = data
            .spotify
            .as_ref()
            .ok_or(BotError::SpotifyNotConfigured)?;
        let link = SpotifyLink::parse(&query)
            .ok_or_else(|| BotError::InvalidSpotifyLink(query.clone()))?;

        let mut songs = resolve_spotify(spotify, &link, requester, channel_id).await?;
        if let SpotifyLink::Track(_) = link {
            let song = songs.pop().ok_or(BotError::InvalidSpotifyLink(query.clone()))?;
            let message = format!("✅ Added **{}** to the queue.", song.query);
            data.jukebox.enqueue(guild_id, song).await;
            message
        } else {
            let added = data.jukebox.enqueue_all(guild_id, songs).await;
            format!("✅ Added **{added} tracks** to the queue.")
        }
    } else {
        data.jukebox
            .enqueue(guild_id, Song::new(&query, query.clone(), requester, channel_id))
            .await;
        format!("✅ Added **{query}** to the queue.")
    };

    info!("{} queued '{}' in guild {guild_id}", ctx.author().tag(), query);
    ctx.say(confirmation).await?;

    let pctx = playback_context(ctx).await?;
    tokio::spawn(async move { start_if_idle(&pctx, guild_id).await });
    Ok(())
}

/// Show the current song and the queue.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn queuelist(ctx: Context<'_>) -> Result<()> {
    let guild_id = get_guild_id(ctx)?;
    let (current, upcoming) = ctx.data().jukebox.snapshot(guild_id).await;

    if current.is_none() && upcoming.is_empty() {
        ctx.say("❌ The queue is empty.").await?;
        return Ok(());
    }

    let embed = CreateEmbed::new()
        .title("🎶 Music Queue")
        .description(queue_description(current.as_ref(), &upcoming))
        .color(colors::BLUE);
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Clear the queue and leave the voice channel.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn reset(ctx: Context<'_>) -> Result<()> {
    let guild_id = get_guild_id(ctx)?;
    if !ctx.data().jukebox.has_player(guild_id).await {
        return Err(BotError::NothingPlaying);
    }

    let pctx = playback_context(ctx).await?;
    stop_playback(&pctx, guild_id).await?;
    info!("{} reset the queue in guild {guild_id}", ctx.author().tag());

    ctx.say("✅ Queue cleared and disconnected from voice channel.")
        .await?;
    Ok(())
}

/// Post the music control panel.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn controls(ctx: Context<'_>) -> Result<()> {
    let guild_id = get_guild_id(ctx)?;
    if !ctx.data().jukebox.has_player(guild_id).await {
        ctx.say("No music is playing right now.").await?;
        return Ok(());
    }

    ctx.send(
        CreateReply::default()
            .content("🎶 Music Controls")
            .components(control_rows()),
    )
    .await?;
    Ok(())
}

/// Get available music commands.
#[must_use]
pub fn music_commands() -> Vec<poise::Command<Data, BotError>> {
    vec![play(), queuelist(), reset(), controls()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song {
        Song::new(title, title, UserId::new(1), ChannelId::new(2))
    }

    #[test]
    fn queue_lists_now_playing_then_numbered_songs() {
        let current = song("Now");
        let upcoming = vec![song("First"), song("Second")];
        assert_eq!(
            queue_description(Some(&current), &upcoming),
            "▶️ **Now Playing:** Now\n\n1. First\n2. Second\n"
        );
    }

    #[test]
    fn queue_without_current_song() {
        assert_eq!(queue_description(None, &[song("Only")]), "1. Only\n");
    }
}
