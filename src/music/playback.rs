//! Voice channel playback using Songbird and yt-dlp.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use poise::serenity_prelude::{Cache, ChannelId, Context, GuildId, Http, UserId};
use songbird::events::{Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent};
use songbird::input::{Compose, Input, YoutubeDl};
use songbird::tracks::{PlayMode, Track, TrackHandle};
use songbird::{Call, Songbird};
use tokio::sync::Mutex;

use crate::error::{BotError, Result};

use super::queue::{Cue, Jukebox, Song};

/// Everything playback needs, detached from any single command invocation.
#[derive(Clone)]
pub struct PlaybackContext {
    pub http: Arc<Http>,
    pub cache: Arc<Cache>,
    pub songbird: Arc<Songbird>,
    pub http_client: reqwest::Client,
    pub jukebox: Arc<Jukebox>,
    pub cookies: PathBuf,
}

impl PlaybackContext {
    /// # Errors
    ///
    /// Returns `MissingVoiceManager` if Songbird is not registered.
    pub async fn new(
        ctx: &Context,
        http_client: reqwest::Client,
        jukebox: Arc<Jukebox>,
        cookies: PathBuf,
    ) -> Result<Self> {
        let songbird = songbird::get(ctx)
            .await
            .ok_or(BotError::MissingVoiceManager)?;
        Ok(Self {
            http: ctx.http.clone(),
            cache: ctx.cache.clone(),
            songbird,
            http_client,
            jukebox,
            cookies,
        })
    }

    async fn report(&self, channel_id: ChannelId, message: impl Into<String>) {
        if let Err(e) = channel_id.say(&self.http, message).await {
            warn!("Failed to send playback update to {channel_id}: {e}");
        }
    }
}

/// Get the voice channel the user is currently in.
#[must_use]
pub fn user_voice_channel(cache: &Cache, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    cache.guild(guild_id).and_then(|guild| {
        guild
            .voice_states
            .get(&user_id)
            .and_then(|vs| vs.channel_id)
    })
}

/// Arguments passed through to yt-dlp.
fn ytdlp_args(cookies: &std::path::Path) -> Vec<String> {
    if cookies.is_file() {
        vec!["--cookies".to_string(), cookies.display().to_string()]
    } else {
        Vec::new()
    }
}

fn is_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}

/// Return the guild's call, joining `channel_id` if the bot is not connected.
async fn ensure_connected(
    pctx: &PlaybackContext,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<Arc<Mutex<Call>>> {
    if let Some(call) = pctx.songbird.get(guild_id) {
        let connected = call.lock().await.current_channel().is_some();
        if connected {
            return Ok(call);
        }
    }
    info!("Joining voice channel {channel_id} in guild {guild_id}");
    Ok(pctx.songbird.join(guild_id, channel_id).await?)
}

/// Advances the queue when the track of one turn ends or fails.
struct TrackEndNotifier {
    guild_id: GuildId,
    turn: u64,
    pctx: PlaybackContext,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };

        for (state, handle) in *tracks {
            let Some(song) = self.pctx.jukebox.claim_ended(self.guild_id, self.turn).await else {
                debug!("Ignoring event for stale track {}", handle.uuid());
                continue;
            };

            if matches!(state.playing, PlayMode::Errored(_)) {
                warn!("Track '{}' failed in guild {}", song.title, self.guild_id);
                self.pctx
                    .report(song.channel_id, format!("❌ Could not play **{}**.", song.title))
                    .await;
            }

            let pctx = self.pctx.clone();
            let guild_id = self.guild_id;
            let turn = self.turn;
            tokio::spawn(async move { play_next(&pctx, guild_id, turn).await });
        }
        None
    }
}

fn stop_track(handle: &TrackHandle) {
    if let Err(e) = handle.stop() {
        debug!("Track {} was already gone: {e}", handle.uuid());
    }
}

/// Resolve and start the cued song, returning its handle and resolved title.
///
/// Returns `None` when the guild moved on while the source was resolving.
async fn start_song(
    pctx: &PlaybackContext,
    guild_id: GuildId,
    voice_channel: ChannelId,
    cue: &Cue,
) -> Result<Option<(TrackHandle, String)>> {
    let song = &cue.song;
    let client = pctx.http_client.clone();
    let mut source = if is_url(&song.query) {
        YoutubeDl::new(client, song.query.clone())
    } else {
        YoutubeDl::new_search(client, song.query.clone())
    }
    .user_args(ytdlp_args(&pctx.cookies));
    let title = source
        .aux_metadata()
        .await?
        .title
        .unwrap_or_else(|| song.title.clone());

    // A stop during resolution must not pull the bot back into voice.
    if !pctx.jukebox.is_pending(guild_id, cue.turn).await {
        return Ok(None);
    }

    let call = ensure_connected(pctx, guild_id, voice_channel).await?;
    let volume = pctx.jukebox.volume(guild_id).await;
    let input: Input = source.into();

    let handle = {
        let mut handler = call.lock().await;
        handler.play_only(Track::new(input).volume(volume))
    };

    for event in [TrackEvent::End, TrackEvent::Error] {
        handle.add_event(
            Event::Track(event),
            TrackEndNotifier {
                guild_id,
                turn: cue.turn,
                pctx: pctx.clone(),
            },
        )?;
    }
    Ok(Some((handle, title)))
}

/// Start playing the queue if nothing is playing in the guild.
pub async fn start_if_idle(pctx: &PlaybackContext, guild_id: GuildId) {
    if let Some(cue) = pctx.jukebox.cue_if_idle(guild_id).await {
        play_from(pctx, guild_id, Some(cue)).await;
    }
}

/// Advance past the song of `turn` and play whatever comes next.
pub async fn play_next(pctx: &PlaybackContext, guild_id: GuildId, turn: u64) {
    let next = pctx.jukebox.cue_after(guild_id, turn).await;
    play_from(pctx, guild_id, next).await;
}

async fn finished_early(handle: &TrackHandle) -> bool {
    match handle.get_info().await {
        Ok(state) => matches!(
            state.playing,
            PlayMode::End | PlayMode::Stop | PlayMode::Errored(_)
        ),
        // The driver drops finished tracks.
        Err(_) => true,
    }
}

/// Drop a track that lost its slot, leaving voice if the guild went idle.
async fn discard(
    pctx: &PlaybackContext,
    guild_id: GuildId,
    song: &Song,
    handle: Option<TrackHandle>,
) {
    debug!("Discarding track for '{}' in guild {guild_id}", song.title);
    if let Some(handle) = handle {
        stop_track(&handle);
    }
    if pctx.jukebox.is_idle(guild_id).await
        && pctx.songbird.get(guild_id).is_some()
        && let Err(e) = pctx.songbird.remove(guild_id).await
    {
        warn!("Failed to leave voice in guild {guild_id}: {e}");
    }
}

async fn play_from(pctx: &PlaybackContext, guild_id: GuildId, mut next: Option<Cue>) {
    while let Some(cue) = next {
        let song = &cue.song;
        let Some(voice_channel) = user_voice_channel(&pctx.cache, guild_id, song.requester) else {
            pctx.report(
                song.channel_id,
                format!("❌ <@{}>, you are not in a voice channel!", song.requester),
            )
            .await;
            next = pctx.jukebox.cue_after(guild_id, cue.turn).await;
            continue;
        };

        match start_song(pctx, guild_id, voice_channel, &cue).await {
            Ok(Some((handle, title))) => {
                if !pctx.jukebox.attach(guild_id, cue.turn, handle.clone()).await {
                    discard(pctx, guild_id, song, Some(handle)).await;
                    return;
                }
                // Its end event may have fired before the track was attached.
                if finished_early(&handle).await
                    && pctx.jukebox.claim_ended(guild_id, cue.turn).await.is_some()
                {
                    warn!("Track '{}' ended right away in guild {guild_id}", song.title);
                    next = pctx.jukebox.cue_after(guild_id, cue.turn).await;
                    continue;
                }

                info!("Now playing '{title}' in guild {guild_id}");
                pctx.report(song.channel_id, format!("▶️ Now playing: **{title}**"))
                    .await;
                return;
            }
            Ok(None) => {
                discard(pctx, guild_id, song, None).await;
                return;
            }
            Err(e) => {
                error!("Could not play '{}' in guild {guild_id}: {e}", song.title);
                pctx.report(
                    song.channel_id,
                    format!("❌ Could not play {}: {e}", song.title),
                )
                .await;
                next = pctx.jukebox.cue_after(guild_id, cue.turn).await;
            }
        }
    }
    info!("Queue finished in guild {guild_id}");
}

/// Clear the guild's queue, stop playback and leave the voice channel.
///
/// # Errors
///
/// Returns an error if leaving the voice channel fails.
pub async fn stop_playback(pctx: &PlaybackContext, guild_id: GuildId) -> Result<()> {
    if let Some(handle) = pctx.jukebox.clear(guild_id).await {
        stop_track(&handle);
    }
    if pctx.songbird.get(guild_id).is_some() {
        pctx.songbird.remove(guild_id).await?;
        info!("Left voice channel in guild {guild_id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_played_directly() {
        assert!(is_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_url("http://example.com/song.mp3"));
        assert!(!is_url("artist - song"));
        assert!(!is_url("youtube.com/watch?v=abc"));
    }

    #[test]
    fn missing_cookie_file_adds_no_arguments() {
        assert!(ytdlp_args(std::path::Path::new("/nonexistent/cookies.txt")).is_empty());
    }

    #[test]
    fn cookie_file_is_passed_to_ytdlp() {
        let path = std::env::temp_dir().join(format!("stagehand-cookies-{}.txt", std::process::id()));
        std::fs::write(&path, "# Netscape HTTP Cookie File\n").expect("write cookie file");
        let args = ytdlp_args(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(args, vec!["--cookies".to_string(), path.display().to_string()]);
    }
}
