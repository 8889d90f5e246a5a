//! Per-guild queue and now-playing state.

use std::collections::{HashMap, VecDeque};

use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use songbird::tracks::TrackHandle;
use tokio::sync::RwLock;

/// Volume is stored in 10 % steps so repeated presses never drift.
const DEFAULT_VOLUME_STEPS: u8 = 5;
const MAX_VOLUME_STEPS: u8 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    /// URL or search phrase handed to yt-dlp.
    pub query: String,
    pub requester: UserId,
    /// Text channel that playback updates are reported to.
    pub channel_id: ChannelId,
}

impl Song {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        query: impl Into<String>,
        requester: UserId,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            title: title.into(),
            query: query.into(),
            requester,
            channel_id,
        }
    }
}

/// Lifecycle of the song in the now-playing slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Resolving,
    Playing,
    Ended,
}

/// A song taken off the queue together with the turn it was started in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cue {
    pub song: Song,
    pub turn: u64,
}

#[derive(Debug)]
pub struct GuildPlayer {
    pub queue: VecDeque<Song>,
    pub current: Option<Song>,
    pub paused: bool,
    pub track: Option<TrackHandle>,
    volume_steps: u8,
    /// Bumped whenever the now-playing slot changes hands.
    turn: u64,
    stage: Stage,
}

impl Default for GuildPlayer {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            paused: false,
            track: None,
            volume_steps: DEFAULT_VOLUME_STEPS,
            turn: 0,
            stage: Stage::Resolving,
        }
    }
}

impl GuildPlayer {
    /// Append a song and return its 1-based queue position.
    pub fn enqueue(&mut self, song: Song) -> usize {
        self.queue.push_back(song);
        self.queue.len()
    }

    pub fn enqueue_all(&mut self, songs: impl IntoIterator<Item = Song>) -> usize {
        let before = self.queue.len();
        self.queue.extend(songs);
        self.queue.len() - before
    }

    /// Move the next queued song into the now-playing slot.
    ///
    /// The previous track handle is dropped; the caller attaches the new one.
    pub fn advance(&mut self) -> Option<Song> {
        self.turn += 1;
        self.current = self.queue.pop_front();
        self.track = None;
        self.paused = false;
        self.stage = Stage::Resolving;
        self.current.clone()
    }

    /// Advance and tag the new song with its turn.
    pub fn cue_next(&mut self) -> Option<Cue> {
        let song = self.advance()?;
        Some(Cue {
            song,
            turn: self.turn,
        })
    }

    /// Advance only if `turn` is still the live one.
    pub fn cue_after(&mut self, turn: u64) -> Option<Cue> {
        if turn == self.turn {
            self.cue_next()
        } else {
            None
        }
    }

    /// Whether the song cued in `turn` is still waiting for its track.
    #[must_use]
    pub fn is_pending(&self, turn: u64) -> bool {
        turn == self.turn && self.current.is_some() && self.stage == Stage::Resolving
    }

    /// Mark the song cued in `turn` as playing. Fails if the slot moved on meanwhile.
    pub fn mark_playing(&mut self, turn: u64) -> bool {
        if !self.is_pending(turn) {
            return false;
        }
        self.stage = Stage::Playing;
        true
    }

    /// Claim the end of the track played in `turn`.
    ///
    /// Only the first claim for a live turn returns the song.
    pub fn claim_ended(&mut self, turn: u64) -> Option<Song> {
        if turn != self.turn || self.stage != Stage::Playing {
            return None;
        }
        self.stage = Stage::Ended;
        self.track = None;
        self.paused = false;
        self.current.clone()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.current.is_some() && self.stage == Stage::Playing
    }

    pub fn pause(&mut self) -> bool {
        if !self.is_playing() || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.is_playing() || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    pub fn volume_up(&mut self) -> f32 {
        self.volume_steps = (self.volume_steps + 1).min(MAX_VOLUME_STEPS);
        self.volume()
    }

    pub fn volume_down(&mut self) -> f32 {
        self.volume_steps = self.volume_steps.saturating_sub(1);
        self.volume()
    }

    /// Playback gain, where 1.0 is the source's own level.
    #[must_use]
    pub fn volume(&self) -> f32 {
        f32::from(self.volume_steps) / 10.0
    }

    #[must_use]
    pub fn volume_percent(&self) -> u32 {
        u32::from(self.volume_steps) * 10
    }

    /// Forget everything except the volume. Any turn in flight goes stale.
    pub fn clear(&mut self) {
        self.turn += 1;
        self.queue.clear();
        self.current = None;
        self.track = None;
        self.paused = false;
        self.stage = Stage::Resolving;
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}

/// All guild players of the bot.
#[derive(Debug, Default)]
pub struct Jukebox {
    players: RwLock<HashMap<GuildId, GuildPlayer>>,
}

impl Jukebox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the guild's player, creating it if needed.
    pub async fn with_player<T>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut GuildPlayer) -> T,
    ) -> T {
        let mut players = self.players.write().await;
        f(players.entry(guild_id).or_default())
    }

    /// Run `f` against the guild's player only if one exists.
    pub async fn with_existing<T>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut GuildPlayer) -> T,
    ) -> Option<T> {
        let mut players = self.players.write().await;
        players.get_mut(&guild_id).map(f)
    }

    pub async fn has_player(&self, guild_id: GuildId) -> bool {
        self.players.read().await.contains_key(&guild_id)
    }

    pub async fn enqueue(&self, guild_id: GuildId, song: Song) -> usize {
        self.with_player(guild_id, |player| player.enqueue(song))
            .await
    }

    pub async fn enqueue_all(&self, guild_id: GuildId, songs: Vec<Song>) -> usize {
        self.with_player(guild_id, |player| player.enqueue_all(songs))
            .await
    }

    /// Cue the next song if nothing is playing, creating the player if needed.
    pub async fn cue_if_idle(&self, guild_id: GuildId) -> Option<Cue> {
        self.with_player(guild_id, |player| {
            if player.is_idle() {
                player.cue_next()
            } else {
                None
            }
        })
        .await
    }

    pub async fn cue_after(&self, guild_id: GuildId, turn: u64) -> Option<Cue> {
        self.with_existing(guild_id, |player| player.cue_after(turn))
            .await
            .flatten()
    }

    pub async fn is_pending(&self, guild_id: GuildId, turn: u64) -> bool {
        self.players
            .read()
            .await
            .get(&guild_id)
            .is_some_and(|player| player.is_pending(turn))
    }

    /// Attach the started track to `turn`, unless the slot moved on meanwhile.
    pub async fn attach(&self, guild_id: GuildId, turn: u64, handle: TrackHandle) -> bool {
        self.with_existing(guild_id, |player| {
            let attached = player.mark_playing(turn);
            if attached {
                player.track = Some(handle);
            }
            attached
        })
        .await
        .unwrap_or(false)
    }

    pub async fn claim_ended(&self, guild_id: GuildId, turn: u64) -> Option<Song> {
        self.with_existing(guild_id, |player| player.claim_ended(turn))
            .await
            .flatten()
    }

    pub async fn is_idle(&self, guild_id: GuildId) -> bool {
        self.players
            .read()
            .await
            .get(&guild_id)
            .is_none_or(GuildPlayer::is_idle)
    }

    /// Now playing and upcoming songs.
    pub async fn snapshot(&self, guild_id: GuildId) -> (Option<Song>, Vec<Song>) {
        let players = self.players.read().await;
        match players.get(&guild_id) {
            Some(player) => (
                player.current.clone(),
                player.queue.iter().cloned().collect(),
            ),
            None => (None, Vec::new()),
        }
    }

    pub async fn volume(&self, guild_id: GuildId) -> f32 {
        self.players
            .read()
            .await
            .get(&guild_id)
            .map_or(f32::from(DEFAULT_VOLUME_STEPS) / 10.0, GuildPlayer::volume)
    }

    /// Clear the guild's state, returning the handle of the track that was playing.
    pub async fn clear(&self, guild_id: GuildId) -> Option<TrackHandle> {
        self.with_existing(guild_id, |player| {
            let track = player.track.take();
            player.clear();
            track
        })
        .await
        .flatten()
    }

    /// Drop the guild's player entirely, volume included.
    ///
    /// Used when the bot leaves a guild.
    pub async fn remove(&self, guild_id: GuildId) -> Option<GuildPlayer> {
        self.players.write().await.remove(&guild_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song {
        Song::new(title, title, UserId::new(1), ChannelId::new(2))
    }

    #[test]
    fn player_defaults() {
        let player = GuildPlayer::default();
        assert!(player.queue.is_empty());
        assert!(player.is_idle());
        assert!(!player.paused);
        assert!((player.volume() - 0.5).abs() < f32::EPSILON);
        assert_eq!(player.volume_percent(), 50);
    }

    #[test]
    fn advance_plays_songs_in_order() {
        let mut player = GuildPlayer::default();
        assert_eq!(player.enqueue(song("a")), 1);
        assert_eq!(player.enqueue(song("b")), 2);

        assert_eq!(player.advance().map(|s| s.title), Some("a".to_string()));
        assert_eq!(player.current.as_ref().map(|s| s.title.as_str()), Some("a"));
        assert_eq!(player.advance().map(|s| s.title), Some("b".to_string()));
        assert_eq!(player.advance(), None);
        assert!(player.is_idle());
    }

    #[test]
    fn advance_resets_pause() {
        let mut player = GuildPlayer::default();
        player.enqueue_all(vec![song("a"), song("b")]);
        let cue = player.cue_next().expect("cued");
        assert!(player.mark_playing(cue.turn));
        assert!(player.pause());
        player.advance();
        assert!(!player.paused);
    }

    #[test]
    fn pause_and_resume_only_when_applicable() {
        let mut player = GuildPlayer::default();
        assert!(!player.pause(), "nothing playing");
        assert!(!player.resume(), "not paused");

        player.enqueue(song("a"));
        let cue = player.cue_next().expect("cued");
        assert!(!player.pause(), "still resolving");
        assert!(player.mark_playing(cue.turn));
        assert!(player.pause());
        assert!(!player.pause(), "already paused");
        assert!(player.resume());
        assert!(!player.resume(), "already playing");
    }

    #[test]
    fn volume_is_clamped_between_zero_and_double() {
        let mut player = GuildPlayer::default();
        for _ in 0..30 {
            player.volume_up();
        }
        assert_eq!(player.volume_percent(), 200);
        assert!((player.volume() - 2.0).abs() < f32::EPSILON);

        for _ in 0..30 {
            player.volume_down();
        }
        assert_eq!(player.volume_percent(), 0);
        assert!(player.volume().abs() < f32::EPSILON);
    }

    #[test]
    fn volume_steps_are_exact() {
        let mut player = GuildPlayer::default();
        player.volume_up();
        player.volume_up();
        player.volume_down();
        assert_eq!(player.volume_percent(), 60);
    }

    #[test]
    fn clear_keeps_volume() {
        let mut player = GuildPlayer::default();
        player.volume_up();
        player.enqueue_all(vec![song("a"), song("b")]);
        player.advance();
        player.pause();
        player.clear();

        assert!(player.queue.is_empty());
        assert!(player.is_idle());
        assert!(!player.paused);
        assert_eq!(player.volume_percent(), 60);
    }

    #[tokio::test]
    async fn jukebox_keeps_guilds_apart() {
        let jukebox = Jukebox::new();
        let first = GuildId::new(10);
        let second = GuildId::new(20);

        jukebox.enqueue(first, song("a")).await;
        jukebox.enqueue_all(second, vec![song("x"), song("y")]).await;

        assert_eq!(
            jukebox.cue_if_idle(first).await.map(|cue| cue.song.title),
            Some("a".to_string())
        );
        assert!(jukebox.cue_if_idle(first).await.is_none(), "already busy");
        let (current, upcoming) = jukebox.snapshot(second).await;
        assert!(current.is_none());
        assert_eq!(upcoming.len(), 2);
        assert!(!jukebox.is_idle(first).await);
        assert!(jukebox.is_idle(second).await);
    }

    #[tokio::test]
    async fn unknown_guilds_are_idle_and_empty() {
        let jukebox = Jukebox::new();
        let guild = GuildId::new(99);
        assert!(!jukebox.has_player(guild).await);
        assert!(jukebox.is_idle(guild).await);
        assert_eq!(jukebox.snapshot(guild).await, (None, Vec::new()));
        assert!(jukebox.clear(guild).await.is_none());
        assert!((jukebox.volume(guild).await - 0.5).abs() < f32::EPSILON);
        assert!(!jukebox.has_player(guild).await, "clear must not create a player");
    }

    #[tokio::test]
    async fn clear_empties_the_guild() {
        let jukebox = Jukebox::new();
        let guild = GuildId::new(5);
        jukebox.enqueue_all(guild, vec![song("a"), song("b")]).await;
        jukebox.cue_if_idle(guild).await;
        jukebox.clear(guild).await;

        assert_eq!(jukebox.snapshot(guild).await, (None, Vec::new()));
        assert!(jukebox.has_player(guild).await);

        assert!(jukebox.remove(guild).await.is_some());
        assert!(!jukebox.has_player(guild).await);
    }

    #[test]
    fn track_end_is_claimed_once() {
        let mut player = GuildPlayer::default();
        player.enqueue_all(vec![song("a"), song("b")]);
        let cue = player.cue_next().expect("cued");
        assert!(player.mark_playing(cue.turn));

        assert_eq!(player.claim_ended(cue.turn).map(|s| s.title), Some("a".to_string()));
        assert!(player.claim_ended(cue.turn).is_none(), "second event for the same track");
        assert!(!player.is_playing());

        let next = player.cue_after(cue.turn).expect("next song");
        assert_eq!(next.song.title, "b");
        assert!(player.cue_after(cue.turn).is_none(), "stale turn cannot advance again");
    }

    #[test]
    fn nothing_is_claimed_while_resolving() {
        let mut player = GuildPlayer::default();
        player.enqueue(song("a"));
        let cue = player.cue_next().expect("cued");
        assert!(player.claim_ended(cue.turn).is_none());
    }

    #[test]
    fn clear_makes_the_running_turn_stale() {
        let mut player = GuildPlayer::default();
        player.enqueue_all(vec![song("a"), song("b")]);
        let playing = player.cue_next().expect("cued");
        assert!(player.mark_playing(playing.turn));
        player.clear();

        assert!(player.claim_ended(playing.turn).is_none());
        assert!(player.cue_after(playing.turn).is_none());
        assert!(player.is_idle());
    }

    #[test]
    fn track_resolved_after_clear_is_rejected() {
        let mut player = GuildPlayer::default();
        player.enqueue(song("a"));
        let cue = player.cue_next().expect("cued");
        assert!(player.is_pending(cue.turn));

        player.clear();
        assert!(!player.is_pending(cue.turn));
        assert!(!player.mark_playing(cue.turn));

        // A new song queued after the stop gets its own turn.
        player.enqueue(song("a"));
        let again = player.cue_next().expect("cued");
        assert_ne!(again.turn, cue.turn);
        assert!(!player.mark_playing(cue.turn));
        assert!(player.mark_playing(again.turn));
        assert!(!player.mark_playing(again.turn), "attached once");
    }

    #[tokio::test]
    async fn jukebox_rejects_stale_turns() {
        let jukebox = Jukebox::new();
        let guild = GuildId::new(7);
        jukebox.enqueue(guild, song("a")).await;
        let cue = jukebox.cue_if_idle(guild).await.expect("cued");
        assert!(jukebox.is_pending(guild, cue.turn).await);

        jukebox.clear(guild).await;
        assert!(!jukebox.is_pending(guild, cue.turn).await);
        assert!(jukebox.claim_ended(guild, cue.turn).await.is_none());
        assert!(jukebox.cue_after(guild, cue.turn).await.is_none());
    }
}
