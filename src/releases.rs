//! Background polling for new Spotify releases and YouTube uploads.

use std::sync::Arc;

use log::{debug, error, info};
use poise::serenity_prelude::{ChannelId, CreateAllowedMentions, CreateMessage, Http, RoleId};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::config::Config;
use crate::error::Result;
use crate::spotify::{SpotifyClient, release_embed};
use crate::youtube::{YoutubeClient, video_embed, watch_button_row};

/// Remembers the last item seen so only changes are announced.
#[derive(Debug, Default)]
pub struct ReleaseWatcher {
    last_seen: Option<String>,
}

impl ReleaseWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`, returning whether it is new.
    ///
    /// The first id ever observed only seeds the watcher, so a restart does
    /// not re-announce the current release.
    pub fn observe(&mut self, id: &str) -> bool {
        match self.last_seen.as_deref() {
            Some(last) if last == id => false,
            Some(_) => {
                self.last_seen = Some(id.to_string());
                true
            }
            None => {
                self.last_seen = Some(id.to_string());
                false
            }
        }
    }
}

struct SpotifyFeed {
    client: Arc<SpotifyClient>,
    artist_id: String,
    channel: ChannelId,
    watcher: ReleaseWatcher,
}

struct YoutubeFeed {
    client: YoutubeClient,
    channel_id: String,
    channel: ChannelId,
    watcher: ReleaseWatcher,
}

fn announcement(member_role: Option<RoleId>) -> CreateMessage {
    let mut message = CreateMessage::new();
    if let Some(role) = member_role {
        message = message
            .content(format!("<@&{role}>"))
            .allowed_mentions(CreateAllowedMentions::new().roles(vec![role]));
    }
    message
}

impl SpotifyFeed {
    async fn poll(&mut self, http: &Http, member_role: Option<RoleId>) -> Result<()> {
        let Some(album) = self.client.latest_release(&self.artist_id).await? else {
            debug!("No Spotify releases for artist {}", self.artist_id);
            return Ok(());
        };
        if !self.watcher.observe(&album.id) {
            return Ok(());
        }

        info!("New Spotify release: {}", album.name);
        let message = announcement(member_role).embed(release_embed(&album));
        self.channel.send_message(http, message).await?;
        Ok(())
    }
}

impl YoutubeFeed {
    async fn poll(&mut self, http: &Http, member_role: Option<RoleId>) -> Result<()> {
        let Some(video) = self.client.latest_video(&self.channel_id).await? else {
            debug!("No uploads for YouTube channel {}", self.channel_id);
            return Ok(());
        };
        if !self.watcher.observe(&video.id) {
            return Ok(());
        }

        info!("New YouTube upload: {}", video.title);
        let message = announcement(member_role)
            .embed(video_embed(&video))
            .components(vec![watch_button_row(&video.id)]);
        self.channel.send_message(http, message).await?;
        Ok(())
    }
}

/// Start the polling task, if any feed is fully configured.
pub fn spawn_release_watchers(
    http: Arc<Http>,
    config: &Config,
    spotify: Option<Arc<SpotifyClient>>,
    youtube: Option<YoutubeClient>,
) -> Option<JoinHandle<()>> {
    let mut spotify_feed = spotify.and_then(|client| {
        let artist_id = config.spotify.as_ref()?.artist_id.clone()?;
        let channel = config.channels.spotify_announcements?;
        Some(SpotifyFeed {
            client,
            artist_id,
            channel,
            watcher: ReleaseWatcher::new(),
        })
    });
    let mut youtube_feed = youtube.and_then(|client| {
        let channel_id = config.youtube.as_ref()?.channel_id.clone()?;
        let channel = config.channels.youtube_announcements?;
        Some(YoutubeFeed {
            client,
            channel_id,
            channel,
            watcher: ReleaseWatcher::new(),
        })
    });

    if spotify_feed.is_none() && youtube_feed.is_none() {
        info!("Release announcements disabled");
        return None;
    }

    let member_role = config.roles.member;
    let period = config.release_poll_interval;
    info!(
        "Polling for new releases every {}s (spotify: {}, youtube: {})",
        period.as_secs(),
        spotify_feed.is_some(),
        youtube_feed.is_some()
    );

    Some(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(feed) = spotify_feed.as_mut()
                && let Err(e) = feed.poll(&http, member_role).await
            {
                error!("Spotify release check failed: {e}");
            }
            if let Some(feed) = youtube_feed.as_mut()
                && let Err(e) = feed.poll(&http, member_role).await
            {
                error!("YouTube upload check failed: {e}");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_only_seeds() {
        let mut watcher = ReleaseWatcher::new();
        assert!(!watcher.observe("a"));
        assert!(!watcher.observe("a"));
    }

    #[test]
    fn changes_are_reported_once() {
        let mut watcher = ReleaseWatcher::new();
        watcher.observe("a");
        assert!(watcher.observe("b"));
        assert!(!watcher.observe("b"));
        assert!(watcher.observe("a"), "a re-published id counts as new");
    }

    #[test]
    fn announcement_mentions_member_role() {
        let message = serde_json::to_value(announcement(Some(RoleId::new(42)))).expect("serializable");
        assert_eq!(message["content"], "<@&42>");
        assert!(message["allowed_mentions"].is_object());
    }

    #[test]
    fn announcement_without_role_has_no_content() {
        let message = serde_json::to_value(announcement(None)).expect("serializable");
        assert!(message.get("content").is_none_or(serde_json::Value::is_null));
    }
}
