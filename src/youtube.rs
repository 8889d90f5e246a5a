//! YouTube Data API client for upload announcements.

use log::debug;
use poise::serenity_prelude::{
    CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter,
};
use serde::Deserialize;

use crate::config::YoutubeConfig;
use crate::error::{BotError, Result};
use crate::types::{EMBED_TITLE_CHARS, colors, truncate_chars};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const FOOTER_ICON: &str = "https://cdn-icons-png.flaticon.com/512/1384/1384060.png";
const DESCRIPTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ResourceId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// The latest upload of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
}

impl Video {
    #[must_use]
    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }
}

#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    api_key: String,
    http: reqwest::Client,
}

impl YoutubeClient {
    pub fn new(config: &YoutubeConfig, http: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            http,
        }
    }

    /// Fetch the most recent video uploaded to a channel.
    pub async fn latest_video(&self, channel_id: &str) -> Result<Option<Video>> {
        debug!("Fetching latest video of channel {channel_id}");
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("channelId", channel_id),
                ("part", "snippet,id"),
                ("order", "date"),
                ("maxResults", "1"),
                ("type", "video"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::YoutubeApi { status, message });
        }

        let body = response.text().await?;
        parse_latest_video(&body)
    }
}

fn parse_latest_video(body: &str) -> Result<Option<Video>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.items.into_iter().find_map(|item| {
        let id = item.id.video_id?;
        Some(Video {
            id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail: item.snippet.thumbnails.high.map(|t| t.url),
        })
    }))
}

#[must_use]
pub fn video_embed(video: &Video) -> CreateEmbed {
    let title = if video.title.is_empty() {
        "New Video"
    } else {
        video.title.as_str()
    };
    let preview: String = video
        .description
        .chars()
        .take(DESCRIPTION_PREVIEW_CHARS)
        .collect();

    let mut embed = CreateEmbed::new()
        .title(truncate_chars(&format!("📢 New Video: {title}"), EMBED_TITLE_CHARS))
        .description(format!(
            "{preview}...\n[▶️ Watch on YouTube]({})",
            video.watch_url()
        ))
        .color(colors::RED)
        .footer(CreateEmbedFooter::new("Powered by YouTube API 🎥").icon_url(FOOTER_ICON));

    if let Some(thumbnail) = &video.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

#[must_use]
pub fn watch_button_row(video_id: &str) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new_link(watch_url(video_id)).label("Watch on YouTube"),
    ])
}
