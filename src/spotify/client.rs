//! Spotify Web API client using the client-credentials flow.

use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::config::SpotifyConfig;
use crate::error::{BotError, Result};

use super::models::{
    Album, Artist, ArtistSearch, Paging, PlaylistItem, Token, TopTracks, Track,
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_URL: &str = "https://api.spotify.com/v1";
const MARKET: &str = "US";

/// Refresh tokens this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on tracks pulled from one playlist.
pub const MAX_PLAYLIST_TRACKS: usize = 500;

/// Albums shorter than this are not listed as albums.
pub const MIN_ALBUM_TRACKS: u32 = 3;

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct SpotifyClient {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
    Err(BotError::SpotifyApi { status, message })
}

/// Keep albums with enough tracks, at most `limit`, in listing order.
#[must_use]
pub fn filter_full_albums(albums: Vec<Album>, limit: usize) -> Vec<Album> {
    albums
        .into_iter()
        .filter(|album| album.total_tracks >= MIN_ALBUM_TRACKS)
        .take(limit)
        .collect()
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig, http: reqwest::Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            http,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, requesting a new one when needed.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.value.clone());
        }

        debug!("Requesting Spotify access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        let token: Token = check_status(response).await?.json().await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        info!("Obtained Spotify access token valid for {}s", lifetime.as_secs());

        let value = token.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.access_token().await?;
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Find the best matching artist for a name.
    pub async fn search_artist(&self, name: &str) -> Result<Option<Artist>> {
        let search: ArtistSearch = self
            .get(
                &format!("{API_URL}/search"),
                &[("q", name), ("type", "artist"), ("limit", "1")],
            )
            .await?;
        Ok(search.artists.items.into_iter().next())
    }

    pub async fn top_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        let top: TopTracks = self
            .get(
                &format!("{API_URL}/artists/{artist_id}/top-tracks"),
                &[("market", MARKET)],
            )
            .await?;
        Ok(top.tracks)
    }

    /// Latest albums and singles with at least [`MIN_ALBUM_TRACKS`] tracks.
    pub async fn latest_albums(&self, artist_id: &str, limit: usize) -> Result<Vec<Album>> {
        let fetch = (limit * 2).clamp(1, 50).to_string();
        let page: Paging<Album> = self
            .get(
                &format!("{API_URL}/artists/{artist_id}/albums"),
                &[
                    ("include_groups", "album,single"),
                    ("limit", fetch.as_str()),
                    ("market", MARKET),
                ],
            )
            .await?;
        Ok(filter_full_albums(page.items, limit))
    }

    /// Most recent single or album of an artist.
    pub async fn latest_release(&self, artist_id: &str) -> Result<Option<Album>> {
        let page: Paging<Album> = self
            .get(
                &format!("{API_URL}/artists/{artist_id}/albums"),
                &[("include_groups", "single,album"), ("limit", "1")],
            )
            .await?;
        Ok(page.items.into_iter().next())
    }

    pub async fn track(&self, track_id: &str) -> Result<Track> {
        self.get(&format!("{API_URL}/tracks/{track_id}"), &[]).await
    }

    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut next = Some(format!("{API_URL}/albums/{album_id}/tracks?limit=50"));
        while let Some(url) = next {
            let page: Paging<Track> = self.get(&url, &[]).await?;
            tracks.extend(page.items);
            next = page.next;
        }
        Ok(tracks)
    }

    /// Tracks of a playlist, following pagination up to [`MAX_PLAYLIST_TRACKS`].
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "{API_URL}/playlists/{playlist_id}/tracks?limit=100"
        ));
        while let Some(url) = next {
            let page: Paging<PlaylistItem> = self.get(&url, &[]).await?;
            tracks.extend(page.items.into_iter().filter_map(|item| item.track));
            if tracks.len() >= MAX_PLAYLIST_TRACKS {
                tracks.truncate(MAX_PLAYLIST_TRACKS);
                break;
            }
            next = page.next;
        }
        Ok(tracks)
    }
}
