//! Subset of the Spotify Web API objects the bot reads.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Track {
    /// Phrase used to find this track on YouTube.
    #[must_use]
    pub fn search_query(&self) -> String {
        match self.artists.first() {
            Some(artist) => format!("{} {}", self.name, artist.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub total_tracks: u32,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistSearch {
    pub artists: Paging<Artist>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracks {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    /// Null for tracks removed from the catalogue.
    pub track: Option<Track>,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_search_parses_minimal_payload() {
        let body = r#"{"artists":{"items":[{
            "id":"6rhenHsRHjPnQIcawW67VQ",
            "name":"Artist",
            "external_urls":{"spotify":"https://open.spotify.com/artist/6rhenHsRHjPnQIcawW67VQ"},
            "images":[{"url":"https://i.scdn.co/image/a","height":640,"width":640}],
            "followers":{"href":null,"total":12345},
            "genres":["pop","indie"]
        }],"next":null}}"#;
        let search: ArtistSearch = serde_json::from_str(body).expect("valid payload");
        let artist = &search.artists.items[0];
        assert_eq!(artist.name, "Artist");
        assert_eq!(artist.followers.total, 12345);
        assert_eq!(artist.genres, vec!["pop", "indie"]);
    }

    #[test]
    fn removed_playlist_tracks_are_null() {
        let body = r#"{"items":[{"track":null},{"track":{"name":"Song","artists":[{"name":"Band"}]}}],"next":"https://api.spotify.com/v1/playlists/x/tracks?offset=100"}"#;
        let page: Paging<PlaylistItem> = serde_json::from_str(body).expect("valid payload");
        assert!(page.items[0].track.is_none());
        assert!(page.next.is_some());
    }

    #[test]
    fn search_query_uses_first_artist() {
        let track = Track {
            name: "Song".to_string(),
            artists: vec![
                SimpleArtist {
                    name: "Band".to_string(),
                },
                SimpleArtist {
                    name: "Feature".to_string(),
                },
            ],
            external_urls: ExternalUrls::default(),
        };
        assert_eq!(track.search_query(), "Song Band");
    }
}
