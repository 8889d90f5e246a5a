use url::Url;

/// A playable Spotify resource referenced by a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Album(String),
    Playlist(String),
}

impl SpotifyLink {
    /// Parse links like `https://open.spotify.com/intl-de/track/<id>?si=...`.
    ///
    /// Returns `None` for anything that is not a Spotify track, album or
    /// playlist link.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let url = Url::parse(input.trim()).ok()?;
        let host = url.host_str()?;
        if host != "spotify.com" && !host.ends_with(".spotify.com") {
            return None;
        }

        let segments: Vec<&str> = url
            .path_segments()?
            .filter(|segment| !segment.is_empty() && !segment.starts_with("intl-"))
            .collect();

        match segments.as_slice() {
            ["track", id, ..] => Some(Self::Track((*id).to_string())),
            ["album", id, ..] => Some(Self::Album((*id).to_string())),
            ["playlist", id, ..] => Some(Self::Playlist((*id).to_string())),
            _ => None,
        }
    }
}

/// Whether the text looks like any Spotify URL, playable or not.
#[must_use]
pub fn is_spotify_url(input: &str) -> bool {
    Url::parse(input.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .is_some_and(|host| host == "spotify.com" || host.ends_with(".spotify.com"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_links_with_query_strings() {
        assert_eq!(
            SpotifyLink::parse("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc"),
            Some(SpotifyLink::Track("4uLU6hMCjMI75M1A2tKUQC".to_string()))
        );
    }

    #[test]
    fn parses_localised_playlist_and_album_links() {
        assert_eq!(
            SpotifyLink::parse("https://open.spotify.com/intl-de/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            Some(SpotifyLink::Playlist("37i9dQZF1DXcBWIGoYBM5M".to_string()))
        );
        assert_eq!(
            SpotifyLink::parse("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3/"),
            Some(SpotifyLink::Album("1DFixLWuPkv3KT3TnV35m3".to_string()))
        );
    }

    #[test]
    fn rejects_other_links() {
        assert!(SpotifyLink::parse("https://open.spotify.com/artist/123").is_none());
        assert!(SpotifyLink::parse("https://www.youtube.com/watch?v=abc").is_none());
        assert!(SpotifyLink::parse("https://notspotify.com/track/abc").is_none());
        assert!(SpotifyLink::parse("never gonna give you up").is_none());
    }

    #[test]
    fn detects_unplayable_spotify_urls() {
        assert!(is_spotify_url("https://open.spotify.com/artist/123"));
        assert!(!is_spotify_url("https://youtu.be/abc"));
        assert!(!is_spotify_url("spotify song"));
    }
}
