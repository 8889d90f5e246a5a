use chrono::NaiveDate;
use poise::serenity_prelude::{CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter};

use crate::types::{EMBED_TITLE_CHARS, colors, truncate_chars};

use super::models::{Album, Artist, Track};

const FOOTER_ICON: &str = "https://cdn-icons-png.flaticon.com/512/2111/2111624.png";

/// Format a number with comma thousands separators.
#[must_use]
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn track_line(track: &Track) -> String {
    match &track.external_urls.spotify {
        Some(url) => format!("🎵 [{}]({url})", track.name),
        None => format!("🎵 {}", track.name),
    }
}

fn album_line(album: &Album) -> String {
    let name = match &album.external_urls.spotify {
        Some(url) => format!("[{}]({url})", album.name),
        None => album.name.clone(),
    };
    format!("📀 {name} ({} tracks)", album.total_tracks)
}

#[must_use]
pub fn artist_embed(
    artist: &Artist,
    top_tracks: &[Track],
    albums: &[Album],
    member_mention: Option<&str>,
) -> CreateEmbed {
    let description = match member_mention {
        Some(mention) => format!("{mention}\n🎵 Discover this artist on Spotify!"),
        None => "🎵 Discover this artist on Spotify!".to_string(),
    };

    let genres = if artist.genres.is_empty() {
        "N/A".to_string()
    } else {
        artist.genres.join(", ")
    };

    let top = if top_tracks.is_empty() {
        "No tracks found.".to_string()
    } else {
        top_tracks
            .iter()
            .take(5)
            .map(track_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let latest = if albums.is_empty() {
        "No albums found.".to_string()
    } else {
        albums.iter().map(album_line).collect::<Vec<_>>().join("\n")
    };

    let mut embed = CreateEmbed::new()
        .title(truncate_chars(&artist.name, EMBED_TITLE_CHARS))
        .description(description)
        .color(colors::SPOTIFY_GREEN)
        .field("👥 Followers", thousands(artist.followers.total), true)
        .field("🎸 Genres", genres, true)
        .field("🔥 Top Songs (Top 5)", top, false)
        .field("📀 Latest Albums (min 3 tracks each)", latest, false)
        .footer(CreateEmbedFooter::new("Powered by Spotify API 🎶").icon_url(FOOTER_ICON));

    if let Some(url) = &artist.external_urls.spotify {
        embed = embed.url(url);
    }
    if let Some(image) = artist.images.first() {
        embed = embed.thumbnail(&image.url);
    }
    embed
}

/// "Open in Spotify" link button, if the artist has a public page.
#[must_use]
pub fn artist_link_row(artist: &Artist) -> Option<CreateActionRow> {
    artist.external_urls.spotify.as_ref().map(|url| {
        CreateActionRow::Buttons(vec![CreateButton::new_link(url).label("Open in Spotify")])
    })
}

#[must_use]
pub fn release_embed(album: &Album) -> CreateEmbed {
    let link = album
        .external_urls
        .spotify
        .as_ref()
        .map(|url| format!("\n[Listen here]({url})"))
        .unwrap_or_default();

    let mut embed = CreateEmbed::new()
        .title("🎵 New Release!")
        .description(format!("**{}** is out!{link}", album.name))
        .color(colors::GREEN);

    if let Some(date) = album.release_date.as_deref().and_then(format_release_date) {
        embed = embed.field("📅 Released", date, true);
    }
    embed
}

/// Spotify dates come as `YYYY-MM-DD`, `YYYY-MM` or `YYYY` depending on precision.
fn format_release_date(date: &str) -> Option<String> {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(day.format("%B %-d, %Y").to_string());
    }
    NaiveDate::parse_from_str(&format!("{date}-01"), "%Y-%m-%d")
        .ok()
        .map(|month| month.format("%B %Y").to_string())
        .or_else(|| (date.len() == 4 && date.parse::<u16>().is_ok()).then(|| date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::models::{ExternalUrls, Followers, Image, SimpleArtist};

    fn artist() -> Artist {
        Artist {
            id: "a1".to_string(),
            name: "Artist".to_string(),
            external_urls: ExternalUrls {
                spotify: Some("https://open.spotify.com/artist/a1".to_string()),
            },
            images: vec![Image {
                url: "https://i.scdn.co/image/x".to_string(),
            }],
            followers: Followers { total: 1_234_567 },
            genres: Vec::new(),
        }
    }

    #[test]
    fn long_artist_names_fit_the_title() {
        let mut artist = artist();
        artist.name = "x".repeat(400);
        let embed = serde_json::to_value(artist_embed(&artist, &[], &[], None)).expect("serializable");
        assert_eq!(
            embed["title"].as_str().map(|t| t.chars().count()),
            Some(EMBED_TITLE_CHARS)
        );
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn artist_embed_fields() {
        let tracks = vec![Track {
            name: "Hit".to_string(),
            artists: vec![SimpleArtist {
                name: "Artist".to_string(),
            }],
            external_urls: ExternalUrls {
                spotify: Some("https://open.spotify.com/track/t1".to_string()),
            },
        }];
        let embed = serde_json::to_value(artist_embed(&artist(), &tracks, &[], Some("<@&1>")))
            .expect("serializable");

        assert_eq!(embed["title"], "Artist");
        assert_eq!(embed["url"], "https://open.spotify.com/artist/a1");
        assert_eq!(
            embed["description"],
            "<@&1>\n🎵 Discover this artist on Spotify!"
        );
        assert_eq!(embed["thumbnail"]["url"], "https://i.scdn.co/image/x");
        let fields = embed["fields"].as_array().expect("fields");
        assert_eq!(fields[0]["value"], "1,234,567");
        assert_eq!(fields[1]["value"], "N/A");
        assert_eq!(
            fields[2]["value"],
            "🎵 [Hit](https://open.spotify.com/track/t1)"
        );
        assert_eq!(fields[3]["value"], "No albums found.");
    }

    #[test]
    fn release_embed_links_to_album() {
        let album = Album {
            id: "al".to_string(),
            name: "New Album".to_string(),
            external_urls: ExternalUrls {
                spotify: Some("https://open.spotify.com/album/al".to_string()),
            },
            total_tracks: 10,
            release_date: Some("2026-10-01".to_string()),
        };
        let embed = serde_json::to_value(release_embed(&album)).expect("serializable");
        assert_eq!(
            embed["description"],
            "**New Album** is out!\n[Listen here](https://open.spotify.com/album/al)"
        );
        assert_eq!(embed["fields"][0]["value"], "October 1, 2026");
    }

    #[test]
    fn release_dates_of_every_precision() {
        assert_eq!(format_release_date("2024-03-09").as_deref(), Some("March 9, 2024"));
        assert_eq!(format_release_date("2024-03").as_deref(), Some("March 2024"));
        assert_eq!(format_release_date("2024").as_deref(), Some("2024"));
        assert!(format_release_date("soon").is_none());
    }
}
