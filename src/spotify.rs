//! Spotify artist lookup and link resolution.

mod client;
mod embed;
mod link;
mod models;

use log::info;
use poise::CreateReply;

use crate::bot::Data;
use crate::error::{BotError, Result};

pub use client::{MAX_PLAYLIST_TRACKS, SpotifyClient};
pub use embed::{artist_embed, artist_link_row, release_embed};
pub use link::{SpotifyLink, is_spotify_url};
pub use models::{Album, Artist, Track};

type Context<'a> = poise::Context<'a, Data, BotError>;

const LATEST_ALBUM_LIMIT: usize = 5;

/// Look up an artist on Spotify.
#[poise::command(slash_command, prefix_command)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Artist name"]
    #[rest]
    artist_name: String,
) -> Result<()> {
    let spotify = ctx
        .data()
        .spotify
        .as_ref()
        .ok_or(BotError::SpotifyNotConfigured)?;

    ctx.defer().await?;

    let Some(artist) = spotify.search_artist(&artist_name).await? else {
        ctx.say("🎵 Artist not found.").await?;
        return Ok(());
    };
    info!("Spotify search '{}' matched {}", artist_name, artist.name);

    let (top_tracks, albums) = futures::try_join!(
        spotify.top_tracks(&artist.id),
        spotify.latest_albums(&artist.id, LATEST_ALBUM_LIMIT),
    )?;

    let mention = ctx.data().config.roles.member_mention();
    let mut reply = CreateReply::default().embed(artist_embed(
        &artist,
        &top_tracks,
        &albums,
        mention.as_deref(),
    ));
    if let Some(mention) = mention {
        reply = reply.content(mention);
    }
    if let Some(row) = artist_link_row(&artist) {
        reply = reply.components(vec![row]);
    }

    ctx.send(reply).await?;
    Ok(())
}
