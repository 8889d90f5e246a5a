//! `/lyrics`: scraped song lyrics with page buttons.

use std::time::Duration;

use log::{debug, info};
use poise::CreateReply;
use poise::serenity_prelude::{
    ButtonStyle, ComponentInteractionCollector, CreateActionRow, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseMessage, EditMessage,
};
use scraper::{Html, Selector};

use crate::bot::Data;
use crate::error::{BotError, Result};
use crate::pagination::{LINE_PAGE_SIZE, Pager, paginate_lines};
use crate::types::{EMBED_TITLE_CHARS, colors, truncate_chars};

type Context<'a> = poise::Context<'a, Data, BotError>;

const SEARCH_URL: &str = "https://www.google.com/search";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const LYRICS_SELECTOR: &str = "div.BNeawe.tAd8D.AP7Wnd";
const VIEW_TIMEOUT: Duration = Duration::from_secs(120);

pub const NOT_FOUND: &str = "❌ Lyrics not found.";

/// Search for a song's lyrics and return them as plain text.
///
/// Returns [`NOT_FOUND`] when the result page has no lyrics block.
pub async fn fetch_lyrics(client: &reqwest::Client, song: &str) -> Result<String> {
    let query = format!("{song} lyrics");
    debug!("Searching lyrics for '{query}'");

    let html = client
        .get(SEARCH_URL)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .query(&[("q", query.as_str())])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(extract_lyrics(&html).unwrap_or_else(|| NOT_FOUND.to_string()))
}

/// Pull the lyrics blocks out of a search result page.
fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(LYRICS_SELECTOR).ok()?;

    let mut blocks: Vec<String> = document
        .select(&selector)
        .map(|block| {
            block
                .text()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|text| !text.trim().is_empty())
        .collect();
    // Result blocks are nested, so the same text is often matched twice in a row.
    blocks.dedup();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

#[must_use]
pub fn lyrics_embed(song: &str, page: &str, position: usize, total: usize) -> CreateEmbed {
    CreateEmbed::new()
        .title(truncate_chars(&format!("Lyrics: {song}"), EMBED_TITLE_CHARS))
        .description(page)
        .color(colors::PURPLE)
        .footer(CreateEmbedFooter::new(format!("Page {position}/{total}")))
}

fn pager_embed(song: &str, pager: &Pager) -> CreateEmbed {
    lyrics_embed(song, pager.current(), pager.position(), pager.len())
}

fn page_buttons(id_prefix: &str, pager: &Pager) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(format!("{id_prefix}prev"))
            .label("Previous")
            .style(ButtonStyle::Primary)
            .disabled(!pager.has_prev()),
        CreateButton::new(format!("{id_prefix}next"))
            .label("Next")
            .style(ButtonStyle::Primary)
            .disabled(!pager.has_next()),
    ])]
}

/// Show the lyrics of a song.
#[poise::command(slash_command, prefix_command)]
pub async fn lyrics(
    ctx: Context<'_>,
    #[description = "Song name"]
    #[rest]
    song: String,
) -> Result<()> {
    ctx.defer().await?;
    info!("{} requested lyrics for {}", ctx.author().tag(), song);

    let text = fetch_lyrics(&ctx.data().http_client, &song).await?;
    let mut pager = Pager::new(paginate_lines(&text, LINE_PAGE_SIZE), false);

    let id_prefix = format!("lyrics{}", ctx.id());
    let prev_id = format!("{id_prefix}prev");

    let reply = ctx
        .send(
            CreateReply::default()
                .embed(pager_embed(&song, &pager))
                .components(page_buttons(&id_prefix, &pager)),
        )
        .await?;
    let mut message = reply.message().await?.into_owned();

    while let Some(press) = ComponentInteractionCollector::new(ctx)
        .filter({
            let id_prefix = id_prefix.clone();
            move |press| press.data.custom_id.starts_with(&id_prefix)
        })
        .timeout(VIEW_TIMEOUT)
        .await
    {
        if press.data.custom_id == prev_id {
            pager.prev_page();
        } else {
            pager.next_page();
        }

        press
            .create_response(
                ctx.serenity_context(),
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .embed(pager_embed(&song, &pager))
                        .components(page_buttons(&id_prefix, &pager)),
                ),
            )
            .await?;
    }

    message
        .edit(
            ctx.serenity_context(),
            EditMessage::new()
                .embed(pager_embed(&song, &pager))
                .components(Vec::new()),
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lyrics_blocks_with_line_breaks() {
        let html = r#"<html><body>
            <div class="BNeawe tAd8D AP7Wnd">First line<br>Second &amp; third</div>
            <div class="other">not lyrics</div>
            <div class="BNeawe tAd8D AP7Wnd">Chorus</div>
        </body></html>"#;
        assert_eq!(
            extract_lyrics(html).as_deref(),
            Some("First line\nSecond & third\nChorus")
        );
    }

    #[test]
    fn nested_duplicate_blocks_are_collapsed() {
        let html = r#"<div class="BNeawe tAd8D AP7Wnd"><div class="BNeawe tAd8D AP7Wnd">Verse</div></div>"#;
        assert_eq!(extract_lyrics(html).as_deref(), Some("Verse"));
    }

    #[test]
    fn page_without_lyrics_yields_none() {
        assert!(extract_lyrics("<html><body><p>nothing</p></body></html>").is_none());
    }

    #[test]
    fn buttons_reflect_pager_ends() {
        let pager = Pager::new(vec!["a".into(), "b".into()], false);
        let rows = serde_json::to_value(page_buttons("x", &pager)).expect("serializable");
        let buttons = &rows[0]["components"];
        assert_eq!(buttons[0]["custom_id"], "xprev");
        assert_eq!(buttons[0]["disabled"], true);
        assert_eq!(buttons[1]["disabled"], false);
    }

    #[test]
    fn embed_has_song_title_and_page_footer() {
        let embed = serde_json::to_value(lyrics_embed("Song", "la la", 1, 4)).expect("serializable");
        assert_eq!(embed["title"], "Lyrics: Song");
        assert_eq!(embed["footer"]["text"], "Page 1/4");
    }

    #[test]
    fn long_song_names_fit_the_title() {
        let song = "la".repeat(300);
        let embed = serde_json::to_value(lyrics_embed(&song, "la la", 1, 1)).expect("serializable");
        let title = embed["title"].as_str().expect("title");
        assert_eq!(title.chars().count(), EMBED_TITLE_CHARS);
        assert!(title.starts_with("Lyrics: lala"));
    }
}
