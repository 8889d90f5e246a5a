//! `/ask`: AI answers with paging and regeneration.

use std::time::Duration;

use log::{info, warn};
use poise::CreateReply;
use poise::serenity_prelude::{
    ButtonStyle, ComponentInteractionCollector, CreateActionRow, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, EditMessage,
};

use crate::bot::Data;
use crate::error::{BotError, Result};
use crate::pagination::{Pager, TEXT_PAGE_SIZE, paginate_text};
use crate::types::{colors, truncate_chars};

type Context<'a> = poise::Context<'a, Data, BotError>;

/// Buttons stop responding after this long without a press.
const VIEW_TIMEOUT: Duration = Duration::from_secs(600);

/// Leaves room for the page counter inside Discord's 2048 character footer.
const FOOTER_QUESTION_CHARS: usize = 1900;

#[must_use]
pub fn ai_embed(question: &str, page: &str, position: usize, total: usize) -> CreateEmbed {
    let description = if page.trim().is_empty() {
        "*No answer.*"
    } else {
        page
    };

    CreateEmbed::new()
        .title("🤖 AI Answer")
        .description(description)
        .color(colors::PURPLE)
        .footer(CreateEmbedFooter::new(format!(
            "Q: {} | Page {position}/{total}",
            truncate_chars(question, FOOTER_QUESTION_CHARS)
        )))
}

fn pager_embed(question: &str, pager: &Pager) -> CreateEmbed {
    ai_embed(question, pager.current(), pager.position(), pager.len())
}

fn answer_buttons(id_prefix: &str) -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(format!("{id_prefix}prev"))
            .label("⏮️ Prev")
            .style(ButtonStyle::Primary),
        CreateButton::new(format!("{id_prefix}next"))
            .label("⏭️ Next")
            .style(ButtonStyle::Primary),
        CreateButton::new(format!("{id_prefix}regen"))
            .label("Regenerate 🔄")
            .style(ButtonStyle::Success),
    ])
}

/// Final state of an expired view: the last page without buttons.
fn closed_view(question: &str, pager: &Pager) -> EditMessage {
    EditMessage::new()
        .embed(pager_embed(question, pager))
        .components(Vec::new())
}

/// Ask the AI a question.
#[poise::command(slash_command, prefix_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"]
    #[rest]
    question: String,
) -> Result<()> {
    let client = ctx.data().ai.as_ref().ok_or(BotError::AiNotConfigured)?;

    ctx.defer().await?;
    info!("{} asked: {}", ctx.author().tag(), question);

    let answer = client.ask(&question).await?;
    let mut pager = Pager::new(paginate_text(&answer, TEXT_PAGE_SIZE), true);

    let id_prefix = format!("ask{}", ctx.id());
    let prev_id = format!("{id_prefix}prev");
    let next_id = format!("{id_prefix}next");
    let regen_id = format!("{id_prefix}regen");

    let reply = ctx
        .send(
            CreateReply::default()
                .embed(pager_embed(&question, &pager))
                .components(vec![answer_buttons(&id_prefix)]),
        )
        .await?;
    // The command's interaction token expires long before an active view does.
    let mut message = reply.message().await?.into_owned();

    while let Some(press) = ComponentInteractionCollector::new(ctx)
        .filter({
            let id_prefix = id_prefix.clone();
            move |press| press.data.custom_id.starts_with(&id_prefix)
        })
        .timeout(VIEW_TIMEOUT)
        .await
    {
        let custom_id = press.data.custom_id.as_str();

        if custom_id == regen_id {
            press
                .create_response(ctx.serenity_context(), CreateInteractionResponse::Acknowledge)
                .await?;

            match client.ask(&question).await {
                Ok(answer) => {
                    pager.replace(paginate_text(&answer, TEXT_PAGE_SIZE));
                    press
                        .edit_response(
                            ctx.serenity_context(),
                            EditInteractionResponse::new()
                                .embed(pager_embed(&question, &pager))
                                .components(vec![answer_buttons(&id_prefix)]),
                        )
                        .await?;
                }
                Err(e) => {
                    warn!("Failed to regenerate answer: {e}");
                    press
                        .create_followup(
                            ctx.serenity_context(),
                            CreateInteractionResponseFollowup::new()
                                .content(e.user_message())
                                .ephemeral(true),
                        )
                        .await?;
                }
            }
            continue;
        }

        if custom_id == prev_id {
            pager.prev_page();
        } else if custom_id == next_id {
            pager.next_page();
        } else {
            continue;
        }

        press
            .create_response(
                ctx.serenity_context(),
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new().embed(pager_embed(&question, &pager)),
                ),
            )
            .await?;
    }

    message
        .edit(ctx.serenity_context(), closed_view(&question, &pager))
        .await?;

    Ok(())
}
