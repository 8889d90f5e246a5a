//! Private-thread tickets opened from a persistent panel.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use poise::CreateReply;
use poise::serenity_prelude::{
    ButtonStyle, Channel, ChannelId, ChannelType, ComponentInteraction, Context, CreateActionRow,
    CreateButton, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, CreateThread, EditThread, Http, Mentionable,
};
use strum::{Display, EnumString};

use crate::bot::{Data, delete_invocation};
use crate::error::{BotError, Result};
use crate::types::colors;

type PoiseContext<'a> = poise::Context<'a, Data, BotError>;

/// Prefix shared by every ticket button id.
pub const CUSTOM_ID_PREFIX: &str = "ticket_";

/// How long before closing a ticket its thread is warned.
const WARNING_LEAD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TicketKind {
    #[strum(to_string = "Song Request")]
    Song,
    #[strum(to_string = "Cover Request")]
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TicketButton {
    #[strum(serialize = "ticket_open_song")]
    OpenSong,
    #[strum(serialize = "ticket_open_cover")]
    OpenCover,
    #[strum(serialize = "ticket_close")]
    Close,
}

#[must_use]
pub fn panel_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("🎟️ Open a Ticket")
        .description(
            "Choose an option below:\n\n\
             🎶 **Request Song** – suggest a new original song\n\
             🎤 **Request Cover** – suggest a cover song\n\n\
             A private thread will be created where you can talk with the team.",
        )
        .color(colors::BLUE)
}

#[must_use]
pub fn panel_row() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(TicketButton::OpenSong.to_string())
            .label("🎶 Request Song")
            .style(ButtonStyle::Primary),
        CreateButton::new(TicketButton::OpenCover.to_string())
            .label("🎤 Request Cover")
            .style(ButtonStyle::Secondary),
    ])
}

fn close_row() -> CreateActionRow {
    CreateActionRow::Buttons(vec![
        CreateButton::new(TicketButton::Close.to_string())
            .label("Close Ticket")
            .style(ButtonStyle::Danger),
    ])
}

#[must_use]
pub fn thread_name(kind: TicketKind, display_name: &str) -> String {
    format!("{kind} - {display_name}")
}

/// Delays before the inactivity warning and, after it, before closing.
///
/// Timeouts shorter than the warning lead warn immediately.
#[must_use]
pub fn auto_close_schedule(timeout: Duration) -> (Duration, Duration) {
    let until_warning = timeout.saturating_sub(WARNING_LEAD);
    (until_warning, timeout - until_warning)
}

/// Post the ticket panel in this channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setup_tickets(ctx: PoiseContext<'_>) -> Result<()> {
    ctx.send(
        CreateReply::default()
            .embed(panel_embed())
            .components(vec![panel_row()]),
    )
    .await?;
    info!("Ticket panel posted in channel {}", ctx.channel_id());
    delete_invocation(ctx).await;
    Ok(())
}

async fn log_ticket(http: &Http, log_channel: Option<ChannelId>, message: String) {
    let Some(channel) = log_channel else {
        return;
    };
    if let Err(e) = channel.say(http, message).await {
        warn!("Failed to write ticket log: {e}");
    }
}

async fn respond(ctx: &Context, interaction: &ComponentInteraction, content: String) -> Result<()> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn open_ticket(
    ctx: &Context,
    interaction: &ComponentInteraction,
    data: &Data,
    kind: TicketKind,
) -> Result<()> {
    let user = &interaction.user;
    let display_name = interaction
        .member
        .as_ref()
        .map_or_else(|| user.display_name(), |member| member.display_name());

    let thread = interaction
        .channel_id
        .create_thread(
            &ctx.http,
            CreateThread::new(thread_name(kind, display_name))
                .kind(ChannelType::PrivateThread)
                .invitable(false),
        )
        .await?;
    thread.id.add_thread_member(&ctx.http, user.id).await?;

    thread
        .id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .content(format!(
                    "👋 Hi {}, thank you for opening a **{kind}** ticket!\nPlease describe your request below.",
                    user.mention()
                ))
                .components(vec![close_row()]),
        )
        .await?;

    info!("{} opened {kind} ticket {}", user.tag(), thread.name);
    let log_channel = data.config.channels.ticket_log;
    log_ticket(
        &ctx.http,
        log_channel,
        format!(
            "📩 New **{kind}** ticket opened by {} → {}",
            user.mention(),
            thread.mention()
        ),
    )
    .await;

    tokio::spawn(auto_close(
        ctx.http.clone(),
        thread.id,
        thread.name.clone(),
        kind,
        data.config.ticket_timeout,
        log_channel,
    ));

    respond(
        ctx,
        interaction,
        format!(
            "✅ Your **{kind}** ticket has been created: {}",
            thread.mention()
        ),
    )
    .await
}

async fn is_archived(http: &Http, thread: ChannelId) -> Result<bool> {
    Ok(match thread.to_channel(http).await? {
        Channel::Guild(channel) => channel
            .thread_metadata
            .is_some_and(|metadata| metadata.archived),
        _ => false,
    })
}

async fn archive(http: &Http, thread: ChannelId) -> Result<()> {
    thread
        .edit_thread(http, EditThread::new().archived(true).locked(true))
        .await?;
    Ok(())
}

async fn auto_close(
    http: Arc<Http>,
    thread: ChannelId,
    name: String,
    kind: TicketKind,
    timeout: Duration,
    log_channel: Option<ChannelId>,
) {
    let (until_warning, until_close) = auto_close_schedule(timeout);

    tokio::time::sleep(until_warning).await;
    match is_archived(&http, thread).await {
        Ok(false) => {}
        Ok(true) => {
            debug!("Ticket {name} already closed");
            return;
        }
        Err(e) => {
            warn!("Could not check ticket {name}: {e}");
            return;
        }
    }
    if let Err(e) = thread
        .say(
            &http,
            format!("⚠ This {kind} ticket will be closed in 5 minutes due to inactivity."),
        )
        .await
    {
        warn!("Could not warn ticket {name}: {e}");
        return;
    }

    tokio::time::sleep(until_close).await;
    if matches!(is_archived(&http, thread).await, Ok(true)) {
        debug!("Ticket {name} already closed");
        return;
    }
    if let Err(e) = archive(&http, thread).await {
        warn!("Could not auto-close ticket {name}: {e}");
        return;
    }

    info!("Auto-closed {kind} ticket {name}");
    log_ticket(
        &http,
        log_channel,
        format!("📝 {kind} ticket `{name}` auto-closed due to inactivity."),
    )
    .await;
}

async fn close_ticket(ctx: &Context, interaction: &ComponentInteraction, data: &Data) -> Result<()> {
    let thread_name = interaction.channel.as_ref().and_then(|channel| {
        matches!(
            channel.kind,
            ChannelType::PrivateThread | ChannelType::PublicThread
        )
        .then(|| channel.name.clone().unwrap_or_default())
    });

    let Some(name) = thread_name else {
        return respond(ctx, interaction, BotError::NotATicketThread.user_message()).await;
    };

    respond(ctx, interaction, "✅ Ticket closed!".to_string()).await?;
    archive(&ctx.http, interaction.channel_id).await?;

    info!("{} closed ticket {name}", interaction.user.tag());
    log_ticket(
        &ctx.http,
        data.config.channels.ticket_log,
        format!(
            "📝 Ticket `{name}` closed by {}",
            interaction.user.mention()
        ),
    )
    .await;
    Ok(())
}

/// Handle a press of a ticket panel or close button.
///
/// # Errors
///
/// Returns an error if Discord rejects the thread operations.
pub async fn handle(ctx: &Context, interaction: &ComponentInteraction, data: &Data) -> Result<()> {
    let Ok(button) = interaction.data.custom_id.parse::<TicketButton>() else {
        debug!("Unknown ticket button {}", interaction.data.custom_id);
        return Ok(());
    };

    match button {
        TicketButton::OpenSong => open_ticket(ctx, interaction, data, TicketKind::Song).await,
        TicketButton::OpenCover => open_ticket(ctx, interaction, data, TicketKind::Cover).await,
        TicketButton::Close => close_ticket(ctx, interaction, data).await,
    }
}
