//! Staff announcements to the member role.

use log::info;
use poise::CreateReply;
use poise::serenity_prelude::{CreateAllowedMentions, CreateEmbed, RoleId};

use crate::bot::{Data, delete_invocation};
use crate::error::{BotError, Result};
use crate::types::colors;

type Context<'a> = poise::Context<'a, Data, BotError>;

/// Whether any of the member's roles is a staff role.
#[must_use]
pub fn has_staff_role(member_roles: &[RoleId], staff_roles: &[RoleId]) -> bool {
    member_roles.iter().any(|role| staff_roles.contains(role))
}

async fn require_staff(ctx: Context<'_>) -> Result<()> {
    let staff = ctx.data().config.roles.staff_roles();
    let member = ctx.author_member().await.ok_or(BotError::NotInServer)?;
    if has_staff_role(&member.roles, &staff) {
        Ok(())
    } else {
        Err(BotError::MissingPermission)
    }
}

async fn send_to_members(ctx: Context<'_>, embed: CreateEmbed) -> Result<()> {
    let mut reply = CreateReply::default().embed(embed);
    if let Some(role) = ctx.data().config.roles.member {
        reply = reply
            .content(format!("<@&{role}>"))
            .allowed_mentions(CreateAllowedMentions::new().roles(vec![role]));
    }
    ctx.send(reply).await?;
    delete_invocation(ctx).await;
    Ok(())
}

#[must_use]
pub fn announcement_embed(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("📢 Announcement")
        .description(message)
        .color(colors::GREEN)
}

#[must_use]
pub fn post_embed(message: &str) -> CreateEmbed {
    CreateEmbed::new().description(message).color(colors::GREEN)
}

/// Announce something to all members.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "Announcement text"]
    #[rest]
    message: String,
) -> Result<()> {
    require_staff(ctx).await?;
    info!("{} announced: {}", ctx.author().tag(), message);
    send_to_members(ctx, announcement_embed(&message)).await
}

/// Post a message to all members without a title.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn post(
    ctx: Context<'_>,
    #[description = "Message text"]
    #[rest]
    message: String,
) -> Result<()> {
    require_staff(ctx).await?;
    info!("{} posted: {}", ctx.author().tag(), message);
    send_to_members(ctx, post_embed(&message)).await
}
