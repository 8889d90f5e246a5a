use log::{info, warn};
use poise::serenity_prelude::{Context, CreateEmbed, CreateEmbedFooter, CreateMessage, Member, Mentionable};

use crate::config::Config;
use crate::error::Result;
use crate::types::colors;

#[must_use]
pub fn welcome_embed(mention: &str, guild_name: &str, avatar_url: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎉 Welcome!")
        .description(format!("👋 Hello {mention}, welcome to **{guild_name}**!"))
        .color(colors::GREEN)
        .thumbnail(avatar_url)
        .footer(CreateEmbedFooter::new("Enjoy your stay!"))
}

/// Give a new member the member role and greet them.
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn greet(ctx: &Context, member: &Member, config: &Config) -> Result<()> {
    info!("{} joined guild {}", member.user.tag(), member.guild_id);

    if let Some(role) = config.roles.member
        && let Err(e) = member.add_role(&ctx.http, role).await
    {
        warn!("Cannot assign member role to {}: {e}", member.user.tag());
    }

    let Some(channel) = config.channels.welcome else {
        return Ok(());
    };

    let guild_name = ctx
        .cache
        .guild(member.guild_id)
        .map_or_else(|| "the server".to_string(), |guild| guild.name.clone());

    let embed = welcome_embed(&member.mention().to_string(), &guild_name, &member.face());
    channel
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}
