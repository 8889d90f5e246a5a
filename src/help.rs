use poise::CreateReply;
use poise::serenity_prelude::CreateEmbed;

use crate::bot::Data;
use crate::error::{BotError, Result};
use crate::types::colors;

type Context<'a> = poise::Context<'a, Data, BotError>;

const COMMAND_GROUPS: [(&str, &str); 4] = [
    ("General", "`help`, `post`, `announce`, `search`, `lyrics`, `ask`"),
    ("Music", "`play`, `queuelist`, `reset`, `controls`"),
    ("Tickets", "`setup_tickets` (administrators)"),
    (
        "Announcements",
        "New Spotify releases and YouTube uploads are posted automatically.",
    ),
];

#[must_use]
pub fn help_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("📖 Help Menu")
        .description(format!(
            "Available commands (use `{prefix}command` or slash commands):"
        ))
        .color(colors::BLUE)
        .fields(
            COMMAND_GROUPS
                .iter()
                .map(|(name, value)| (*name, *value, false)),
        )
}

/// Show the help menu.
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<()> {
    let embed = help_embed(&ctx.data().config.command_prefix);
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_every_group() {
        let embed = serde_json::to_value(help_embed("!")).expect("serializable");
        assert_eq!(embed["title"], "📖 Help Menu");
        assert!(embed["description"].as_str().is_some_and(|d| d.contains("`!command`")));

        let fields = embed["fields"].as_array().expect("fields");
        assert_eq!(fields.len(), COMMAND_GROUPS.len());
        assert_eq!(fields[0]["name"], "General");
        assert!(
            fields[1]["value"]
                .as_str()
                .is_some_and(|v| v.contains("`play`"))
        );
    }
}
