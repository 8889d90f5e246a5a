//! Discord bot core logic and event handling.

use std::sync::Arc;

use log::{debug, error, info, warn};
use poise::{
    Framework, FrameworkError, FrameworkOptions, PrefixFrameworkOptions, builtins,
    serenity_prelude::{
        ClientBuilder, ComponentInteraction, Context, FullEvent, GatewayIntents, GuildId,
        Interaction, UnavailableGuild,
    },
};
use songbird::SerenityInit;

use crate::config::Config;
use crate::error::{BotError, Result};
use crate::music::{self, Jukebox};
use crate::openai::OpenAiClient;
use crate::releases::spawn_release_watchers;
use crate::spotify::SpotifyClient;
use crate::youtube::YoutubeClient;
use crate::{ai, announce, help, lyrics, spotify, tickets, welcome};

/// State shared by every command and event.
pub struct Data {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    pub ai: Option<OpenAiClient>,
    pub spotify: Option<Arc<SpotifyClient>>,
    pub youtube: Option<YoutubeClient>,
    pub jukebox: Arc<Jukebox>,
}

type PoiseContext<'a> = poise::Context<'a, Data, BotError>;

fn commands() -> Vec<poise::Command<Data, BotError>> {
    let mut commands = vec![
        help::help(),
        announce::announce(),
        announce::post(),
        spotify::search(),
        lyrics::lyrics(),
        ai::ask(),
        tickets::setup_tickets(),
    ];
    commands.extend(music::music_commands());
    commands
}

/// Delete the message that invoked a prefix command, if allowed to.
pub async fn delete_invocation(ctx: PoiseContext<'_>) {
    if let poise::Context::Prefix(prefix) = ctx
        && let Err(e) = prefix.msg.delete(ctx.http()).await
    {
        debug!("Could not delete invoking message: {e}");
    }
}

fn is_user_error(error: &BotError) -> bool {
    matches!(
        error,
        BotError::NotInServer
            | BotError::NotInVoiceChannel
            | BotError::NothingPlaying
            | BotError::MissingPermission
            | BotError::NotATicketThread
            | BotError::InvalidSpotifyLink(_)
            | BotError::AiNotConfigured
            | BotError::SpotifyNotConfigured
    )
}

async fn on_error(error: FrameworkError<'_, Data, BotError>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            if is_user_error(&error) {
                warn!(
                    "Command `{}` by {} refused: {error}",
                    ctx.command().qualified_name,
                    ctx.author().tag()
                );
            } else {
                error!(
                    "Command `{}` by {} failed: {error}",
                    ctx.command().qualified_name,
                    ctx.author().tag()
                );
            }
            if let Err(e) = ctx.say(error.user_message()).await {
                error!("Failed to report error to user: {e}");
            }
        }
        FrameworkError::EventHandler { error, event, .. } => {
            error!("Event handler failed on {}: {error}", event.snake_case_name());
        }
        other => {
            if let Err(e) = builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

async fn route_component(
    ctx: &Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> Result<()> {
    let custom_id = interaction.data.custom_id.as_str();
    if custom_id.starts_with(music::CUSTOM_ID_PREFIX) {
        music::handle_control(ctx, interaction, data).await
    } else if custom_id.starts_with(tickets::CUSTOM_ID_PREFIX) {
        tickets::handle(ctx, interaction, data).await
    } else {
        Ok(())
    }
}

/// The guild the bot was removed from, ignoring outages.
fn departed_guild(incomplete: &UnavailableGuild) -> Option<GuildId> {
    (!incomplete.unavailable).then_some(incomplete.id)
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> Result<()> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.tag());
        }
        FullEvent::GuildMemberAddition { new_member } => {
            welcome::greet(ctx, new_member, &data.config).await?;
        }
        FullEvent::GuildDelete { incomplete, .. } => {
            if let Some(guild_id) = departed_guild(incomplete)
                && data.jukebox.remove(guild_id).await.is_some()
            {
                info!("Dropped player state for guild {guild_id}");
            }
        }
        FullEvent::InteractionCreate {
            interaction: Interaction::Component(component),
        } => {
            debug!(
                "Component {} pressed by {}",
                component.data.custom_id,
                component.user.tag()
            );
            route_component(ctx, component, data).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Run the Discord bot.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Arc::new(Config::from_env()?);

    let http_client = reqwest::Client::new();
    let ai = config
        .openai
        .as_ref()
        .map(|openai| OpenAiClient::new(openai, http_client.clone()));
    let spotify = config
        .spotify
        .as_ref()
        .map(|spotify| Arc::new(SpotifyClient::new(spotify, http_client.clone())));
    let youtube = config
        .youtube
        .as_ref()
        .map(|youtube| YoutubeClient::new(youtube, http_client.clone()));

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let discord_token = config.discord_token.clone();
    let prefix = config.command_prefix.clone();

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: commands(),
            prefix_options: PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord");
                debug!("Registering commands globally");
                builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully");

                spawn_release_watchers(ctx.http.clone(), &config, spotify.clone(), youtube.clone());

                Ok(Data {
                    config,
                    http_client,
                    ai,
                    spotify,
                    youtube,
                    jukebox: Arc::new(Jukebox::new()),
                })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(discord_token, intents)
        .framework(framework)
        .register_songbird()
        .await?;

    info!("Starting Discord client");
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
            shard_manager.shutdown_all().await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_registered_once() {
        let names: Vec<String> = commands().into_iter().map(|c| c.name).collect();
        for expected in [
            "help",
            "announce",
            "post",
            "search",
            "lyrics",
            "ask",
            "setup_tickets",
            "play",
            "queuelist",
            "reset",
            "controls",
        ] {
            assert_eq!(
                names.iter().filter(|name| name.as_str() == expected).count(),
                1,
                "{expected}"
            );
        }
    }

    #[test]
    fn only_removal_from_a_guild_drops_its_state() {
        let removed: UnavailableGuild =
            serde_json::from_value(serde_json::json!({ "id": "42", "unavailable": false }))
                .expect("guild");
        let outage: UnavailableGuild =
            serde_json::from_value(serde_json::json!({ "id": "42", "unavailable": true }))
                .expect("guild");
        assert_eq!(departed_guild(&removed), Some(GuildId::new(42)));
        assert_eq!(departed_guild(&outage), None);
    }

    #[test]
    fn refusals_are_not_logged_as_failures() {
        assert!(is_user_error(&BotError::MissingPermission));
        assert!(is_user_error(&BotError::NotInVoiceChannel));
        assert!(!is_user_error(&BotError::Config("x".to_string())));
    }
}
