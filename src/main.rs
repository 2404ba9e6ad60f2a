use std::sync::Arc;

use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rusty_jukebox::commands::music::utils::music_manager::MusicManager;
use rusty_jukebox::commands::music::utils::songbird_backend::SongbirdBackend;
use rusty_jukebox::{Config, Data, Error, commands, events};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rusty_jukebox=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework_config = config.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: events::on_error,
            pre_command: events::pre_command,
            post_command: events::post_command,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let config = framework_config;
                info!("Logged in as {}", ready.user.name);
                ctx.set_activity(Some(events::presence()));

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                if let Some(guild_id) = config.dev_guild {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in development guild {}", guild_id);
                }

                let songbird = songbird::get(ctx)
                    .await
                    .ok_or("Songbird voice client was not registered")?;

                let (event_tx, event_rx) = mpsc::unbounded_channel();
                let backend = SongbirdBackend::new(songbird, ctx.cache.clone(), &config, event_tx);
                let music = Arc::new(MusicManager::new(Arc::new(backend)));
                music.clone().listen(event_rx);

                Ok(Data { music, config })
            })
        })
        .build();

    let mut client = ClientBuilder::new(config.token.clone(), intents)
        .framework(framework)
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
