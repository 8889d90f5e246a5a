#[tokio::main]
async fn main() -> stagehand::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("stagehand=info,serenity=warn,songbird=warn"),
    )
    .init();
    log::info!("Starting stagehand Discord bot");

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::warn!("A rustls crypto provider was already installed");
    }

    match stagehand::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {}", e);
            Err(e)
        }
    }
}
