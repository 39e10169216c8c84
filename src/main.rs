mod chatbot;
mod config;
mod error;
mod models;
mod reply;
mod services;

use tracing::info;

use chatbot::Chatbot;
use config::Config;
use services::challenge::ChallengeApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("challenge_chatbot=info")),
        )
        .init();

    let config = Config::from_env();
    info!("starting challenge run against {}", config.base_url);

    let api = ChallengeApi::new(config.base_url.clone())?;
    let mut chatbot = Chatbot::new(api, config.success_message.clone(), rand::rng());
    chatbot.run(&config.name, &config.email).await?;

    info!("challenge completed");
    Ok(())
}
