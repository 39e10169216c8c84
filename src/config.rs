use std::env;

const DEFAULT_NAME: &str = "Challenge Bot";
const DEFAULT_EMAIL: &str = "challenge-bot@example.com";
const DEFAULT_BASE_URL: &str = "https://code-challenge.us1.sandbox-rivaltech.io";
const DEFAULT_SUCCESS_MESSAGE: &str = "Thank you";

/// Runtime configuration, read from the environment once at startup and
/// passed around by value afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub email: String,
    pub base_url: String,
    pub success_message: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            name: env::var("NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string()),
            email: env::var("EMAIL").unwrap_or_else(|_| DEFAULT_EMAIL.to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            success_message: env::var("SUCCESS_MESSAGE")
                .unwrap_or_else(|_| DEFAULT_SUCCESS_MESSAGE.to_string()),
        }
    }
}
