use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TransportError;
use crate::models::{ChatMessage, Reply};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BACKOFF_BASE: Duration = Duration::from_millis(100);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    user_id: String,
}

#[derive(Serialize)]
struct ConversationRequest<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct ConversationResponse {
    conversation_id: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct AnswerRequest<'a> {
    content: &'a Reply,
}

#[derive(Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    correct: bool,
}

/// Client for the four challenge endpoints. Every call retries transient
/// failures with exponential backoff before giving up.
pub struct ChallengeApi {
    client: Client,
    base_url: String,
}

impl ChallengeApi {
    pub fn new(base_url: String) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TransportError::Client)?;
        Ok(ChallengeApi { client, base_url })
    }

    pub async fn register(&self, name: &str, email: &str) -> Result<String, TransportError> {
        let url = format!("{}/challenge-register", self.base_url);
        let request = self.client.post(&url).json(&RegisterRequest { name, email });
        let response: RegisterResponse = self
            .send_with_retry(request)
            .await?
            .json()
            .await
            .map_err(TransportError::Decode)?;
        Ok(response.user_id)
    }

    pub async fn create_conversation(&self, user_id: &str) -> Result<String, TransportError> {
        let url = format!("{}/challenge-conversation", self.base_url);
        let request = self
            .client
            .post(&url)
            .json(&ConversationRequest { user_id });
        let response: ConversationResponse = self
            .send_with_retry(request)
            .await?
            .json()
            .await
            .map_err(TransportError::Decode)?;
        Ok(response.conversation_id)
    }

    pub async fn get_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, TransportError> {
        let url = format!("{}/challenge-behaviour/{}", self.base_url, conversation_id);
        let request = self.client.get(&url);
        let response: MessagesResponse = self
            .send_with_retry(request)
            .await?
            .json()
            .await
            .map_err(TransportError::Decode)?;
        Ok(response.messages)
    }

    pub async fn post_answer(
        &self,
        conversation_id: &str,
        reply: &Reply,
    ) -> Result<bool, TransportError> {
        let url = format!("{}/challenge-behaviour/{}", self.base_url, conversation_id);
        let request = self
            .client
            .post(&url)
            .json(&AnswerRequest { content: reply });
        let response: AnswerResponse = self
            .send_with_retry(request)
            .await?
            .json()
            .await
            .map_err(TransportError::Decode)?;
        Ok(response.correct)
    }

    /// Sends the request, retrying network errors and non-2xx statuses up to
    /// MAX_RETRIES times after the initial attempt.
    async fn send_with_retry(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = builder
                .try_clone()
                .ok_or(TransportError::UncloneableBody)?;
            let result = match request.send().await {
                Ok(response) => response.error_for_status(),
                Err(err) => Err(err),
            };
            match result {
                Ok(response) => return Ok(response),
                Err(source) if attempt <= MAX_RETRIES => {
                    let delay = backoff(attempt);
                    warn!(
                        "request failed (attempt {attempt}/{}): {source}; retrying in {delay:?}",
                        MAX_RETRIES + 1
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(TransportError::RetriesExhausted {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    let delay = BACKOFF_BASE * 2u32.pow(attempt);
    delay.min(BACKOFF_CAP)
}
