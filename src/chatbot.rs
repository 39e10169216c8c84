use rand::Rng;
use tracing::{debug, error, info};

use crate::error::ChatbotError;
use crate::reply::generate_reply;
use crate::services::challenge::ChallengeApi;

/// Drives one conversation from registration to the success phrase. The only
/// state carried between turns is the user and conversation identifiers.
pub struct Chatbot<R> {
    api: ChallengeApi,
    success_message: String,
    rng: R,
}

impl<R: Rng> Chatbot<R> {
    pub fn new(api: ChallengeApi, success_message: String, rng: R) -> Self {
        Chatbot {
            api,
            success_message,
            rng,
        }
    }

    pub async fn run(&mut self, name: &str, email: &str) -> Result<(), ChatbotError> {
        let user_id = self.create_account(name, email).await?;
        let conversation_id = self.init_conversation(&user_id).await?;
        self.converse(&conversation_id).await
    }

    async fn create_account(&self, name: &str, email: &str) -> Result<String, ChatbotError> {
        let user_id = self.api.register(name, email).await.map_err(|err| {
            error!("error creating account: {err}");
            ChatbotError::Registration(err)
        })?;
        info!("account created, user id: {user_id}");
        Ok(user_id)
    }

    async fn init_conversation(&self, user_id: &str) -> Result<String, ChatbotError> {
        let conversation_id = self.api.create_conversation(user_id).await.map_err(|err| {
            error!("error initializing conversation: {err}");
            ChatbotError::ConversationInit(err)
        })?;
        info!("conversation initialized, conversation id: {conversation_id}");
        Ok(conversation_id)
    }

    /// Polls for the latest prompt and answers it until a prompt containing
    /// the success phrase arrives.
    async fn converse(&mut self, conversation_id: &str) -> Result<(), ChatbotError> {
        loop {
            let messages = self.api.get_messages(conversation_id).await.map_err(|err| {
                error!("error retrieving new messages: {err}");
                ChatbotError::Poll(err)
            })?;

            let prompt = match messages.last() {
                Some(message) => message.text.clone(),
                None => String::new(),
            };
            if prompt.is_empty() {
                debug!("no new messages yet");
                continue;
            }
            info!("chatbot: {prompt}");

            if prompt.contains(&self.success_message) {
                info!("success phrase received, conversation solved");
                return Ok(());
            }
            self.reply_to_chatbot(conversation_id, &prompt).await?;
        }
    }

    /// Guesses answers for one prompt until the service accepts one. The
    /// prompt never changes within this loop; only the generated content
    /// does. There is deliberately no attempt cap, matching the service's
    /// expectation that a correct answer is always reachable.
    async fn reply_to_chatbot(
        &mut self,
        conversation_id: &str,
        prompt: &str,
    ) -> Result<(), ChatbotError> {
        loop {
            let reply = generate_reply(prompt, &mut self.rng);
            debug!("submitting answer: {reply:?}");
            let correct = self
                .api
                .post_answer(conversation_id, &reply)
                .await
                .map_err(|err| {
                    error!("error replying to the chatbot: {err}");
                    ChatbotError::ReplySubmit(err)
                })?;
            if correct {
                info!("answer accepted, retrieving the next message");
                return Ok(());
            }
            debug!("answer rejected, generating a new one");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use mockito::{Matcher, Server, ServerGuard};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    use super::*;

    const SUCCESS_BODY: &[u8] = br#"{"messages":[{"text":"Thank you for playing"}]}"#;

    async fn server_with_registration() -> ServerGuard {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/challenge-register")
            .with_status(200)
            .with_body(r#"{"user_id":"u-1"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/challenge-conversation")
            .match_body(Matcher::Json(json!({"user_id": "u-1"})))
            .with_status(200)
            .with_body(r#"{"conversation_id":"c-1"}"#)
            .create_async()
            .await;
        server
    }

    fn chatbot(server: &ServerGuard) -> Chatbot<StdRng> {
        let api = ChallengeApi::new(server.url()).unwrap();
        Chatbot::new(api, "Thank you".to_string(), StdRng::seed_from_u64(1))
    }

    #[tokio::test]
    async fn success_phrase_ends_the_run_without_answering() {
        let mut server = server_with_registration().await;
        let poll = server
            .mock("GET", "/challenge-behaviour/c-1")
            .with_status(200)
            .with_body(SUCCESS_BODY)
            .expect(1)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/challenge-behaviour/c-1")
            .expect(0)
            .create_async()
            .await;

        chatbot(&server)
            .run("Ada", "ada@example.com")
            .await
            .unwrap();

        poll.assert_async().await;
        answer.assert_async().await;
    }

    #[tokio::test]
    async fn correct_answer_triggers_another_poll() {
        let mut server = server_with_registration().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let poll = server
            .mock("GET", "/challenge-behaviour/c-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"messages":[{"text":"Is the sky blue?"}]}"#.to_vec()
                } else {
                    SUCCESS_BODY.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/challenge-behaviour/c-1")
            .match_body(Matcher::Json(json!({"content": "yes"})))
            .with_status(200)
            .with_body(r#"{"correct":true}"#)
            .expect(1)
            .create_async()
            .await;

        chatbot(&server)
            .run("Ada", "ada@example.com")
            .await
            .unwrap();

        poll.assert_async().await;
        answer.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_answer_is_retried_without_repolling() {
        let mut server = server_with_registration().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let poll_counter = polls.clone();
        let poll = server
            .mock("GET", "/challenge-behaviour/c-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if poll_counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"messages":[{"text":"Guess the magic word"}]}"#.to_vec()
                } else {
                    SUCCESS_BODY.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;
        let answers = Arc::new(AtomicUsize::new(0));
        let answer_counter = answers.clone();
        let answer = server
            .mock("POST", "/challenge-behaviour/c-1")
            // Every guess for this prompt is a single 5-char alphanumeric string.
            .match_body(Matcher::Regex(r#""content":"[A-Za-z0-9]{5}""#.to_string()))
            .with_status(200)
            .with_body_from_request(move |_| {
                if answer_counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"correct":false}"#.to_vec()
                } else {
                    br#"{"correct":true}"#.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;

        chatbot(&server)
            .run("Ada", "ada@example.com")
            .await
            .unwrap();

        poll.assert_async().await;
        answer.assert_async().await;
    }

    #[tokio::test]
    async fn numeric_prompt_submits_a_small_decimal() {
        let mut server = server_with_registration().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let _poll = server
            .mock("GET", "/challenge-behaviour/c-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"messages":[{"text":"What is the sum of 2 and 3?"}]}"#.to_vec()
                } else {
                    SUCCESS_BODY.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/challenge-behaviour/c-1")
            .match_body(Matcher::Regex(r#""content":"\d{1,2}""#.to_string()))
            .with_status(200)
            .with_body(r#"{"correct":true}"#)
            .expect(1)
            .create_async()
            .await;

        chatbot(&server)
            .run("Ada", "ada@example.com")
            .await
            .unwrap();

        answer.assert_async().await;
    }

    #[tokio::test]
    async fn empty_message_list_polls_again_without_answering() {
        let mut server = server_with_registration().await;
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let poll = server
            .mock("GET", "/challenge-behaviour/c-1")
            .with_status(200)
            .with_body_from_request(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"messages":[]}"#.to_vec()
                } else {
                    SUCCESS_BODY.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;
        let answer = server
            .mock("POST", "/challenge-behaviour/c-1")
            .expect(0)
            .create_async()
            .await;

        chatbot(&server)
            .run("Ada", "ada@example.com")
            .await
            .unwrap();

        poll.assert_async().await;
        answer.assert_async().await;
    }
}
