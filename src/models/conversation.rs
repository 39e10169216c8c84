use serde::{Deserialize, Serialize};

/// A single message in the sequence returned by the poll endpoint. Only the
/// most recent one is ever consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub text: String,
}

/// An answer to a prompt. Serializes untagged so list answers go out as a
/// JSON array and everything else as a plain string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Text(String),
    Items(Vec<String>),
}
