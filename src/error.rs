use thiserror::Error;

/// Failures at the HTTP layer, surfaced only after the retry budget for a
/// single call has been spent.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to construct HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response body")]
    Decode(#[source] reqwest::Error),

    #[error("request body cannot be cloned for retry")]
    UncloneableBody,
}

/// One variant per remote call site. None of these are recovered locally;
/// each one aborts the run.
#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("failed to register account")]
    Registration(#[source] TransportError),

    #[error("failed to start conversation")]
    ConversationInit(#[source] TransportError),

    #[error("failed to retrieve messages")]
    Poll(#[source] TransportError),

    #[error("failed to submit answer")]
    ReplySubmit(#[source] TransportError),
}
