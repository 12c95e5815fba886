//! Remote dialogue service
//!
//! A single request per turn: the normalized utterance goes up, free text
//! or a classified [`DialogueError`] comes back. Retrying is the caller's
//! business, see [`query_with_retry`].

mod client;
mod error;
mod retry;

use async_trait::async_trait;

pub use client::PandoraClient;
pub use error::DialogueError;
pub use retry::{RetryPolicy, delay_for_attempt, is_retryable, query_with_retry};

/// A conversational agent that answers one utterance at a time
#[async_trait]
pub trait Dialogue: Send + Sync {
    /// Send an accent-normalized, non-empty utterance and return the raw reply
    async fn query(&self, utterance: &str) -> Result<String, DialogueError>;
}
