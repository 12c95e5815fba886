//! Pandorabots-style "talk" API client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{Dialogue, DialogueError};
use crate::config::DialogueConfig;
use crate::{Error, Result};

/// Response body of the talk endpoint
#[derive(Debug, Deserialize)]
struct TalkResponse {
    /// `"ok"` on success
    #[serde(default)]
    status: Option<String>,

    /// One entry per sentence the bot produced
    responses: Vec<String>,
}

/// Talks to a hosted bot over HTTP
pub struct PandoraClient {
    client: reqwest::Client,
    talk_url: String,
    user_key: SecretString,
}

impl std::fmt::Debug for PandoraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PandoraClient")
            .field("talk_url", &self.talk_url)
            .finish_non_exhaustive()
    }
}

impl PandoraClient {
    /// Create a client for the configured bot
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be built
    pub fn new(config: &DialogueConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::Config("dialogue host required".to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            talk_url: config.talk_url(),
            user_key: SecretString::from(config.user_key.expose_secret().to_owned()),
        })
    }

    /// Endpoint this client posts to
    #[must_use]
    pub fn talk_url(&self) -> &str {
        &self.talk_url
    }
}

#[async_trait]
impl Dialogue for PandoraClient {
    async fn query(&self, utterance: &str) -> std::result::Result<String, DialogueError> {
        if utterance.trim().is_empty() {
            return Err(DialogueError::NoMatch);
        }

        tracing::debug!(utterance, url = %self.talk_url, "querying dialogue service");

        let response = self
            .client
            .post(&self.talk_url)
            .query(&[
                ("input", utterance),
                ("user_key", self.user_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "dialogue service error");
            return Err(classify_status(status.as_u16(), &body));
        }

        let reply = parse_reply(&body)?;
        tracing::info!(reply = %reply, "dialogue reply");
        Ok(reply)
    }
}

/// Map a transport-level failure; the URL is dropped since it carries the user key
fn classify_transport(e: reqwest::Error) -> DialogueError {
    let e = e.without_url();
    if e.is_builder() {
        DialogueError::InvalidEndpoint(e.to_string())
    } else {
        DialogueError::ConnectionFailure(e.to_string())
    }
}

/// Map a non-success HTTP status
fn classify_status(status: u16, body: &str) -> DialogueError {
    match status {
        401 | 403 => DialogueError::InvalidCredentials,
        404 => DialogueError::InvalidEndpoint(format!("HTTP {status}: {body}")),
        _ => DialogueError::Unknown(format!("HTTP {status}: {body}")),
    }
}

/// Extract the reply text from a talk response body
fn parse_reply(body: &str) -> std::result::Result<String, DialogueError> {
    let parsed: TalkResponse =
        serde_json::from_str(body).map_err(|e| DialogueError::MalformedResponse(e.to_string()))?;

    if let Some(status) = parsed.status.as_deref()
        && !status.eq_ignore_ascii_case("ok")
    {
        return Err(DialogueError::Unknown(format!("service status {status}")));
    }

    let text = parsed
        .responses
        .iter()
        .map(|r| r.as_str().trim())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return Err(DialogueError::NoMatch);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_response() {
        let body = r#"{"status":"ok","responses":["¿Tu personaje es rubio?"],"sessionid":7}"#;
        assert_eq!(parse_reply(body).unwrap(), "¿Tu personaje es rubio?");
    }

    #[test]
    fn test_parse_joins_sentences() {
        let body = r#"{"status":"ok","responses":["Sí.", "  ", "Lleva gafas."]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Sí. Lleva gafas.");
    }

    #[test]
    fn test_parse_keeps_markup() {
        // Markup is stripped by the controller, not the client
        let body = r#"{"responses":["<p>Hola</p>"]}"#;
        assert_eq!(parse_reply(body).unwrap(), "<p>Hola</p>");
    }

    #[test]
    fn test_parse_empty_is_no_match() {
        assert_eq!(
            parse_reply(r#"{"status":"ok","responses":[]}"#),
            Err(DialogueError::NoMatch)
        );
        assert_eq!(
            parse_reply(r#"{"status":"ok","responses":[""]}"#),
            Err(DialogueError::NoMatch)
        );
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_reply("<html>502</html>"),
            Err(DialogueError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_reply(r#"{"status":"ok"}"#),
            Err(DialogueError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_error_status() {
        assert!(matches!(
            parse_reply(r#"{"status":"error","responses":[]}"#),
            Err(DialogueError::Unknown(_))
        ));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401, ""), DialogueError::InvalidCredentials);
        assert_eq!(classify_status(403, ""), DialogueError::InvalidCredentials);
        assert!(matches!(classify_status(404, ""), DialogueError::InvalidEndpoint(_)));
        assert!(matches!(classify_status(500, "boom"), DialogueError::Unknown(_)));
    }

    #[test]
    fn test_debug_hides_user_key() {
        let config = DialogueConfig::new("example.test", "app", "very-secret", "bot");
        let client = PandoraClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("very-secret"));
        assert_eq!(client.talk_url(), "https://example.test/talk/app/bot");
    }

    #[tokio::test]
    async fn test_empty_utterance_short_circuits() {
        let config = DialogueConfig::new("example.test", "app", "key", "bot");
        let client = PandoraClient::new(&config).unwrap();
        assert_eq!(client.query("   ").await, Err(DialogueError::NoMatch));
    }
}
