//! Configuration management for the whoiswho game

pub mod file;

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::dialogue::RetryPolicy;
use crate::voice::LanguageModel;
use crate::{Error, Result};

/// Default dialogue service host
pub const DEFAULT_HOST: &str = "aiaas.pandorabots.com";

/// Default bot name within the application
pub const DEFAULT_BOT_NAME: &str = "whoiswho";

/// Default recognition/synthesis locale
pub const DEFAULT_LOCALE: &str = "es-ES";

/// Default greeting spoken at the start of a session
pub const DEFAULT_GREETING: &str = "Piensa en un personaje y hazme preguntas para adivinarlo.";

/// whoiswho configuration
#[derive(Debug)]
pub struct Config {
    /// Dialogue service identity and transport
    pub dialogue: DialogueConfig,

    /// Recognition and synthesis settings
    pub voice: VoiceConfig,
}

/// Dialogue session identity, fixed for the lifetime of a session
#[derive(Debug)]
pub struct DialogueConfig {
    /// Service host, optionally with a port
    pub host: String,

    /// Application id issued by the service
    pub app_id: String,

    /// User key issued by the service
    pub user_key: SecretString,

    /// Bot name within the application
    pub bot_name: String,

    /// Use HTTPS when talking to the host
    pub use_tls: bool,

    /// Bound on a single request, including connect
    pub timeout: Duration,

    /// Retry policy applied by the controller on connection failures
    pub retry: RetryPolicy,
}

impl DialogueConfig {
    /// Build a dialogue identity with default transport settings
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        app_id: impl Into<String>,
        user_key: impl Into<String>,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            app_id: app_id.into(),
            user_key: SecretString::from(user_key.into()),
            bot_name: bot_name.into(),
            use_tls: true,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Base URL of the talk endpoint for this bot
    #[must_use]
    pub fn talk_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!(
            "{scheme}://{}/talk/{}/{}",
            self.host, self.app_id, self.bot_name
        )
    }
}

/// Voice recognition and synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Locale for both recognition and synthesis
    pub locale: String,

    /// Number of recognition candidates requested (the best one is used)
    pub max_results: u32,

    /// Recognizer language model
    pub language_model: LanguageModel,

    /// "No match" errors arriving sooner than this after listening was
    /// armed are recognizer false starts
    pub false_start_threshold: Duration,

    /// Treat bot replies ending in '?' as prompts that expect an answer
    pub follow_up_questions: bool,

    /// Prompt spoken when a session starts, if any
    pub greeting: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            max_results: 1,
            language_model: LanguageModel::FreeForm,
            false_start_threshold: Duration::from_millis(500),
            follow_up_questions: false,
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(path)?;

        let retry_defaults = RetryPolicy::default();
        let dialogue = DialogueConfig {
            host: std::env::var("WHOISWHO_HOST")
                .ok()
                .or(fc.dialogue.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            app_id: std::env::var("WHOISWHO_APP_ID")
                .ok()
                .or(fc.dialogue.app_id)
                .unwrap_or_default(),
            user_key: SecretString::from(
                std::env::var("WHOISWHO_USER_KEY")
                    .ok()
                    .or(fc.dialogue.user_key)
                    .unwrap_or_default(),
            ),
            bot_name: std::env::var("WHOISWHO_BOT_NAME")
                .ok()
                .or(fc.dialogue.bot_name)
                .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            use_tls: fc.dialogue.use_tls.unwrap_or(true),
            timeout: fc
                .dialogue
                .timeout_secs
                .map_or(Duration::from_secs(10), Duration::from_secs),
            retry: RetryPolicy {
                max_retries: fc
                    .dialogue
                    .max_retries
                    .unwrap_or(retry_defaults.max_retries),
                ..retry_defaults
            },
        };

        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            locale: std::env::var("WHOISWHO_LOCALE")
                .ok()
                .or(fc.voice.locale)
                .unwrap_or(defaults.locale),
            max_results: fc.voice.max_results.unwrap_or(defaults.max_results),
            language_model: fc.voice.language_model.unwrap_or(defaults.language_model),
            false_start_threshold: fc
                .voice
                .false_start_ms
                .map_or(defaults.false_start_threshold, Duration::from_millis),
            follow_up_questions: fc
                .voice
                .follow_up_questions
                .unwrap_or(defaults.follow_up_questions),
            greeting: fc.voice.greeting.or(defaults.greeting),
        };

        Ok(Self { dialogue, voice })
    }

    /// Check that the dialogue identity is complete
    ///
    /// # Errors
    ///
    /// Returns error naming the first missing field
    pub fn validate(&self) -> Result<()> {
        let d = &self.dialogue;
        if d.host.trim().is_empty() {
            return Err(Error::Config("dialogue.host is required".to_string()));
        }
        if d.app_id.trim().is_empty() {
            return Err(Error::Config(
                "dialogue.app_id is required (WHOISWHO_APP_ID)".to_string(),
            ));
        }
        if d.user_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "dialogue.user_key is required (WHOISWHO_USER_KEY)".to_string(),
            ));
        }
        if d.bot_name.trim().is_empty() {
            return Err(Error::Config("dialogue.bot_name is required".to_string()));
        }
        if d.timeout < Duration::from_secs(1) {
            return Err(Error::Config(
                "dialogue.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.voice.max_results == 0 {
            return Err(Error::Config("voice.max_results must be at least 1".to_string()));
        }
        Ok(())
    }
}
