//! TOML configuration file loading
//!
//! Supports `~/.config/whoiswho/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::voice::LanguageModel;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct WhoIsWhoConfigFile {
    /// Dialogue service identity and transport
    #[serde(default)]
    pub dialogue: DialogueFileConfig,

    /// Recognition and synthesis settings
    #[serde(default)]
    pub voice: VoiceFileConfig,
}

/// Dialogue service configuration
#[derive(Debug, Default, Deserialize)]
pub struct DialogueFileConfig {
    /// Service host (e.g. "aiaas.pandorabots.com")
    pub host: Option<String>,

    /// Application id issued by the service
    pub app_id: Option<String>,

    /// User key issued by the service
    pub user_key: Option<String>,

    /// Bot name within the application
    pub bot_name: Option<String>,

    /// Use HTTPS (default true)
    pub use_tls: Option<bool>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Retries after a connection failure
    pub max_retries: Option<u32>,
}

/// Voice configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Recognition and synthesis locale (e.g. "es-ES")
    pub locale: Option<String>,

    /// Number of recognition candidates requested
    pub max_results: Option<u32>,

    /// Recognizer language model ("free_form" or "web_search")
    pub language_model: Option<LanguageModel>,

    /// "No match" errors faster than this are treated as false starts
    pub false_start_ms: Option<u64>,

    /// Re-arm listening after bot replies that end in a question
    pub follow_up_questions: Option<bool>,

    /// Prompt spoken when a session starts
    pub greeting: Option<String>,
}

/// Load the TOML config file
///
/// With an explicit `path` the file must exist and parse. Without one the
/// standard path is tried and `WhoIsWhoConfigFile::default()` is returned if
/// it is missing or unreadable.
///
/// # Errors
///
/// Returns error if an explicitly requested file cannot be read or parsed
pub fn load_config_file(path: Option<&Path>) -> Result<WhoIsWhoConfigFile> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(WhoIsWhoConfigFile::default());
    };

    if !path.exists() {
        return Ok(WhoIsWhoConfigFile::default());
    }

    let config = match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                WhoIsWhoConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            WhoIsWhoConfigFile::default()
        }
    };

    Ok(config)
}

/// Return the config file path: `~/.config/whoiswho/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "npi", "whoiswho")
        .map(|d| d.config_dir().join("config.toml"))
}
