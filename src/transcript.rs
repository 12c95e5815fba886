//! Running transcript of a game session
//!
//! The transcript is owned by the conversation controller. It only grows:
//! there is no API to edit or remove an entry once appended.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The player, as heard by the recognizer
    User,
    /// The dialogue service, or the controller speaking on its behalf
    Bot,
}

impl Speaker {
    /// Label shown in the history view
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Tú",
            Self::Bot => "Bot",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One labeled utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// Who said it
    pub speaker: Speaker,

    /// What was said
    pub text: String,

    /// When it was appended
    pub at: DateTime<Utc>,
}

impl std::fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Append-only, chronologically ordered log of utterances
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an utterance at the end
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        let entry = TranscriptEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        };
        tracing::trace!(speaker = %entry.speaker, text = %entry.text, "transcript append");
        self.entries.push(entry);
    }

    /// All entries in turn order
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Export as `"<label>: <text>"` lines for the history view
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Number of entries
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
