//! Voice I/O facade
//!
//! The platform recognizer and synthesizer sit behind [`VoiceIo`]. Calls
//! return as soon as the engine has accepted the request; outcomes come
//! back later as [`VoiceEvent`]s posted through a
//! [`VoiceSink`](crate::controller::VoiceSink).

mod connectivity;
mod console;
mod recognition;

use std::sync::Arc;

use serde::Deserialize;

pub use connectivity::{AlwaysOnline, Connectivity, HostCheck};
pub use console::ConsoleVoice;
pub use recognition::RecognitionErrorCode;

use crate::Result;

/// Recognition language model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageModel {
    /// Free-form dictation
    FreeForm,
    /// Short web-search style queries
    WebSearch,
}

/// Parameters for arming the recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenRequest {
    /// Recognition locale (e.g. "es-ES")
    pub locale: String,

    /// Language model hint
    pub mode: LanguageModel,

    /// Maximum number of ranked candidates to return
    pub max_results: u32,
}

/// Why an utterance is spoken
///
/// Decides what happens once synthesis completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Poses a question; listening re-arms when speech completes
    QueryPrompt,
    /// Only informs; the controller goes idle when speech completes
    Informational,
}

/// Identifier of one synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// A synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Id echoed back in synthesis events
    pub id: UtteranceId,

    /// Text to speak
    pub text: String,

    /// Synthesis locale
    pub locale: String,

    /// What to do once spoken
    pub purpose: PromptPurpose,
}

/// Asynchronous callbacks from the recognizer and synthesizer
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// Recognizer is capturing audio
    ReadyForSpeech,

    /// Recognizer stopped capturing; results pending
    EndOfSpeech,

    /// Ranked recognition candidates, best first
    Results {
        /// Candidate transcriptions
        candidates: Vec<String>,
        /// Confidence per candidate, when the engine reports it
        confidences: Vec<f32>,
    },

    /// Recognition failed
    RecognitionError(RecognitionErrorCode),

    /// Synthesis of an utterance began
    SynthesisStart(UtteranceId),

    /// Synthesis of an utterance completed
    SynthesisDone(UtteranceId),

    /// Synthesis of an utterance failed
    SynthesisError(UtteranceId),
}

/// Speech recognition and synthesis capability
pub trait VoiceIo: Send + Sync {
    /// Arm the recognizer
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer cannot be started
    fn begin_listening(&self, request: &ListenRequest) -> Result<()>;

    /// Abandon an armed listening phase without reporting results
    fn cancel_listening(&self);

    /// Queue an utterance for synthesis
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer rejects the request
    fn speak(&self, utterance: &Utterance) -> Result<()>;
}

impl<T: VoiceIo + ?Sized> VoiceIo for Arc<T> {
    fn begin_listening(&self, request: &ListenRequest) -> Result<()> {
        (**self).begin_listening(request)
    }

    fn cancel_listening(&self) {
        (**self).cancel_listening();
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        (**self).speak(utterance)
    }
}
