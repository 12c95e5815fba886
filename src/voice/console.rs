//! Terminal stand-in for the recognizer and synthesizer
//!
//! Typed lines play the part of recognized speech and spoken prompts are
//! printed. Events flow back through the same [`VoiceSink`] a platform
//! engine would use, so the controller cannot tell the difference.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use super::{ListenRequest, Utterance, VoiceEvent, VoiceIo};
use crate::controller::VoiceSink;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct ListenState {
    armed: bool,
    pending: Option<String>,
}

/// Console-backed [`VoiceIo`]
pub struct ConsoleVoice {
    sink: VoiceSink,
    state: Mutex<ListenState>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleVoice")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ConsoleVoice {
    /// Console voice printing prompts to stdout
    #[must_use]
    pub fn new(sink: VoiceSink) -> Self {
        Self::with_output(sink, Box::new(std::io::stdout()))
    }

    /// Console voice printing prompts to `out`
    #[must_use]
    pub fn with_output(sink: VoiceSink, out: Box<dyn Write + Send>) -> Self {
        Self {
            sink,
            state: Mutex::new(ListenState::default()),
            out: Mutex::new(out),
        }
    }

    /// Hand over a typed line as if it had been spoken
    ///
    /// Delivered straight away when listening is armed. Otherwise the line
    /// is held (replacing any earlier one) until the next
    /// [`begin_listening`](VoiceIo::begin_listening). Returns whether the
    /// line was delivered now.
    pub fn submit(&self, line: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.armed {
            state.armed = false;
            drop(state);
            self.deliver(line);
            true
        } else {
            state.pending = Some(line.to_string());
            false
        }
    }

    /// Whether listening is armed and waiting for a line
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .armed
    }

    fn deliver(&self, line: &str) {
        let line = line.trim();
        let (candidates, confidences) = if line.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (vec![line.to_string()], vec![1.0])
        };

        let delivered = self.sink.emit(VoiceEvent::EndOfSpeech).and_then(|()| {
            self.sink.emit(VoiceEvent::Results {
                candidates,
                confidences,
            })
        });
        if let Err(e) = delivered {
            tracing::warn!(error = %e, "dropping typed line");
        }
    }
}

impl VoiceIo for ConsoleVoice {
    fn begin_listening(&self, request: &ListenRequest) -> Result<()> {
        tracing::debug!(locale = %request.locale, "console listening");
        self.sink.emit(VoiceEvent::ReadyForSpeech)?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(line) = state.pending.take() {
            state.armed = false;
            drop(state);
            self.deliver(&line);
        } else {
            state.armed = true;
        }
        Ok(())
    }

    fn cancel_listening(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.armed = false;
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        self.sink.emit(VoiceEvent::SynthesisStart(utterance.id))?;

        {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            writeln!(out, "Bot: {}", utterance.text)
                .and_then(|()| out.flush())
                .map_err(|e| Error::Tts(e.to_string()))?;
        }

        self.sink.emit(VoiceEvent::SynthesisDone(utterance.id))
    }
}
