//! Conversation controller
//!
//! A single task owns the conversation state and the transcript. Player
//! actions, voice engine callbacks and finished dialogue queries all arrive
//! as [`Input`]s on one inbox, so transitions never race. The dialogue
//! query runs on its own task and reports back with
//! [`Input::QueryCompleted`].

mod inbox;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

pub use inbox::{ControllerEvent, ControllerHandle, Input, TurnOutcome, VoiceSink};
pub use state::ConversationState;

use crate::config::{Config, VoiceConfig};
use crate::dialogue::{Dialogue, DialogueError, RetryPolicy, query_with_retry};
use crate::text;
use crate::transcript::{Speaker, Transcript};
use crate::voice::{
    Connectivity, ListenRequest, PromptPurpose, RecognitionErrorCode, Utterance,
    UtteranceId, VoiceEvent, VoiceIo,
};

/// Controller tuning, fixed for the session
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Recognition and synthesis settings
    pub voice: VoiceConfig,

    /// Retry policy for dialogue queries
    pub retry: RetryPolicy,

    /// Bound on each dialogue query attempt
    pub query_timeout: Duration,
}

impl ControllerSettings {
    /// Settings taken from a loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            voice: config.voice.clone(),
            retry: config.dialogue.retry.clone(),
            query_timeout: config.dialogue.timeout,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            voice: VoiceConfig::default(),
            retry: RetryPolicy::default(),
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// Utterance currently being spoken
#[derive(Debug)]
struct Speech {
    id: UtteranceId,
    purpose: PromptPurpose,
    text: String,
}

/// Drives one conversation session
pub struct Controller {
    settings: ControllerSettings,
    voice: Box<dyn VoiceIo>,
    dialogue: Arc<dyn Dialogue>,
    connectivity: Box<dyn Connectivity>,
    handle: ControllerHandle,
    state: ConversationState,
    transcript: Transcript,
    listening_since: Option<Instant>,
    turn: u64,
    next_utterance: u64,
    speech: Option<Speech>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("turn", &self.turn)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Create a controller publishing through `handle`
    ///
    /// The inbox receiver paired with `handle` must be passed to
    /// [`Controller::run`].
    #[must_use]
    pub fn new(
        settings: ControllerSettings,
        voice: Box<dyn VoiceIo>,
        dialogue: Arc<dyn Dialogue>,
        connectivity: Box<dyn Connectivity>,
        handle: &ControllerHandle,
    ) -> Self {
        Self {
            settings,
            voice,
            dialogue,
            connectivity,
            handle: handle.clone(),
            state: ConversationState::Idle,
            transcript: Transcript::new(),
            listening_since: None,
            turn: 0,
            next_utterance: 0,
            speech: None,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.state
    }

    /// Transcript so far
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Process inputs until [`Input::Shutdown`], returning the transcript
    pub async fn run(mut self, mut inbox: UnboundedReceiver<Input>) -> Transcript {
        tracing::info!("conversation controller started");

        while let Some(input) = inbox.recv().await {
            if !self.handle(input).await {
                break;
            }
        }

        tracing::info!(entries = self.transcript.len(), "conversation controller stopped");
        self.transcript
    }

    /// Apply one input; returns `false` once the controller should stop
    pub async fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::StartTurn => self.start_turn().await,
            Input::Announce { text, purpose } => {
                if self.state == ConversationState::Idle {
                    self.say(text, purpose);
                } else {
                    tracing::debug!(state = %self.state, "announcement ignored");
                }
            }
            Input::Voice(event) => self.on_voice(event).await,
            Input::QueryCompleted { turn, outcome } => self.on_query_completed(turn, outcome),
            Input::Transcript(reply) => {
                let _ = reply.send(self.transcript.lines());
            }
            Input::Shutdown => {
                if self.state.is_recognizing() {
                    self.voice.cancel_listening();
                }
                return false;
            }
        }
        true
    }

    async fn start_turn(&mut self) {
        if !self.state.accepts_turn() {
            tracing::debug!(state = %self.state, "turn request ignored");
            return;
        }

        if !self.connectivity.is_online().await {
            tracing::warn!("network unavailable, not listening");
            self.handle.publish(ControllerEvent::Offline);
            return;
        }

        let request = ListenRequest {
            locale: self.settings.voice.locale.clone(),
            mode: self.settings.voice.language_model,
            max_results: self.settings.voice.max_results,
        };

        // Set before arming: the engine may report back before the call returns
        self.listening_since = Some(Instant::now());
        self.set_state(ConversationState::Listening);
        self.handle.publish(ControllerEvent::ListeningStarted);

        if let Err(e) = self.voice.begin_listening(&request) {
            tracing::error!(error = %e, "failed to start listening");
            self.listening_since = None;
            self.handle.publish(ControllerEvent::ListeningStopped);
            self.set_state(ConversationState::Idle);
        }
    }

    async fn on_voice(&mut self, event: VoiceEvent) {
        match event {
            VoiceEvent::ReadyForSpeech => tracing::debug!("recognizer ready"),
            VoiceEvent::EndOfSpeech => {
                if self.state == ConversationState::Listening {
                    self.set_state(ConversationState::Recognizing);
                }
            }
            VoiceEvent::Results {
                candidates,
                confidences,
            } => self.on_results(candidates, &confidences),
            VoiceEvent::RecognitionError(code) => self.on_recognition_error(code),
            VoiceEvent::SynthesisStart(id) => tracing::debug!(utterance = %id, "speaking"),
            VoiceEvent::SynthesisDone(id) => {
                let Some(speech) = self.take_speech(id) else {
                    return;
                };
                self.set_state(ConversationState::Idle);
                if speech.purpose == PromptPurpose::QueryPrompt {
                    self.start_turn().await;
                }
            }
            VoiceEvent::SynthesisError(id) => {
                let Some(speech) = self.take_speech(id) else {
                    return;
                };
                tracing::warn!(utterance = %id, "speech synthesis failed");
                self.speech_unavailable(speech.text);
            }
        }
    }

    fn on_results(&mut self, candidates: Vec<String>, confidences: &[f32]) {
        if !self.state.is_recognizing() {
            tracing::debug!(state = %self.state, "stale recognition results ignored");
            return;
        }
        self.listening_since = None;
        self.handle.publish(ControllerEvent::ListeningStopped);

        // Candidates are ranked best first; blank ones are engine noise
        let Some((rank, best)) = candidates
            .into_iter()
            .enumerate()
            .find(|(_, c)| !c.trim().is_empty())
        else {
            tracing::info!("no recognition candidates");
            self.set_state(ConversationState::Idle);
            return;
        };

        let heard = text::capitalize_first(best.trim());
        let upstream = text::normalize(&heard);
        tracing::info!(
            heard = %heard,
            rank,
            confidence = confidences.get(rank).copied().unwrap_or_default(),
            "recognized"
        );

        self.handle.publish(ControllerEvent::Heard(heard.clone()));
        self.transcript.append(Speaker::User, heard);
        self.spawn_query(upstream);
        self.set_state(ConversationState::Querying);
    }

    fn on_recognition_error(&mut self, code: RecognitionErrorCode) {
        if !self.state.is_recognizing() {
            tracing::debug!(%code, state = %self.state, "stale recognition error ignored");
            return;
        }
        let since = self.listening_since.take();
        self.handle.publish(ControllerEvent::ListeningStopped);

        if code == RecognitionErrorCode::NoMatch
            && since.is_some_and(|t| t.elapsed() < self.settings.voice.false_start_threshold)
        {
            tracing::info!("recognizer false start ignored");
            self.voice.cancel_listening();
            self.set_state(ConversationState::Idle);
            return;
        }

        match code.message() {
            Some(message) => {
                tracing::warn!(%code, "recognition failed");
                self.handle.publish(ControllerEvent::RecognitionFailed {
                    code,
                    message: message.to_string(),
                });
                self.say(message.to_string(), PromptPurpose::Informational);
            }
            None => {
                tracing::warn!(code = code.code(), "unlisted recognizer error");
                self.set_state(ConversationState::Idle);
            }
        }
    }

    fn spawn_query(&mut self, utterance: String) {
        self.turn += 1;
        let turn = self.turn;
        let dialogue = Arc::clone(&self.dialogue);
        let retry = self.settings.retry.clone();
        let timeout = self.settings.query_timeout;
        let handle = self.handle.clone();

        tracing::debug!(turn, utterance = %utterance, "querying");

        tokio::spawn(async move {
            let outcome = query_with_retry(dialogue.as_ref(), &utterance, &retry, timeout).await;
            if handle.send(Input::QueryCompleted { turn, outcome }).is_err() {
                tracing::debug!(turn, "controller gone, reply dropped");
            }
        });
    }

    fn on_query_completed(&mut self, turn: u64, outcome: TurnOutcome) {
        if self.state != ConversationState::Querying || turn != self.turn {
            tracing::debug!(turn, current = self.turn, "stale query completion ignored");
            return;
        }

        match outcome {
            Ok(reply) => {
                let reply = text::strip_markup(&reply).trim().to_string();
                if reply.is_empty() {
                    tracing::info!(turn, "reply empty after removing markup");
                    self.say(
                        DialogueError::NoMatch.user_message().to_string(),
                        PromptPurpose::Informational,
                    );
                    return;
                }

                let purpose = if self.settings.voice.follow_up_questions && reply.ends_with('?') {
                    PromptPurpose::QueryPrompt
                } else {
                    PromptPurpose::Informational
                };
                self.say(reply, purpose);
            }
            Err(e) => {
                tracing::error!(turn, error = %e, "dialogue query failed");
                self.say(e.user_message().to_string(), PromptPurpose::Informational);
            }
        }
    }

    /// Transcribe a bot line and hand it to the synthesizer
    fn say(&mut self, line: String, purpose: PromptPurpose) {
        self.next_utterance += 1;
        let id = UtteranceId(self.next_utterance);

        self.transcript.append(Speaker::Bot, line.clone());
        self.handle.publish(ControllerEvent::BotSaid(line.clone()));

        let utterance = Utterance {
            id,
            text: line,
            locale: self.settings.voice.locale.clone(),
            purpose,
        };

        self.set_state(ConversationState::Speaking);
        self.speech = Some(Speech {
            id,
            purpose,
            text: utterance.text.clone(),
        });

        if let Err(e) = self.voice.speak(&utterance) {
            tracing::error!(utterance = %id, error = %e, "failed to speak");
            self.speech = None;
            self.speech_unavailable(utterance.text);
        }
    }

    fn take_speech(&mut self, id: UtteranceId) -> Option<Speech> {
        match self.speech.take() {
            Some(speech) if speech.id == id && self.state == ConversationState::Speaking => {
                Some(speech)
            }
            other => {
                tracing::debug!(utterance = %id, "stale synthesis event ignored");
                self.speech = other;
                None
            }
        }
    }

    fn speech_unavailable(&mut self, line: String) {
        self.handle.publish(ControllerEvent::SpeechUnavailable(line));
        self.set_state(ConversationState::Error);
        self.set_state(ConversationState::Idle);
    }

    fn set_state(&mut self, to: ConversationState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(%from, %to, "state changed");
        self.handle
            .publish(ControllerEvent::StateChanged { from, to });
    }
}
