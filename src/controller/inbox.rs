//! Messages in and out of the controller, and the handle that sends them

use tokio::sync::{broadcast, mpsc, oneshot};

use super::ConversationState;
use crate::dialogue::DialogueError;
use crate::voice::{PromptPurpose, RecognitionErrorCode, VoiceEvent};
use crate::{Error, Result};

/// Capacity of the outbound event channel
const EVENT_CAPACITY: usize = 64;

/// Outcome of one dialogue query
pub type TurnOutcome = std::result::Result<String, DialogueError>;

/// Everything that can drive the controller
#[derive(Debug)]
pub enum Input {
    /// Player asked to start a turn
    StartTurn,

    /// Speak a bot line outside of a turn
    Announce {
        /// Line to speak
        text: String,
        /// What to do once spoken
        purpose: PromptPurpose,
    },

    /// Callback from the voice engine
    Voice(VoiceEvent),

    /// A spawned dialogue query finished
    QueryCompleted {
        /// Turn the query belongs to
        turn: u64,
        /// Reply or failure
        outcome: TurnOutcome,
    },

    /// Export the transcript as display lines
    Transcript(oneshot::Sender<Vec<String>>),

    /// Stop the controller loop
    Shutdown,
}

/// Notifications published by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// State transition
    StateChanged {
        /// Previous state
        from: ConversationState,
        /// New state
        to: ConversationState,
    },

    /// Recognizer armed; the listen affordance should show "listening"
    ListeningStarted,

    /// Recognizer finished; the listen affordance returns to rest
    ListeningStopped,

    /// Best recognition candidate, as transcribed
    Heard(String),

    /// Recognition failed with a message for the player
    RecognitionFailed {
        /// Engine error
        code: RecognitionErrorCode,
        /// Player-facing message
        message: String,
    },

    /// Bot line about to be spoken
    BotSaid(String),

    /// Turn refused because the network is down
    Offline,

    /// Speech output failed; the line is only shown as text
    SpeechUnavailable(String),
}

/// Posts voice engine callbacks into the controller inbox
#[derive(Debug, Clone)]
pub struct VoiceSink {
    tx: mpsc::UnboundedSender<Input>,
}

impl VoiceSink {
    /// Post one voice event
    ///
    /// # Errors
    ///
    /// Returns error if the controller has stopped
    pub fn emit(&self, event: VoiceEvent) -> Result<()> {
        self.tx
            .send(Input::Voice(event))
            .map_err(|_| Error::Channel("controller inbox closed".to_string()))
    }
}

/// Cloneable client side of a running controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Input>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ControllerHandle {
    /// Create a handle and the inbox receiver for the controller loop
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Input>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        (Self { tx, events }, rx)
    }

    /// Ask for a new turn
    ///
    /// # Errors
    ///
    /// Returns error if the controller has stopped
    pub fn start_turn(&self) -> Result<()> {
        self.send(Input::StartTurn)
    }

    /// Speak a bot line while idle
    ///
    /// # Errors
    ///
    /// Returns error if the controller has stopped
    pub fn announce(&self, text: impl Into<String>, purpose: PromptPurpose) -> Result<()> {
        self.send(Input::Announce {
            text: text.into(),
            purpose,
        })
    }

    /// Sink for the voice engine's callbacks
    #[must_use]
    pub fn voice_sink(&self) -> VoiceSink {
        VoiceSink {
            tx: self.tx.clone(),
        }
    }

    /// Current transcript as `"<speaker>: <text>"` lines
    ///
    /// # Errors
    ///
    /// Returns error if the controller has stopped
    pub async fn transcript(&self) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Transcript(reply))?;
        rx.await
            .map_err(|_| Error::Channel("controller dropped transcript request".to_string()))
    }

    /// Subscribe to controller notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Stop the controller loop
    ///
    /// # Errors
    ///
    /// Returns error if the controller has already stopped
    pub fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown)
    }

    pub(super) fn send(&self, input: Input) -> Result<()> {
        self.tx
            .send(input)
            .map_err(|_| Error::Channel("controller inbox closed".to_string()))
    }

    pub(super) fn publish(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inputs_arrive_in_order() {
        let (handle, mut rx) = ControllerHandle::channel();

        handle.start_turn().unwrap();
        handle.voice_sink().emit(VoiceEvent::EndOfSpeech).unwrap();
        handle
            .announce("Hola", PromptPurpose::Informational)
            .unwrap();

        assert!(matches!(rx.recv().await, Some(Input::StartTurn)));
        assert!(matches!(
            rx.recv().await,
            Some(Input::Voice(VoiceEvent::EndOfSpeech))
        ));
        assert!(matches!(rx.recv().await, Some(Input::Announce { .. })));
    }

    #[tokio::test]
    async fn test_closed_inbox() {
        let (handle, rx) = ControllerHandle::channel();
        drop(rx);

        assert!(handle.start_turn().is_err());
        assert!(handle.voice_sink().emit(VoiceEvent::EndOfSpeech).is_err());
        assert!(handle.transcript().await.is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let (handle, _rx) = ControllerHandle::channel();
        handle.publish(ControllerEvent::Offline);

        let mut events = handle.subscribe();
        handle.publish(ControllerEvent::ListeningStarted);
        assert_eq!(events.try_recv().unwrap(), ControllerEvent::ListeningStarted);
    }
}
