//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;

use whoiswho::controller::TurnOutcome;
use whoiswho::dialogue::{Dialogue, DialogueError};
use whoiswho::voice::{Connectivity, ListenRequest, Utterance, VoiceIo};
use whoiswho::{Controller, ControllerEvent, ControllerHandle, ControllerSettings, Error, Input};

/// A call made on the voice facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCall {
    Listen(ListenRequest),
    Cancel,
    Speak(Utterance),
}

/// Voice facade that records calls and never reports back on its own
#[derive(Debug, Default)]
pub struct RecordingVoice {
    calls: Mutex<Vec<VoiceCall>>,
    fail_listen: AtomicBool,
    fail_speak: AtomicBool,
}

impl RecordingVoice {
    pub fn calls(&self) -> Vec<VoiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listen_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, VoiceCall::Listen(_)))
            .count()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                VoiceCall::Speak(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn last_spoken(&self) -> Utterance {
        self.spoken().pop().expect("nothing spoken")
    }

    pub fn set_fail_listen(&self, fail: bool) {
        self.fail_listen.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_speak(&self, fail: bool) {
        self.fail_speak.store(fail, Ordering::SeqCst);
    }
}

impl VoiceIo for RecordingVoice {
    fn begin_listening(&self, request: &ListenRequest) -> whoiswho::Result<()> {
        if self.fail_listen.load(Ordering::SeqCst) {
            return Err(Error::Voice("recognizer unavailable".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Listen(request.clone()));
        Ok(())
    }

    fn cancel_listening(&self) {
        self.calls.lock().unwrap().push(VoiceCall::Cancel);
    }

    fn speak(&self, utterance: &Utterance) -> whoiswho::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Speak(utterance.clone()));
        if self.fail_speak.load(Ordering::SeqCst) {
            return Err(Error::Tts("no voice installed".to_string()));
        }
        Ok(())
    }
}

/// Dialogue that replays scripted outcomes and records what it was asked
#[derive(Debug, Default)]
pub struct ScriptedDialogue {
    replies: Mutex<VecDeque<TurnOutcome>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedDialogue {
    pub fn new(replies: Vec<TurnOutcome>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialogue for ScriptedDialogue {
    async fn query(&self, utterance: &str) -> Result<String, DialogueError> {
        self.asked.lock().unwrap().push(utterance.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DialogueError::NoMatch))
    }
}

/// Connectivity that tests can switch on and off
#[derive(Debug)]
pub struct Switch(AtomicBool);

impl Switch {
    pub fn on() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for Switch {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A controller wired to fakes, driven input by input
pub struct Harness {
    pub controller: Controller,
    pub inbox: UnboundedReceiver<Input>,
    pub handle: ControllerHandle,
    pub events: broadcast::Receiver<ControllerEvent>,
    pub voice: Arc<RecordingVoice>,
    pub dialogue: Arc<ScriptedDialogue>,
    pub network: Arc<Switch>,
}

impl Harness {
    pub fn new(dialogue: ScriptedDialogue) -> Self {
        Self::with_settings(dialogue, ControllerSettings::default())
    }

    pub fn with_settings(dialogue: ScriptedDialogue, settings: ControllerSettings) -> Self {
        let (handle, inbox) = ControllerHandle::channel();
        let events = handle.subscribe();
        let voice = Arc::new(RecordingVoice::default());
        let dialogue = Arc::new(dialogue);
        let network = Arc::new(Switch::on());

        let controller = Controller::new(
            settings,
            Box::new(Arc::clone(&voice)),
            Arc::clone(&dialogue) as Arc<dyn Dialogue>,
            Box::new(Arc::clone(&network)),
            &handle,
        );

        Self {
            controller,
            inbox,
            handle,
            events,
            voice,
            dialogue,
            network,
        }
    }

    pub async fn send(&mut self, input: Input) {
        assert!(self.controller.handle(input).await);
    }

    /// Wait for the spawned query to report back and apply it
    pub async fn complete_query(&mut self) {
        loop {
            let input = self.inbox.recv().await.expect("inbox closed");
            if matches!(input, Input::QueryCompleted { .. }) {
                self.send(input).await;
                return;
            }
        }
    }

    /// Notifications published so far
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
