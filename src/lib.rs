//! Who is who - voice-driven guessing game controller
//!
//! The player thinks of a character and asks yes/no questions out loud. Each
//! question is recognized, sent to a hosted conversational bot, and the
//! bot's answer is spoken back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  VoiceEvent   ┌──────────────┐   query   ┌──────────────┐
//! │   VoiceIo    │──────────────▶│  Controller  │──────────▶│   Dialogue   │
//! │ (recognizer, │◀──────────────│ (state, log) │◀──────────│ (talk API)   │
//! │  synthesizer)│ listen/speak  └──────┬───────┘ completion└──────────────┘
//! └──────────────┘                      │ ControllerEvent
//!                                       ▼
//!                                  host application
//! ```

pub mod config;
pub mod controller;
pub mod dialogue;
pub mod error;
pub mod text;
pub mod transcript;
pub mod voice;

pub use config::Config;
pub use controller::{
    Controller, ControllerEvent, ControllerHandle, ControllerSettings, ConversationState, Input,
};
pub use dialogue::{Dialogue, DialogueError, PandoraClient};
pub use error::{Error, Result};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use voice::{ConsoleVoice, PromptPurpose, VoiceEvent, VoiceIo};
