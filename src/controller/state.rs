//! Conversation states

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    /// Waiting for the player to start a turn
    #[default]
    Idle,
    /// Recognizer armed
    Listening,
    /// Speech ended, waiting for recognition results
    Recognizing,
    /// Dialogue query in flight
    Querying,
    /// Reply or error message being spoken
    Speaking,
    /// Speech output failed
    Error,
}

impl ConversationState {
    /// Whether a new turn may start from here
    #[must_use]
    pub const fn accepts_turn(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether recognition events are expected
    #[must_use]
    pub const fn is_recognizing(self) -> bool {
        matches!(self, Self::Listening | Self::Recognizing)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Recognizing => "recognizing",
            Self::Querying => "querying",
            Self::Speaking => "speaking",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
