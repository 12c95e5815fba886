//! Recognizer error codes and their spoken messages

/// Error reported by the speech recognizer
///
/// Numbering follows the platform recognizer (1–9). Codes outside that
/// range are kept as [`RecognitionErrorCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionErrorCode {
    /// Network operation timed out
    NetworkTimeout,
    /// Other network related error
    Network,
    /// Audio recording error
    Audio,
    /// Server sent an error status
    Server,
    /// Client side error
    Client,
    /// No speech input
    SpeechTimeout,
    /// No recognition result matched
    NoMatch,
    /// Recognition service busy
    RecognizerBusy,
    /// Microphone permission missing
    InsufficientPermissions,
    /// Unlisted engine code
    Other(i32),
}

impl RecognitionErrorCode {
    /// Decode a platform error code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NetworkTimeout,
            2 => Self::Network,
            3 => Self::Audio,
            4 => Self::Server,
            5 => Self::Client,
            6 => Self::SpeechTimeout,
            7 => Self::NoMatch,
            8 => Self::RecognizerBusy,
            9 => Self::InsufficientPermissions,
            other => Self::Other(other),
        }
    }

    /// Platform error code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::NetworkTimeout => 1,
            Self::Network => 2,
            Self::Audio => 3,
            Self::Server => 4,
            Self::Client => 5,
            Self::SpeechTimeout => 6,
            Self::NoMatch => 7,
            Self::RecognizerBusy => 8,
            Self::InsufficientPermissions => 9,
            Self::Other(code) => code,
        }
    }

    /// Message spoken to the player, if this error is surfaced at all
    ///
    /// Unlisted codes are engine noise rather than recognition failures and
    /// return `None`.
    #[must_use]
    pub const fn message(self) -> Option<&'static str> {
        let message = match self {
            Self::Audio => "Ha habido un error al grabar el audio.",
            Self::Client => "Ha habido un error desconocido en el reconocedor.",
            Self::InsufficientPermissions => "No tengo permiso para usar el micrófono.",
            Self::Network => "Ha habido un error de red durante el reconocimiento.",
            Self::NetworkTimeout => "La red ha tardado demasiado en responder.",
            Self::NoMatch => "No he reconocido lo que has dicho.",
            Self::RecognizerBusy => "El reconocedor de voz está ocupado.",
            Self::Server => "El servidor de reconocimiento ha devuelto un error.",
            Self::SpeechTimeout => "No he oído nada.",
            Self::Other(_) => return None,
        };
        Some(message)
    }
}

impl std::fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(code) => write!(f, "recognizer error {code}"),
            known => write!(f, "{known:?}"),
        }
    }
}
