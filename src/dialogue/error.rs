//! Dialogue failure taxonomy

use thiserror::Error;

/// Spoken when the service cannot be reached, and for anything unclassified
const CONNECTION_MESSAGE: &str =
    "No puedo conectar con el bot. Comprueba tu conexión a internet e inténtalo de nuevo.";

/// Why a dialogue query produced no reply
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    /// App id, user key or bot name rejected by the service
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The bot has no reply for this input
    #[error("no reply matched the input")]
    NoMatch,

    /// Host or app id does not point at a bot
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No network path to the service
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// The reply could not be parsed into text
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other failure reported by the service
    #[error("unexpected dialogue failure: {0}")]
    Unknown(String),
}

impl DialogueError {
    /// Message spoken to the player and written to the transcript
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => {
                "El bot ha rechazado la identificación. Revisa el identificador de la aplicación, la clave de usuario y el nombre del bot."
            }
            Self::NoMatch => "Lo siento, no tengo respuesta para eso. Prueba a preguntarlo de otra forma.",
            Self::InvalidEndpoint(_) => {
                "No encuentro el servicio del bot. Revisa la dirección y el identificador configurados."
            }
            Self::MalformedResponse(_) => "No he podido entender la respuesta del bot.",
            Self::ConnectionFailure(_) | Self::Unknown(_) => CONNECTION_MESSAGE,
        }
    }
}
