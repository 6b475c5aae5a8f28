use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwitchError>;

/// Every failure the client can surface, so callers can tell "the service
/// complained" apart from "the transport is broken" apart from bad input.
#[derive(Error, Debug)]
pub enum TwitchError {
    /// A required credential (client ID, token) is unset. Checked before
    /// any network attempt.
    #[error("Missing configuration: {0}")]
    Config(&'static str),

    /// Invalid caller input, rejected before any network attempt.
    #[error("{0}")]
    Precondition(String),

    /// Twitch answered with a structured error payload.
    #[error("Twitch returned {} {}: {}", .status, .error, .message.as_deref().unwrap_or("no details"))]
    Platform {
        status: u16,
        error: String,
        message: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not authenticated. Please log in to Twitch first.")]
    Unauthorized,

    /// The curl subprocess failed to spawn, exited non-zero, or produced
    /// output that is not an HTTP response.
    #[error("Request failed: {0}")]
    Transport(String),
}
