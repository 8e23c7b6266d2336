use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug, PartialEq)]
pub enum AudioError {
    /// Empty or degenerate waveform, or a frame with no spectral energy.
    #[error("Audio invalide : {0}")]
    InvalidAudio(String),

    /// Unsupported audio format.
    #[error("Format audio non supporté : {0}")]
    UnsupportedFormat(String),

    /// Audio decode error.
    #[error("Erreur de décodage : {0}")]
    DecodeError(String),
}
