use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Podcast script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Incomplete audio descriptor for '{mime_type}': missing {missing}")]
    IncompleteWavDescriptor {
        mime_type: String,
        missing: &'static str,
    },

    #[error("Invalid '{key}' parameter in mime type '{mime_type}'")]
    InvalidMimeParameter { mime_type: String, key: String },

    #[error("No audio data was received from the speech provider for {0}")]
    NoAudioReceived(String),

    #[error("Speech provider mixed audio formats within {segment}: {first} then {second}")]
    MixedAudioFormats {
        segment: String,
        first: String,
        second: String,
    },

    #[error("Raw PCM payload of {0} bytes does not fit in a WAV container")]
    PayloadTooLarge(u64),

    #[error("Invalid segmentation: {0}")]
    InvalidSegmentation(&'static str),

    #[error("Script produced no segments to synthesize")]
    EmptyScript,

    #[error("A pipeline run is already in progress")]
    RunInProgress,

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
