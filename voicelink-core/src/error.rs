use thiserror::Error;

/// All errors produced by voicelink-core.
#[derive(Debug, Error)]
pub enum VoiceLinkError {
    #[error("invalid chunk size: pushed {got} elements, buffer expects {expected}")]
    InvalidChunkSize { got: usize, expected: usize },

    #[error("no chunks are available")]
    NoChunksAvailable,

    #[error("invalid frame size: got {got} bytes, pipeline expects {expected}")]
    InvalidFrameSize { got: usize, expected: usize },

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("dsp error: {0}")]
    Dsp(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoiceLinkError>;
