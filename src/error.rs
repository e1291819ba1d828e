use thiserror::Error;

/// Result alias used across the recognition pipeline.
pub type GestureResult<T> = std::result::Result<T, GestureError>;

#[derive(Error, Debug)]
pub enum GestureError {
    /// Connection lost, refused or timed out while reading the stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// The byte source reported end of stream
    #[error("Stream closed by remote end")]
    StreamClosed,

    /// Palm reference (landmark 0 to landmark 9) has zero length
    #[error("Degenerate landmarks: wrist and middle-finger base coincide at ({x}, {y})")]
    DegenerateInput { x: i32, y: i32 },

    #[error("Malformed landmarks: {0}")]
    MalformedLandmarks(String),

    /// Template files or configuration are unusable. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl GestureError {
    /// Transport-class failures are recovered by reconnecting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GestureError::Transport(_) | GestureError::StreamClosed)
    }
}

impl From<std::io::Error> for GestureError {
    fn from(e: std::io::Error) -> Self {
        GestureError::Transport(e.to_string())
    }
}
