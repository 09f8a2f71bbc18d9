//! Error taxonomy for the detection pipeline.

use thiserror::Error;

/// Failures at the model execution boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inference runtime could not be initialized: {0}")]
    RuntimeInit(#[source] ort::Error),

    #[error("no runtime library fallback known for {os}/{arch}")]
    UnsupportedPlatform {
        os: &'static str,
        arch: &'static str,
    },

    #[error("inference session failed: {0}")]
    Session(#[from] ort::Error),

    #[error("model output slot `{0}` missing")]
    MissingOutput(&'static str),

    /// A tensor did not match the fixed contract. This is a programming
    /// error, never silently truncated or padded.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

/// Failures of a single detection request.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failures while persisting an annotated image. These never reach the
/// caller of the box list; the artifact simply stays absent from the index.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("could not write annotated image: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode annotated image: {0}")]
    Encode(#[from] image::ImageError),
}
