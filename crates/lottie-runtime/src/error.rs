use thiserror::Error;

/// Failures surfaced to the caller. Evaluation itself never fails; these
/// come from loading a document, choosing a segment or reporting assets.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to parse animation document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no marker named `{0}`")]
    UnknownSegment(String),

    #[error("invalid segment [{begin}, {end}]")]
    InvalidSegment { begin: f32, end: f32 },

    #[error("no image asset with id `{0}`")]
    UnknownAsset(String),

    #[error("could not decode asset `{id}`: {reason}")]
    AssetDecode { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
