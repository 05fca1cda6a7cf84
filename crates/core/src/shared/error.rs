use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by configuration and by a watermark removal run.
///
/// The variants separate user-fixable pre-flight problems from run-time
/// environment failures, and keep a failed audio remux apart from a failed
/// video pass so callers can keep the processed video.
#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported source: {0}")]
    InvalidSource(String),

    #[error("{0}")]
    Resource(String),

    #[error("audio remux failed: {message}")]
    Remux {
        message: String,
        video_only: Option<PathBuf>,
    },

    #[error("processing cancelled")]
    Cancelled,
}

impl WatermarkError {
    pub fn resource(context: &str, err: impl std::fmt::Display) -> Self {
        WatermarkError::Resource(format!("{context}: {err}"))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, WatermarkError::Config(_))
    }

    pub fn is_remux(&self) -> bool {
        matches!(self, WatermarkError::Remux { .. })
    }
}
