//! Error handling for Dubmix
//!
//! Errors fall into four families: validation (rejected before any
//! mutation), effect failures (caught inside the chain), render failures
//! (terminal for one compositor call) and persistence failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Dubmix operations
pub type Result<T> = std::result::Result<T, DubmixError>;

/// Main error type for Dubmix operations
#[derive(Error, Debug)]
pub enum DubmixError {
    // Validation Errors
    #[error("Unknown bus: {name}")]
    UnknownBus { name: String },

    #[error("Unknown effect kind: {name}")]
    UnknownEffectKind { name: String },

    #[error("Effect index {index} out of range for {bus} ({len} effects)")]
    EffectIndexOutOfRange {
        bus: String,
        index: usize,
        len: usize,
    },

    #[error("Unknown parameter '{name}' for {effect} effect")]
    UnknownParameter { effect: String, name: String },

    #[error("Invalid audio: {reason}")]
    InvalidAudio { reason: String },

    #[error("Invalid routing for {bus}: {reason}")]
    InvalidRouting { bus: String, reason: String },

    #[error("Invalid clip #{index}: {reason}")]
    InvalidClip { index: usize, reason: String },

    #[error("Clip #{first} overlaps clip #{second}")]
    OverlappingClips { first: usize, second: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Effect Errors
    #[error("{effect} effect failed: {reason}")]
    EffectFailed { effect: String, reason: String },

    // Render Errors
    #[error("Render failed: {reason}")]
    RenderFailed { reason: String },

    #[error("External tool not found: {tool}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Graph lock poisoned")]
    LockPoisoned,

    // Persistence Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration document: {reason}")]
    MalformedDocument { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DubmixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            DubmixError::UnknownBus { .. } => "UNKNOWN_BUS",
            DubmixError::UnknownEffectKind { .. } => "UNKNOWN_EFFECT_KIND",
            DubmixError::EffectIndexOutOfRange { .. } => "EFFECT_INDEX_OUT_OF_RANGE",
            DubmixError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            DubmixError::InvalidAudio { .. } => "INVALID_AUDIO",
            DubmixError::InvalidRouting { .. } => "INVALID_ROUTING",
            DubmixError::InvalidClip { .. } => "INVALID_CLIP",
            DubmixError::OverlappingClips { .. } => "OVERLAPPING_CLIPS",
            DubmixError::InvalidConfig { .. } => "INVALID_CONFIG",
            DubmixError::EffectFailed { .. } => "EFFECT_FAILED",
            DubmixError::RenderFailed { .. } => "RENDER_FAILED",
            DubmixError::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            DubmixError::LockPoisoned => "LOCK_POISONED",
            DubmixError::FileReadError { .. } => "FILE_READ_ERROR",
            DubmixError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            DubmixError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            DubmixError::Io(_) => "IO_ERROR",
            DubmixError::Wav(_) => "WAV_ERROR",
            DubmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Validation errors are raised before anything is mutated
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DubmixError::UnknownBus { .. }
                | DubmixError::UnknownEffectKind { .. }
                | DubmixError::EffectIndexOutOfRange { .. }
                | DubmixError::UnknownParameter { .. }
                | DubmixError::InvalidAudio { .. }
                | DubmixError::InvalidRouting { .. }
                | DubmixError::InvalidClip { .. }
                | DubmixError::OverlappingClips { .. }
                | DubmixError::InvalidConfig { .. }
        )
    }

    /// Check if this error is recoverable
    ///
    /// Effect failures are absorbed by the chain; validation errors leave
    /// state untouched, so the caller can correct input and retry.
    pub fn is_recoverable(&self) -> bool {
        self.is_validation() || matches!(self, DubmixError::EffectFailed { .. })
    }

    pub(crate) fn effect(effect: &str, reason: impl Into<String>) -> Self {
        DubmixError::EffectFailed {
            effect: effect.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn render(reason: impl Into<String>) -> Self {
        DubmixError::RenderFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DubmixError::UnknownBus {
            name: "drums_bus".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_BUS");
        assert_eq!(err.to_string(), "Unknown bus: drums_bus");
    }

    #[test]
    fn test_validation_is_recoverable() {
        let err = DubmixError::OverlappingClips { first: 0, second: 1 };
        assert!(err.is_validation());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_render_failure_is_terminal() {
        let err = DubmixError::render("ffmpeg exited with status 1");
        assert!(!err.is_validation());
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "RENDER_FAILED");
    }
}
