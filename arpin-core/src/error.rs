//! Error types for the frame pipeline

use crate::ar::ObjectSlot;
use std::path::PathBuf;

/// Failures reported by the tracking session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The session exists but cannot produce frames yet
    #[error("Tracking session is not ready")]
    NotReady,

    /// The device camera is held by another client or not yet opened
    #[error("Camera is not available")]
    CameraNotAvailable,

    /// The tracking service must be installed before a session can be created
    #[error("Tracking service installation requested")]
    InstallRequested,

    /// Camera permission has not been granted
    #[error("Camera permission denied")]
    PermissionDenied,

    /// The session refused to create another anchor
    #[error("Anchor limit reached ({0} live anchors)")]
    AnchorLimitReached(usize),

    /// An operation referenced an anchor the session does not know about
    #[error("Unknown anchor: {0}")]
    UnknownAnchor(String),

    /// Any other failure surfaced by the tracking engine
    #[error("Tracking backend error: {0}")]
    Backend(String),
}

impl SessionError {
    /// Whether the failure means no session could be brought up at all,
    /// as opposed to a single frame or anchor failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            SessionError::NotReady
                | SessionError::CameraNotAvailable
                | SessionError::InstallRequested
                | SessionError::PermissionDenied
        )
    }
}

/// Failures reported by the rendering backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Backend rejected a draw or upload
    #[error("Render backend error: {0}")]
    Backend(String),

    /// A slot was drawn before its model finished loading
    #[error("Model for slot {0} is not loaded")]
    ModelNotLoaded(ObjectSlot),

    /// A model or texture could not be read
    #[error("Failed to load asset {path}: {reason}")]
    AssetLoad {
        /// Asset path as configured
        path: PathBuf,
        /// Backend supplied reason
        reason: String,
    },
}

/// Configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values parsed but make no sense together
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-tick pipeline failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Session could not be created, resumed or updated
    #[error("Session unavailable: {0}")]
    SessionUnavailable(SessionError),

    /// Session call failed mid-tick
    #[error(transparent)]
    Session(SessionError),

    /// A hit was accepted but the session would not anchor it
    #[error("Anchor creation for {slot} failed: {source}")]
    AnchorCreation {
        /// Slot that was being attached
        slot: ObjectSlot,
        /// Underlying session failure
        source: SessionError,
    },

    /// Drawing failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration rejected when the pipeline was built
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<SessionError> for PipelineError {
    fn from(err: SessionError) -> Self {
        if err.is_unavailable() {
            PipelineError::SessionUnavailable(err)
        } else {
            PipelineError::Session(err)
        }
    }
}

/// Result alias used throughout the pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_session_errors_map_to_unavailable() {
        let err: PipelineError = SessionError::CameraNotAvailable.into();
        assert_eq!(err, PipelineError::SessionUnavailable(SessionError::CameraNotAvailable));

        let err: PipelineError = SessionError::Backend("boom".into()).into();
        assert_eq!(err, PipelineError::Session(SessionError::Backend("boom".into())));
    }

    #[test]
    fn test_anchor_creation_message_names_slot() {
        let err = PipelineError::AnchorCreation {
            slot: ObjectSlot::Cannon,
            source: SessionError::AnchorLimitReached(20),
        };
        assert_eq!(
            err.to_string(),
            "Anchor creation for cannon failed: Anchor limit reached (20 live anchors)"
        );
    }
}
