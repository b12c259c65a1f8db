//! Error types for the overlay lifecycle, settings persistence and render backends

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by [`crate::lifecycle::UiLifecycleManager`]
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay is not initialized")]
    NotInitialized,

    #[error("overlay has already been shut down")]
    AlreadyShutDown,

    /// Renderer creation failed; the overlay stays unusable until `shutdown`
    #[error("overlay initialization failed: {0}")]
    InitializationFailed(String),

    #[error("no graphics device was supplied")]
    MissingDevice,

    #[error("no graphics queue was supplied")]
    MissingQueue,

    #[error("begin_frame called while a frame is already open")]
    FrameAlreadyOpen,

    #[error("render called without a matching begin_frame")]
    FrameNotOpen,

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Failures while reading or writing the layout and configuration files
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed layout in {path}: {source}")]
    LayoutDecode {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to encode layout for {path}: {source}")]
    LayoutEncode {
        path: PathBuf,
        #[source]
        source: ron::Error,
    },
}

impl SettingsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Failures raised by a [`crate::backend::RenderBackend`] while it is created
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("renderer supports exactly one frame in flight, {0} requested")]
    UnsupportedFramesInFlight(u32),

    #[error("renderer rejected the surface format {0}")]
    UnsupportedFormat(String),
}

/// Invalid edits of a [`crate::chain::Chain`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("operator {0} is not registered")]
    UnknownOperator(crate::chain::OperatorHandle),

    #[error("operator {operator} has {count} inputs, input {input} does not exist")]
    InputOutOfRange {
        operator: crate::chain::OperatorHandle,
        input: usize,
        count: usize,
    },

    #[error("operator {0} cannot feed itself")]
    SelfConnection(crate::chain::OperatorHandle),
}
