//! Error types for the sketch.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected inputs to the view-projection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub(crate) enum TransformError {
    #[error("aspect ratio must be finite and positive, got {0}")]
    InvalidAspect(f32),
    #[error("clip planes must satisfy far > near > 0, got near={near} far={far}")]
    InvalidClipRange { near: f32, far: f32 },
    #[error("look-at basis is degenerate (eye equals target or up is parallel to the view axis)")]
    DegenerateCamera,
    #[error("camera state is not finite")]
    NonFiniteCamera,
}

/// Failures while reading or writing an options file.
#[derive(Debug, Error)]
pub(crate) enum OptionsError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize options")]
    Serialize(#[from] toml::ser::Error),
    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
}

/// Top-level error returned from `main`.
#[derive(Debug, Error)]
pub(crate) enum SketchError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("invalid camera configuration")]
    Transform(#[from] TransformError),
    #[error("user interface failed")]
    Ui(#[from] iced::Error),
}
