//! Error types for source ingestion, tile encoding and point-list planning.
//!
//! Unknown sources are never reported through these types: queries against a
//! source that is not registered degrade to empty results instead.

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Category of a [`GeoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing ingest payload, or a malformed query argument
    InvalidInput,
    /// The underlying index construction rejected the document
    BuildFailed,
    /// A feature set could not be represented as a vector tile
    EncodingFailed,
    /// The external document loader failed to produce a document
    LoadFailed,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::BuildFailed => write!(f, "Build failed"),
            ErrorKind::EncodingFailed => write!(f, "Encoding failed"),
            ErrorKind::LoadFailed => write!(f, "Load failed"),
        }
    }
}

/// Errors produced by the geosource core.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Index build failed: {0}")]
    BuildFailed(String),

    #[error("Tile encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Source load failed: {0}")]
    LoadFailed(String),
}

impl GeoError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::InvalidInput(_) => ErrorKind::InvalidInput,
            GeoError::BuildFailed(_) => ErrorKind::BuildFailed,
            GeoError::EncodingFailed(_) => ErrorKind::EncodingFailed,
            GeoError::LoadFailed(_) => ErrorKind::LoadFailed,
        }
    }

    /// Returns the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            GeoError::InvalidInput(msg)
            | GeoError::BuildFailed(msg)
            | GeoError::EncodingFailed(msg)
            | GeoError::LoadFailed(msg) => msg,
        }
    }
}

impl From<geojson::Error> for GeoError {
    fn from(err: geojson::Error) -> Self {
        GeoError::InvalidInput(format!("Malformed GeoJSON: {}", err))
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::InvalidInput(format!("Malformed JSON: {}", err))
    }
}

impl From<prost::EncodeError> for GeoError {
    fn from(err: prost::EncodeError) -> Self {
        GeoError::EncodingFailed(err.to_string())
    }
}

impl From<prost::DecodeError> for GeoError {
    fn from(err: prost::DecodeError) -> Self {
        GeoError::InvalidInput(format!("Malformed vector tile: {}", err))
    }
}

/// Result type for geosource operations.
pub type GeoResult<T> = Result<T, GeoError>;
