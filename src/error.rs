//! Error types for every stage of QR generation.
//!
//! Each stage has its own error type so callers can decide how to recover:
//! a [`ValidationError`] leaves the previous valid state in place, an
//! [`EncodingError`] is shown to the user, and a [`RenderError`] on the logo
//! step may be downgraded to rendering the bare symbol.

use thiserror::Error;

use crate::symbol::EcLevel;

/// Malformed styling configuration or structurally mismatched content.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("invalid {field} color {value:?}, expected #RRGGBB")]
    InvalidColor { field: &'static str, value: String },
    #[error("size {0} is out of range")]
    SizeOutOfRange(u32),
    #[error("margin {margin} exceeds the maximum of {max} modules")]
    MarginOutOfRange { margin: u32, max: u32 },
    #[error("logo is {size} bytes, limit is {limit} bytes")]
    LogoTooLarge { size: usize, limit: usize },
    #[error("unknown error correction level {0:?}, expected one of L, M, Q, H")]
    UnknownEcLevel(String),
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("malformed content: {0}")]
    MalformedContent(String),
    #[error("malformed styling configuration: {0}")]
    MalformedConfig(String),
}

/// The payload cannot be carried by any supported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("payload is empty")]
    EmptyPayload,
    /// A segment's character count does not fit its count field in any allowed version.
    #[error("segment too long")]
    SegmentTooLong,
    #[error("data length = {used_bits} bits, max capacity = {capacity_bits} bits at level {ec_level:?}")]
    DataOverCapacity {
        used_bits: usize,
        capacity_bits: usize,
        ec_level: EcLevel,
    },
}

/// Rasterizing or exporting a symbol failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("output size must be positive, got {0}")]
    InvalidSize(u32),
    #[error("failed to decode logo: {0}")]
    Logo(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to build pdf: {0}")]
    Pdf(String),
}

/// Any failure of the content-to-image pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl Error {
    /// A short message suitable for showing to the person who typed the content.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Validation(_) => "The styling settings are invalid.",
            Error::Encoding(EncodingError::EmptyPayload) => "Enter some content to encode.",
            Error::Encoding(_) => "The content is too long for a QR code at this error correction level.",
            Error::Render(_) => "Failed to generate QR code. Please try again.",
        }
    }
}
