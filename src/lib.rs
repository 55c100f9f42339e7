//! # qrcraft
//!
//! A Rust library for turning structured content into styled QR code images.
//!
//! `qrcraft` formats plain text, URLs, phone numbers, e-mail drafts, WiFi
//! credentials, contact cards and calendar events into the payload strings
//! scanners understand, encodes them as QR Code Model 2 symbols (versions 1
//! to 40, four error correction levels), and renders them with custom colors,
//! quiet zone, output size and an optional centered logo.
//!
//! ## Features
//!
//! - Payload formatting for `WIFI:`, `BEGIN:VCARD`, `BEGIN:VEVENT`, `mailto:` and `tel:` schemes.
//! - Numeric, alphanumeric and byte mode encoding with automatic version selection.
//! - RGBA rendering with transparent backgrounds and logo overlay.
//! - PNG, data URL, SVG and single-page PDF export.
//! - Debounced, memoized regeneration for interactive editors.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrcraft = "0.1"
//! ```
//!
//! ## Example
//!
//! Generate a WiFi login code:
//!
//! ```rust
//! use qrcraft::payload::{Content, WifiConfig, WifiSecurity};
//! use qrcraft::style::StylingConfig;
//!
//! let content = Content::Wifi(WifiConfig {
//!     ssid: "HomeNet".into(),
//!     password: "secret123".into(),
//!     security: WifiSecurity::Wpa,
//! });
//! let styling = StylingConfig::default().resolve().unwrap();
//! let image = qrcraft::generate(&content, &styling).unwrap();
//! assert_eq!((image.width(), image.height()), (256, 256));
//! assert!(!image.to_png().unwrap().is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`payload`]: Content variants and their payload strings.
//! - [`symbol`]: QR symbol construction.
//! - [`style`]: Styling configuration and validation.
//! - [`render`]: Rasterizing and vector output.
//! - [`session`]: Debouncing and memoization for editors.

#![forbid(unsafe_code)]

pub mod error;
mod export;
pub mod payload;
pub mod render;
pub mod segment;
pub mod session;
pub mod style;
pub mod symbol;

use log::debug;

pub use error::{EncodingError, Error, RenderError, ValidationError};
pub use payload::Content;
pub use render::ImageHandle;
pub use style::{Styling, StylingConfig};
pub use symbol::{EcLevel, Symbol};

/// Runs the whole pipeline: payload, symbol, image.
///
/// Blank content is rejected with [`EncodingError::EmptyPayload`]. A logo
/// that fails to decode is skipped and the bare symbol is returned.
pub fn generate(content: &Content, styling: &Styling) -> Result<ImageHandle, Error> {
    if content.is_blank() {
        return Err(EncodingError::EmptyPayload.into());
    }
    let payload = payload::encode(content);
    let symbol = symbol::build(&payload, styling.ec_level)?;
    debug!(
        "{} payload of {} bytes fits version {} at level {}",
        content.kind(),
        payload.len(),
        symbol.version().value(),
        styling.ec_level
    );
    Ok(render::render_or_bare(&symbol, styling)?)
}
