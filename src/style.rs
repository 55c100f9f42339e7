//! Styling configuration and its validation.
//!
//! [`StylingConfig`] is what the caller edits: hex color strings, numbers
//! straight from sliders, an optional logo file. [`StylingConfig::resolve`]
//! turns it into a [`Styling`] the renderer can trust.

use image::Rgb;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::symbol::EcLevel;

/// Smallest output side in pixels.
pub const MIN_SIZE: u32 = 128;
/// Largest output side in pixels.
pub const MAX_SIZE: u32 = 512;
/// Largest quiet zone, in modules.
pub const MAX_MARGIN: u32 = 20;
/// Largest accepted logo file.
pub const MAX_LOGO_BYTES: usize = 50_000;

/// How symbol modules map onto output pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleScaling {
    /// The image is exactly `size` pixels wide; modules may differ by one pixel.
    #[default]
    Stretch,
    /// Every module is the same whole number of pixels; the image may be
    /// slightly smaller than `size`.
    Integer,
}

/// Raw styling as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylingConfig {
    pub foreground: String,
    pub background: String,
    pub transparent: bool,
    pub error_correction: EcLevel,
    pub size: u32,
    pub margin: u32,
    pub scaling: ModuleScaling,
    /// Encoded image file (PNG, JPEG, ...). Attached with [`StylingConfig::with_logo`].
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
            transparent: false,
            error_correction: EcLevel::Medium,
            size: 256,
            margin: 4,
            scaling: ModuleScaling::Stretch,
            logo: None,
        }
    }
}

impl StylingConfig {
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::MalformedConfig(e.to_string()))
    }

    pub fn with_logo(mut self, bytes: Vec<u8>) -> Self {
        self.logo = Some(bytes);
        self
    }

    /// Validates and normalizes this configuration.
    ///
    /// Colors must be `#RRGGBB`. A zero size is rejected and any other size
    /// is clamped into [`MIN_SIZE`]..=[`MAX_SIZE`]. Margins above
    /// [`MAX_MARGIN`] and logos above [`MAX_LOGO_BYTES`] are rejected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrcraft::style::StylingConfig;
    ///
    /// let mut config = StylingConfig::default();
    /// config.foreground = "#1a2B3c".into();
    /// let styling = config.resolve().unwrap();
    /// assert_eq!(styling.foreground.0, [0x1a, 0x2b, 0x3c]);
    ///
    /// config.background = "white".into();
    /// assert!(config.resolve().is_err());
    /// ```
    pub fn resolve(&self) -> Result<Styling, ValidationError> {
        let foreground = parse_hex_color(&self.foreground).ok_or_else(|| ValidationError::InvalidColor {
            field: "foreground",
            value: self.foreground.clone(),
        })?;
        let background = parse_hex_color(&self.background).ok_or_else(|| ValidationError::InvalidColor {
            field: "background",
            value: self.background.clone(),
        })?;

        if self.size == 0 {
            return Err(ValidationError::SizeOutOfRange(self.size));
        }
        let size = self.size.clamp(MIN_SIZE, MAX_SIZE);
        if size != self.size {
            debug!("clamped size {} to {}", self.size, size);
        }

        if self.margin > MAX_MARGIN {
            return Err(ValidationError::MarginOutOfRange {
                margin: self.margin,
                max: MAX_MARGIN,
            });
        }

        let logo = match &self.logo {
            Some(bytes) if bytes.len() > MAX_LOGO_BYTES => {
                return Err(ValidationError::LogoTooLarge {
                    size: bytes.len(),
                    limit: MAX_LOGO_BYTES,
                });
            }
            Some(bytes) if !bytes.is_empty() => Some(Logo { bytes: bytes.clone() }),
            _ => None,
        };

        Ok(Styling {
            foreground,
            background,
            transparent: self.transparent,
            ec_level: self.error_correction,
            size,
            margin: self.margin,
            scaling: self.scaling,
            logo,
        })
    }
}

/// An undecoded logo image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logo {
    pub bytes: Vec<u8>,
}

/// Validated styling, ready for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Styling {
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
    /// Light modules and the margin are left fully transparent.
    pub transparent: bool,
    pub ec_level: EcLevel,
    /// Output side in pixels.
    pub size: u32,
    /// Quiet zone width in modules.
    pub margin: u32,
    pub scaling: ModuleScaling,
    pub logo: Option<Logo>,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            foreground: Rgb([0, 0, 0]),
            background: Rgb([255, 255, 255]),
            transparent: false,
            ec_level: EcLevel::Medium,
            size: 256,
            margin: 4,
            scaling: ModuleScaling::Stretch,
            logo: None,
        }
    }
}

/// Holds the last accepted styling. A rejected update leaves it untouched.
#[derive(Clone, Debug, Default)]
pub struct StyleResolver {
    current: Styling,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Styling {
        &self.current
    }

    pub fn update(&mut self, config: &StylingConfig) -> Result<&Styling, ValidationError> {
        self.current = config.resolve()?;
        Ok(&self.current)
    }
}

/// Parses `#RRGGBB`, case-insensitive.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Formats a color as lowercase `#rrggbb`.
pub fn to_hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
