//! Rasterizing and vectorizing symbols.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, warn};

use crate::error::RenderError;
use crate::style::{to_hex_color, ModuleScaling, Styling};
use crate::symbol::Symbol;

/// A rendered symbol, ready for preview or export.
///
/// Holds an RGBA raster, exportable as PNG, data URL, SVG or PDF.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    image: RgbaImage,
    modules: u32,
}

impl ImageHandle {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Symbol size plus the margin on both sides.
    pub fn modules(&self) -> u32 {
        self.modules
    }

    /// Pixels per module. Whole for integer scaling, possibly fractional for stretch.
    pub fn module_scale(&self) -> f64 {
        f64::from(self.image.width()) / f64::from(self.modules)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Renders `symbol` with `styling`, including the logo overlay if one is set.
///
/// # Example
///
/// ```rust
/// use qrcraft::render::render;
/// use qrcraft::style::Styling;
/// use qrcraft::symbol::{build, EcLevel};
///
/// let symbol = build("https://example.com", EcLevel::Medium).unwrap();
/// let image = render(&symbol, &Styling::default()).unwrap();
/// assert_eq!((image.width(), image.height()), (256, 256));
/// ```
pub fn render(symbol: &Symbol, styling: &Styling) -> Result<ImageHandle, RenderError> {
    let mut handle = render_modules(symbol, styling)?;
    if let Some(logo) = &styling.logo {
        let decoded = image::load_from_memory(&logo.bytes).map_err(RenderError::Logo)?;
        overlay_logo(&mut handle.image, &decoded.to_rgba8(), styling);
    }
    Ok(handle)
}

/// Like [`render`], but a logo that fails to decode is dropped with a
/// warning instead of failing the whole render.
pub fn render_or_bare(symbol: &Symbol, styling: &Styling) -> Result<ImageHandle, RenderError> {
    match render(symbol, styling) {
        Err(RenderError::Logo(e)) => {
            warn!("logo could not be decoded, rendering without it: {}", e);
            render_modules(symbol, styling)
        }
        other => other,
    }
}

/// Paints modules and the quiet zone, without any logo.
pub fn render_modules(symbol: &Symbol, styling: &Styling) -> Result<ImageHandle, RenderError> {
    if styling.size == 0 {
        return Err(RenderError::InvalidSize(styling.size));
    }
    let modules = symbol.size() as u32 + 2 * styling.margin;
    let side = output_side(modules, styling);
    if side != styling.size {
        debug!("adjusted {}px output to {}px", styling.size, side);
    }
    debug!("rendering {} modules into {}px", modules, side);

    let dark = {
        let [r, g, b] = styling.foreground.0;
        Rgba([r, g, b, 255])
    };
    let light = {
        let [r, g, b] = styling.background.0;
        Rgba([r, g, b, if styling.transparent { 0 } else { 255 }])
    };

    // Pixel p falls in module floor(p * modules / side), shifted by the margin
    let to_module = |p: u32| (u64::from(p) * u64::from(modules) / u64::from(side)) as i32 - styling.margin as i32;
    let columns: Vec<i32> = (0..side).map(to_module).collect();

    let mut img = RgbaImage::new(side, side);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = if symbol.get_module(columns[x as usize], columns[y as usize]) {
            dark
        } else {
            light
        };
    }

    Ok(ImageHandle { image: img, modules })
}

/// Image side in pixels for `modules` modules, never less than one pixel per module.
fn output_side(modules: u32, styling: &Styling) -> u32 {
    match styling.scaling {
        ModuleScaling::Stretch => styling.size.max(modules),
        ModuleScaling::Integer => modules * (styling.size / modules).max(1),
    }
}

/// Centers `logo` over the image at a quarter of its side, on an opaque
/// background patch two pixels larger on every edge.
fn overlay_logo(img: &mut RgbaImage, logo: &RgbaImage, styling: &Styling) {
    let side = img.width();
    let logo_side = side / 4;
    if logo_side == 0 {
        return;
    }
    let pos = (side - logo_side) / 2;

    let [r, g, b] = styling.background.0;
    let patch = Rgba([r, g, b, 255]);
    let start = pos.saturating_sub(2);
    let end = (pos + logo_side + 2).min(side);
    for y in start..end {
        for x in start..end {
            img.put_pixel(x, y, patch);
        }
    }

    let resized = imageops::resize(logo, logo_side, logo_side, FilterType::Triangle);
    imageops::overlay(img, &resized, i64::from(pos), i64::from(pos));
}

/// Returns a true vector SVG of the symbol: one path of unit squares in a
/// viewBox measured in modules, sized like the raster [`render`] produces.
/// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(symbol: &Symbol, styling: &Styling) -> String {
    let border = styling.margin as i32;
    let dimension = symbol.size() + border * 2;
    let side = output_side(dimension as u32, styling);
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{1}\" height=\"{1}\" viewBox=\"0 0 {0} {0}\" stroke=\"none\" shape-rendering=\"crispEdges\">\n",
        dimension, side
    );
    if !styling.transparent {
        result += &format!(
            "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            to_hex_color(styling.background)
        );
    }
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..symbol.size() {
        for x in 0..symbol.size() {
            if symbol.get_module(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", to_hex_color(styling.foreground));
    result += "</svg>\n";
    result
}
