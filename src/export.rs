//! Export conversions for [`ImageHandle`].

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::RenderError;
use crate::render::ImageHandle;

/// A4 in PDF points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const CAPTION: &str = "Generated QR Code";
const CAPTION_FONT_SIZE: f32 = 16.0;
/// Helvetica advance width of `CAPTION`, in ems.
const CAPTION_WIDTH_EM: f32 = 9.171;
const CAPTION_TOP: f32 = 85.0;
const IMAGE_TOP: f32 = 113.0;

impl ImageHandle {
    /// Encodes the image as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        self.as_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(RenderError::Encode)?;
        Ok(bytes)
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> Result<String, RenderError> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png)))
    }

    /// An SVG document that embeds the PNG raster at its natural size.
    pub fn to_svg_wrapper(&self) -> Result<String, RenderError> {
        let href = self.to_data_url()?;
        Ok(format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\t<image href=\"{href}\" width=\"100%\" height=\"100%\"/>\n</svg>\n",
            w = self.width(),
            h = self.height(),
            href = href
        ))
    }

    /// A single A4 page with a centered caption and the image centered below it.
    ///
    /// The image is drawn `min(0.8 * page width, width)` points wide.
    /// Transparent pixels are composited onto white.
    pub fn to_pdf(&self) -> Result<Vec<u8>, RenderError> {
        let img = self.as_image();
        let mut rgb = Vec::with_capacity(img.as_raw().len() / 4 * 3);
        for px in img.pixels() {
            let alpha = u32::from(px[3]);
            for c in &px.0[..3] {
                rgb.push(((u32::from(*c) * alpha + 255 * (255 - alpha)) / 255) as u8);
            }
        }

        let draw = (PAGE_WIDTH * 0.8).min(img.width() as f32);
        let x = (PAGE_WIDTH - draw) / 2.0;
        let y = PAGE_HEIGHT - IMAGE_TOP - draw;
        let caption_x = (PAGE_WIDTH - CAPTION_WIDTH_EM * CAPTION_FONT_SIZE) / 2.0;

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(img.width()),
                "Height" => i64::from(img.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            rgb,
        ));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), CAPTION_FONT_SIZE.into()]),
                Operation::new("Td", vec![caption_x.into(), (PAGE_HEIGHT - CAPTION_TOP).into()]),
                Operation::new("Tj", vec![Object::string_literal(CAPTION)]),
                Operation::new("ET", vec![]),
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![draw.into(), 0i64.into(), 0i64.into(), draw.into(), x.into(), y.into()],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| RenderError::Pdf(e.to_string()))?;
        debug!("built {} byte pdf for {}px image", bytes.len(), img.width());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::render::render;
    use crate::style::Styling;
    use crate::symbol::{build, EcLevel};
    use base64::{engine::general_purpose, Engine as _};
    use lopdf::content::{Content, Operation};
    use lopdf::Document;

    fn handle() -> crate::render::ImageHandle {
        let symbol = build("https://example.com", EcLevel::Medium).unwrap();
        render(&symbol, &Styling::default()).unwrap()
    }

    #[test]
    fn test_png_decodes_to_same_pixels() {
        let handle = handle();
        let png = handle.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(&decoded, handle.as_image());
    }

    #[test]
    fn test_data_url() {
        let handle = handle();
        let url = handle.to_data_url().unwrap();
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(bytes, handle.to_png().unwrap());
    }

    #[test]
    fn test_svg_wrapper() {
        let svg = handle().to_svg_wrapper().unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"256\" height=\"256\""));
        assert!(svg.contains("<image href=\"data:image/png;base64,"));
        assert!(svg.contains("width=\"100%\" height=\"100%\""));
    }

    fn page_operations(pdf: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    fn operands(ops: &[Operation], operator: &str) -> Vec<f32> {
        let op = ops.iter().find(|op| op.operator == operator).unwrap();
        op.operands.iter().map(|o| o.as_float().unwrap()).collect()
    }

    #[test]
    fn test_pdf_page_layout() {
        let handle = handle();
        let pdf = handle.to_pdf().unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));

        let ops = page_operations(&pdf);
        let caption = ops.iter().find(|op| op.operator == "Tj").unwrap();
        assert_eq!(caption.operands[0].as_str().unwrap(), b"Generated QR Code");

        // 256pt wide image centered on a 595pt page
        let cm = operands(&ops, "cm");
        assert_eq!(cm, vec![256.0, 0.0, 0.0, 256.0, 169.5, 473.0]);

        // Caption centered on the page
        let td = operands(&ops, "Td");
        let caption_width = 9.171 * 16.0;
        assert!((td[0] * 2.0 + caption_width - 595.0).abs() < 0.01);
        assert_eq!(td[1], 757.0);
    }

    #[test]
    fn test_pdf_embeds_raw_rgb_image() {
        let pdf = handle().to_pdf().unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|t| t.as_name()).ok() == Some(b"Image".as_slice()))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 256);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 256);
        assert_eq!(image.content.len(), 256 * 256 * 3);
        // Top left pixel is quiet zone white
        assert_eq!(&image.content[..3], &[255, 255, 255]);
    }

    #[test]
    fn test_pdf_caps_large_images() {
        let symbol = build("https://example.com", EcLevel::Medium).unwrap();
        let styling = Styling { size: 512, ..Styling::default() };
        let pdf = render(&symbol, &styling).unwrap().to_pdf().unwrap();
        let cm = operands(&page_operations(&pdf), "cm");
        assert_eq!(cm[0], 476.0);
        assert_eq!(cm[4], 59.5);
    }
}
