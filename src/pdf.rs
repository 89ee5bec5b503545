//! Single-page PDF holding one RGB image.
//!
//! The page is the image size in points plus [`PAGE_MARGIN_PT`] on every
//! side. Streams are Flate-compressed before saving.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Margin around the image, in points.
pub const PAGE_MARGIN_PT: u32 = 20;

const IMAGE_NAME: &str = "Im0";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PdfError {
    #[error("image is empty")]
    Empty,
    #[error("expected {expected} bytes of RGB data, got {actual}")]
    PixelLength { expected: usize, actual: usize },
    #[error("pdf write failed: {0}")]
    Write(String),
}

/// Packed 8-bit RGB pixels, row-major, top row first.
#[derive(Debug, Clone, Copy)]
pub struct RgbImage<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

fn int(value: u32) -> Object {
    Object::Integer(i64::from(value))
}

/// Build a single-page PDF showing `image` inside a margin.
pub fn single_image_page(image: &RgbImage<'_>) -> Result<Vec<u8>, PdfError> {
    if image.width == 0 || image.height == 0 {
        return Err(PdfError::Empty);
    }
    let expected = image.width as usize * image.height as usize * 3;
    if image.pixels.len() != expected {
        return Err(PdfError::PixelLength { expected, actual: image.pixels.len() });
    }
    let (w, h, m) = (image.width, image.height, PAGE_MARGIN_PT);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => int(w),
            "Height" => int(h),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.pixels.to_vec(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![int(w), int(0), int(0), int(h), int(m), int(m)]),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| PdfError::Write(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![int(0), int(0), int(w + 2 * m), int(h + 2 * m)],
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
#[path = "pdf_test.rs"]
mod tests;
