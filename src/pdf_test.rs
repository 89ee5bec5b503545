use super::*;

use lopdf::{Dictionary, ObjectId};

fn two_by_one() -> Vec<u8> {
    vec![255, 0, 0, 0, 0, 255]
}

fn load(pdf: &[u8]) -> (Document, ObjectId) {
    let doc = Document::load_mem(pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    let page_id = *pages.values().next().unwrap();
    (doc, page_id)
}

fn page_dict(doc: &Document, page_id: ObjectId) -> &Dictionary {
    doc.get_object(page_id).unwrap().as_dict().unwrap()
}

fn ints(objects: &[Object]) -> Vec<i64> {
    objects.iter().map(|o| o.as_i64().unwrap()).collect()
}

fn image_stream(doc: &Document, page_id: ObjectId) -> &Stream {
    let resources = page_dict(doc, page_id).get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(IMAGE_NAME.as_bytes()).unwrap().as_reference().unwrap();
    doc.get_object(image_id).unwrap().as_stream().unwrap()
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if stream.dict.has(b"Filter") { stream.decompressed_content().unwrap() } else { stream.content.clone() }
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn page_is_image_plus_margin() {
    let pixels = two_by_one();
    let pdf = single_image_page(&RgbImage { width: 2, height: 1, pixels: &pixels }).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    let (doc, page_id) = load(&pdf);
    let media_box = page_dict(&doc, page_id).get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(ints(media_box), vec![0, 0, 42, 41]);
}

#[test]
fn content_places_image_inside_margin() {
    let pixels = two_by_one();
    let pdf = single_image_page(&RgbImage { width: 2, height: 1, pixels: &pixels }).unwrap();
    let (doc, page_id) = load(&pdf);

    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
    assert_eq!(operators, vec!["q", "cm", "Do", "Q"]);
    assert_eq!(ints(&content.operations[1].operands), vec![2, 0, 0, 1, 20, 20]);
}

#[test]
fn image_keeps_pixels_and_dimensions() {
    let pixels = two_by_one();
    let pdf = single_image_page(&RgbImage { width: 2, height: 1, pixels: &pixels }).unwrap();
    let (doc, page_id) = load(&pdf);

    let image = image_stream(&doc, page_id);
    assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 2);
    assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 1);
    assert_eq!(stream_bytes(image), pixels);
}

#[test]
fn large_flat_image_is_compressed() {
    let pixels = vec![200u8; 100 * 100 * 3];
    let pdf = single_image_page(&RgbImage { width: 100, height: 100, pixels: &pixels }).unwrap();
    assert!(pdf.len() < pixels.len());

    let (doc, page_id) = load(&pdf);
    let image = image_stream(&doc, page_id);
    assert!(image.dict.has(b"Filter"));
    assert_eq!(stream_bytes(image), pixels);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn rejects_bad_input() {
    assert_eq!(single_image_page(&RgbImage { width: 0, height: 1, pixels: &[] }).unwrap_err(), PdfError::Empty);
    assert_eq!(
        single_image_page(&RgbImage { width: 2, height: 1, pixels: &[0, 0, 0] }).unwrap_err(),
        PdfError::PixelLength { expected: 6, actual: 3 }
    );
}
