//! Assembles paginated bitmap bands into a PDF, one full-bleed JPEG per page.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::export::paginate::{PageBand, PageGeometry};
use crate::export::ExportError;

const JPEG_QUALITY: u8 = 92;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Cuts `band` out of `bitmap` onto a white page-height canvas.
pub fn band_canvas(bitmap: &RgbImage, band: &PageBand) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(bitmap.width(), band.page_height_px, WHITE);
    let available = bitmap.height().saturating_sub(band.top_px);
    let rows = band.height_px.min(available).min(band.page_height_px);
    if rows > 0 {
        let slice = imageops::crop_imm(bitmap, 0, band.top_px, bitmap.width(), rows).to_image();
        imageops::replace(&mut canvas, &slice, 0, 0);
    }
    canvas
}

fn encode_jpeg(canvas: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode_image(canvas)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn image_xobject(jpeg: Vec<u8>, width: u32, height: u32) -> Stream {
    let mut dict = Dictionary::new();
    dict.set(b"Type", name("XObject"));
    dict.set(b"Subtype", name("Image"));
    dict.set(b"Width", Object::Integer(i64::from(width)));
    dict.set(b"Height", Object::Integer(i64::from(height)));
    dict.set(b"ColorSpace", name("DeviceRGB"));
    dict.set(b"BitsPerComponent", Object::Integer(8));
    dict.set(b"Filter", name("DCTDecode"));
    let mut stream = Stream::new(dict, jpeg);
    // Already DCT-compressed.
    stream.allows_compression = false;
    stream
}

/// Draws `/Im0` scaled to cover the whole page.
fn page_content(width_pt: f32, height_pt: f32) -> Result<Vec<u8>, ExportError> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![name("Im0")]),
            Operation::new("Q", vec![]),
        ],
    };
    content
        .encode()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    canvas: &RgbImage,
    geometry: PageGeometry,
) -> Result<ObjectId, ExportError> {
    let jpeg = encode_jpeg(canvas)?;
    let image_id = doc.add_object(image_xobject(jpeg, canvas.width(), canvas.height()));

    let content = page_content(geometry.width_pt(), geometry.height_pt())?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut xobjects = Dictionary::new();
    xobjects.set(b"Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set(b"XObject", Object::Dictionary(xobjects));

    let mut page = Dictionary::new();
    page.set(b"Type", name("Page"));
    page.set(b"Parent", Object::Reference(pages_id));
    page.set(
        b"MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(geometry.width_pt()),
            Object::Real(geometry.height_pt()),
        ]),
    );
    page.set(b"Contents", Object::Reference(content_id));
    page.set(b"Resources", Object::Dictionary(resources));
    Ok(doc.add_object(Object::Dictionary(page)))
}

/// Builds the PDF bytes: one page per band, in band order.
pub fn assemble_pdf(
    bitmap: &RgbImage,
    bands: &[PageBand],
    geometry: PageGeometry,
) -> Result<Vec<u8>, ExportError> {
    if bitmap.width() == 0 || bitmap.height() == 0 || bands.is_empty() {
        return Err(ExportError::EmptyCapture);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(bands.len());
    for band in bands {
        let canvas = band_canvas(bitmap, band);
        let page_id = add_page(&mut doc, pages_id, &canvas, geometry)?;
        debug!(
            "PDF page {} from rows {}..{}",
            band.index + 1,
            band.top_px,
            band.top_px + band.height_px
        );
        kids.push(Object::Reference(page_id));
    }

    let mut pages = Dictionary::new();
    pages.set(b"Type", name("Pages"));
    pages.set(b"Count", Object::Integer(kids.len() as i64));
    pages.set(b"Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set(b"Type", name("Catalog"));
    catalog.set(b"Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set(b"Root", Object::Reference(catalog_id));

    let mut info = Dictionary::new();
    info.set(
        b"Producer",
        Object::String(
            concat!("cv-editor ", env!("CARGO_PKG_VERSION")).as_bytes().to_vec(),
            lopdf::StringFormat::Literal,
        ),
    );
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set(b"Info", Object::Reference(info_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}
