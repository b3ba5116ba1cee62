//! Shared test utilities: synthetic image files.
//!
//! Fixtures are encoded on the fly with the `image` crate; EXIF blocks are
//! serialized with kamadak-exif's writer and spliced into a JPEG as an APP1
//! segment.

use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Encode a blank image of the given size
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// A JPEG carrying `fields` in its EXIF segment
pub fn jpeg_with_exif(width: u32, height: u32, fields: &[Field]) -> Vec<u8> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let jpeg = encoded_image(width, height, ImageFormat::Jpeg);
    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

/// A JPEG whose EXIF says it was taken at `taken` (`YYYY:MM:DD HH:MM:SS`)
pub fn jpeg_taken_at(taken: &str) -> Vec<u8> {
    jpeg_with_exif(
        4,
        3,
        &[
            ascii_field(Tag::Make, "Canon"),
            ascii_field(Tag::DateTimeOriginal, taken),
        ],
    )
}

pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// Write a small PNG without any EXIF data
pub fn write_png(path: &Path) {
    write_file(path, &encoded_image(2, 2, ImageFormat::Png));
}
