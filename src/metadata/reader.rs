//! Reading metadata groups from an image stream
//!
//! EXIF fields come from kamadak-exif and the pixel size from the `image`
//! crate's header parsing. Both are converted into [`RawTag`]s so the
//! parser works on one representation.

use super::parse::{DimensionSource, MetadataGroup, tags};
use super::tag::{
    RawTag, TagHint, field_type, write_longs, write_rationals, write_shorts, write_slongs,
    write_srationals,
};
use crate::error::{Error, Result};
use exif::{Context, Field, In, Reader, Value};
use image::{ImageFormat, ImageReader};
use std::collections::BTreeSet;
use std::io::{BufRead, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// Read every metadata group available in `stream`.
///
/// The stream is rewound before each source is read, so it may be positioned
/// anywhere on entry. A file without EXIF data simply yields no EXIF groups.
pub fn read_groups<R: BufRead + Seek>(stream: &mut R, path: &Path) -> Result<Vec<MetadataGroup>> {
    let rewind = |stream: &mut R| {
        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::MetadataRead {
                path: path.to_path_buf(),
                message: format!("Failed to rewind stream: {}", e),
            })
    };

    rewind(stream)?;
    let mut groups = exif_groups(stream, path);

    rewind(stream)?;
    if let Some(group) = dimension_group(stream, path) {
        groups.push(group);
    }

    trace!(?path, count = groups.len(), "Read metadata groups");
    Ok(groups)
}

fn exif_groups<R: BufRead + Seek>(stream: &mut R, path: &Path) -> Vec<MetadataGroup> {
    let exif = match Reader::new().read_from_container(stream) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(?path, error = %e, "No EXIF data");
            return Vec::new();
        }
    };

    let mut shot = Vec::new();
    let mut gps = Vec::new();
    let mut body = Vec::new();
    let mut other = BTreeSet::new();

    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            other.insert(format!("ifd{}", field.ifd_num.index()));
            continue;
        }

        let target = match field.tag.context() {
            Context::Exif => &mut shot,
            Context::Gps => &mut gps,
            Context::Tiff => &mut body,
            context => {
                other.insert(format!("{:?}", context).to_lowercase());
                continue;
            }
        };

        match raw_tag(field) {
            Some(raw) => target.push(raw),
            None => trace!(?path, tag = %field.tag, "Skipping field with unsupported type"),
        }
    }

    let mut groups = Vec::new();
    if !shot.is_empty() {
        groups.push(MetadataGroup::CameraShot(shot));
    }
    if !gps.is_empty() {
        groups.push(MetadataGroup::Gps(gps));
    }
    if !body.is_empty() {
        groups.push(MetadataGroup::CameraBody(body));
    }
    groups.extend(other.into_iter().map(|name| MetadataGroup::Unrecognized { name }));
    groups
}

/// Convert a parsed EXIF field back into the raw layout the decoder reads
fn raw_tag(field: &Field) -> Option<RawTag> {
    let id = field.tag.number();
    let hint = match (field.tag.context(), id) {
        (Context::Gps, tags::GPS_LATITUDE) => Some(TagHint::Latitude),
        (Context::Gps, tags::GPS_LONGITUDE) => Some(TagHint::Longitude),
        _ => None,
    };

    let (type_code, count, bytes) = match &field.value {
        Value::Byte(v) => (field_type::BYTE, v.len(), v.clone()),
        Value::Ascii(strings) => {
            let mut bytes = Vec::new();
            for s in strings {
                bytes.extend_from_slice(s);
                bytes.push(0);
            }
            (field_type::ASCII, bytes.len(), bytes)
        }
        Value::Short(v) => (field_type::SHORT, v.len(), write_shorts(v)),
        Value::Long(v) => (field_type::LONG, v.len(), write_longs(v)),
        Value::SLong(v) => (field_type::SLONG, v.len(), write_slongs(v)),
        Value::Rational(v) => {
            let pairs: Vec<(u32, u32)> = v.iter().map(|r| (r.num, r.denom)).collect();
            (field_type::RATIONAL, v.len(), write_rationals(&pairs, hint))
        }
        Value::SRational(v) => {
            let pairs: Vec<(i32, i32)> = v.iter().map(|r| (r.num, r.denom)).collect();
            (field_type::SRATIONAL, v.len(), write_srationals(&pairs))
        }
        Value::Undefined(v, _) => (field_type::UNDEFINED, v.len(), v.clone()),
        _ => return None,
    };

    Some(RawTag::new(id, type_code, count, bytes))
}

fn dimension_group<R: BufRead + Seek>(stream: &mut R, path: &Path) -> Option<MetadataGroup> {
    let reader = match ImageReader::new(stream).with_guessed_format() {
        Ok(reader) => reader,
        Err(e) => {
            debug!(?path, error = %e, "Could not sniff image container");
            return None;
        }
    };

    let source = match reader.format() {
        Some(ImageFormat::Jpeg) => DimensionSource::Jpeg,
        Some(ImageFormat::Png) => DimensionSource::Png,
        format => {
            trace!(?path, ?format, "No dimension group for container");
            return None;
        }
    };

    match reader.into_dimensions() {
        Ok((width, height)) => Some(MetadataGroup::ImageDimensions {
            source,
            tags: vec![
                RawTag::new(tags::IMAGE_WIDTH, field_type::LONG, 1, write_longs(&[width])),
                RawTag::new(tags::IMAGE_HEIGHT, field_type::LONG, 1, write_longs(&[height])),
            ],
        }),
        Err(e) => {
            debug!(?path, error = %e, "Could not read image dimensions");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse::parse;
    use crate::photo::PhotoRecord;
    use crate::test_helpers::{ascii_field, encoded_image, jpeg_with_exif};
    use chrono::Datelike;
    use exif::Tag;
    use std::io::Cursor;

    #[test]
    fn test_png_yields_only_dimensions() {
        let mut stream = Cursor::new(encoded_image(7, 5, ImageFormat::Png));
        let groups = read_groups(&mut stream, Path::new("a.png")).unwrap();

        assert_eq!(groups.len(), 1);
        let MetadataGroup::ImageDimensions { source, .. } = &groups[0] else {
            panic!("expected a dimension group, got {:?}", groups[0]);
        };
        assert_eq!(*source, DimensionSource::Png);

        let mut photo = PhotoRecord::default();
        parse(&mut photo, &groups).unwrap();
        assert_eq!((photo.width, photo.height), (Some(7), Some(5)));
    }

    #[test]
    fn test_jpeg_exif_round_trip_through_parser() {
        let fields = [
            ascii_field(Tag::Make, "Nikon"),
            ascii_field(Tag::Model, "D850"),
            ascii_field(Tag::DateTimeOriginal, "2016:02:29 12:00:00"),
            ascii_field(Tag::GPSLatitudeRef, "S"),
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![(33, 1).into(), (52, 1).into(), (12, 1).into()]),
            },
            ascii_field(Tag::GPSLongitudeRef, "E"),
            Field {
                tag: Tag::GPSLongitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![(151, 1).into(), (12, 1).into(), (36, 1).into()]),
            },
            Field {
                tag: Tag::FNumber,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![(40, 10).into()]),
            },
            Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![800]),
            },
        ];
        let mut stream = Cursor::new(jpeg_with_exif(16, 8, &fields));
        let groups = read_groups(&mut stream, Path::new("a.jpg")).unwrap();

        let mut photo = PhotoRecord::default();
        parse(&mut photo, &groups).unwrap();

        assert_eq!(photo.make.as_deref(), Some("Nikon"));
        assert_eq!(photo.model.as_deref(), Some("D850"));
        assert_eq!(photo.date_time_original.map(|d| d.day()), Some(29));
        assert!((photo.latitude.unwrap() + 33.87).abs() < 1e-9);
        assert!((photo.longitude.unwrap() - 151.21).abs() < 1e-9);
        assert_eq!(photo.f_number, Some(4.0));
        assert_eq!(photo.iso, Some(800));
        assert_eq!((photo.width, photo.height), (Some(16), Some(8)));
    }

    #[test]
    fn test_non_image_yields_nothing() {
        let mut stream = Cursor::new(b"just some text".to_vec());
        let groups = read_groups(&mut stream, Path::new("notes.txt")).unwrap();
        assert!(groups.is_empty());
    }
}
