//! Tag value decoding
//!
//! A raw tag is a `(type code, element count, bytes)` triple. [`decode`] turns
//! it into a typed [`TagValue`]. The byte layout it reads is not plain TIFF:
//!
//! - `SHORT`/`LONG` buffers are reversed as a whole on little-endian hosts
//!   before native-endian words are read.
//! - `RATIONAL` buffers are reversed before every element on little-endian
//!   hosts and read denominator first, except for GPS latitude/longitude which
//!   are read numerator first without reversal.
//! - `SLONG`/`SRATIONAL` are read native-endian with no reversal.
//!
//! GPS decoding downstream depends on exactly this behavior. The `write_*`
//! functions produce buffers in the same layout so the container reader can
//! hand values to the decoder.

use super::rational::Rational;
use thiserror::Error;

/// TIFF field type codes
pub mod field_type {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const UNDEFINED: u16 = 7;
    pub const SLONG: u16 = 9;
    pub const SRATIONAL: u16 = 10;
}

/// Identity of the tag being decoded, where it changes the byte layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagHint {
    Latitude,
    Longitude,
}

/// A decoded tag value.
///
/// Arrays of exactly one element are always returned as the scalar variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(u8),
    Bytes(Vec<u8>),
    Ascii(String),
    Short(u16),
    Shorts(Vec<u16>),
    Long(u32),
    Longs(Vec<u32>),
    SLong(i32),
    SLongs(Vec<i32>),
    Rational(Rational),
    Rationals(Vec<Rational>),
    Undefined(Vec<u8>),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// First rational of a scalar or array value
    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            TagValue::Rational(r) => Some(*r),
            TagValue::Rationals(rs) => rs.first().copied(),
            _ => None,
        }
    }

    /// All rationals of the value; a scalar becomes a one-element slice
    pub fn as_rationals(&self) -> Option<&[Rational]> {
        match self {
            TagValue::Rational(r) => Some(std::slice::from_ref(r)),
            TagValue::Rationals(rs) => Some(rs),
            _ => None,
        }
    }

    /// First element of any integer value, widened to `i64`
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TagValue::Byte(b) => Some(i64::from(*b)),
            TagValue::Short(v) => Some(i64::from(*v)),
            TagValue::Shorts(vs) => vs.first().map(|v| i64::from(*v)),
            TagValue::Long(v) => Some(i64::from(*v)),
            TagValue::Longs(vs) => vs.first().map(|v| i64::from(*v)),
            TagValue::SLong(v) => Some(i64::from(*v)),
            TagValue::SLongs(vs) => vs.first().map(|v| i64::from(*v)),
            _ => None,
        }
    }

    /// Floating point view of a rational or integer value
    pub fn as_f64(&self) -> Option<f64> {
        self.as_rational()
            .map(|r| r.to_f64())
            .or_else(|| self.as_integer().map(|v| v as f64))
    }
}

/// Errors raised while decoding a raw tag
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("tag of type {type_code} declares {count} elements but holds only {len} bytes")]
    Truncated {
        type_code: u16,
        count: usize,
        len: usize,
    },
}

/// A raw tag as found in a metadata group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    /// Tag number within its IFD
    pub id: u16,
    pub type_code: u16,
    /// Declared number of elements (bytes for `ASCII`)
    pub count: usize,
    pub bytes: Vec<u8>,
}

impl RawTag {
    pub fn new(id: u16, type_code: u16, count: usize, bytes: Vec<u8>) -> Self {
        Self {
            id,
            type_code,
            count,
            bytes,
        }
    }

    pub fn decode(&self, hint: Option<TagHint>) -> Result<TagValue, DecodeError> {
        decode(self.type_code, self.count, &self.bytes, hint)
    }
}

/// Decode a raw tag buffer into a typed value
pub fn decode(
    type_code: u16,
    count: usize,
    bytes: &[u8],
    hint: Option<TagHint>,
) -> Result<TagValue, DecodeError> {
    match type_code {
        field_type::ASCII => {
            let end = bytes.len().saturating_sub(1);
            let text = bytes[..end]
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect();
            Ok(TagValue::Ascii(text))
        }
        field_type::SHORT => {
            let bytes = reversed_on_little_endian(bytes);
            let words: Vec<u16> = read_words(type_code, count, &bytes, 2)?
                .map(|w| u16::from_ne_bytes([w[0], w[1]]))
                .collect();
            Ok(collapse(words, TagValue::Short, TagValue::Shorts))
        }
        field_type::LONG => {
            let bytes = reversed_on_little_endian(bytes);
            let words: Vec<u32> = read_words(type_code, count, &bytes, 4)?
                .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
                .collect();
            Ok(collapse(words, TagValue::Long, TagValue::Longs))
        }
        field_type::SLONG => {
            let words: Vec<i32> = read_words(type_code, count, bytes, 4)?
                .map(|w| i32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
                .collect();
            Ok(collapse(words, TagValue::SLong, TagValue::SLongs))
        }
        field_type::RATIONAL => {
            let values = read_rationals(count, bytes, hint)?;
            Ok(collapse(values, TagValue::Rational, TagValue::Rationals))
        }
        field_type::SRATIONAL => {
            let values: Vec<Rational> = read_words(type_code, count, bytes, 8)?
                .map(|w| {
                    let num = i32::from_ne_bytes([w[0], w[1], w[2], w[3]]);
                    let den = i32::from_ne_bytes([w[4], w[5], w[6], w[7]]);
                    Rational::new(i64::from(num), i64::from(den))
                })
                .collect();
            Ok(collapse(values, TagValue::Rational, TagValue::Rationals))
        }
        field_type::BYTE => Ok(match bytes {
            [b] => TagValue::Byte(*b),
            _ => TagValue::Bytes(bytes.to_vec()),
        }),
        // UNDEFINED and every type without its own variant
        _ => Ok(match bytes {
            [b] => TagValue::Byte(*b),
            _ => TagValue::Undefined(bytes.to_vec()),
        }),
    }
}

fn collapse<T>(
    mut values: Vec<T>,
    scalar: impl FnOnce(T) -> TagValue,
    array: impl FnOnce(Vec<T>) -> TagValue,
) -> TagValue {
    if values.len() == 1
        && let Some(value) = values.pop()
    {
        return scalar(value);
    }
    array(values)
}

fn reversed_on_little_endian(bytes: &[u8]) -> Vec<u8> {
    let mut bytes = bytes.to_vec();
    if cfg!(target_endian = "little") {
        bytes.reverse();
    }
    bytes
}

fn read_words<'a>(
    type_code: u16,
    count: usize,
    bytes: &'a [u8],
    size: usize,
) -> Result<std::slice::ChunksExact<'a, u8>, DecodeError> {
    let needed = check_len(type_code, count, bytes, size)?;
    Ok(bytes[..needed].chunks_exact(size))
}

/// Bytes needed for `count` elements of `size`, if the buffer holds them
fn check_len(
    type_code: u16,
    count: usize,
    bytes: &[u8],
    size: usize,
) -> Result<usize, DecodeError> {
    let needed = count.checked_mul(size).unwrap_or(usize::MAX);
    if needed > bytes.len() {
        return Err(DecodeError::Truncated {
            type_code,
            count,
            len: bytes.len(),
        });
    }
    Ok(needed)
}

fn read_rationals(
    count: usize,
    bytes: &[u8],
    hint: Option<TagHint>,
) -> Result<Vec<Rational>, DecodeError> {
    check_len(field_type::RATIONAL, count, bytes, 8)?;

    let word = |buf: &[u8], at: usize| {
        u32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    };
    let mut buf = bytes.to_vec();
    let mut values = Vec::with_capacity(count);

    for i in 0..count {
        let at = i * 8;
        let (num, den) = if cfg!(target_endian = "little") && hint.is_none() {
            // The whole buffer flips once per element.
            buf.reverse();
            (word(&buf, at + 4), word(&buf, at))
        } else {
            (word(&buf, at), word(&buf, at + 4))
        };
        values.push(Rational::from_unsigned(num, den));
    }

    Ok(values)
}

/// `ASCII` buffer with its terminating NUL
pub fn write_ascii(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend(text.bytes());
    bytes.push(0);
    bytes
}

pub fn write_shorts(values: &[u16]) -> Vec<u8> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    reversed_on_little_endian(&bytes)
}

pub fn write_longs(values: &[u32]) -> Vec<u8> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    reversed_on_little_endian(&bytes)
}

pub fn write_slongs(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// `RATIONAL` buffer from `(numerator, denominator)` pairs.
///
/// Without a hint on a little-endian host each element is written so that a
/// single-element buffer decodes back to the same value; the decoder's
/// per-element reversal means longer unhinted arrays do not.
pub fn write_rationals(values: &[(u32, u32)], hint: Option<TagHint>) -> Vec<u8> {
    let reversed = cfg!(target_endian = "little") && hint.is_none();
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for &(num, den) in values {
        if reversed {
            let mut element = Vec::with_capacity(8);
            element.extend(den.to_ne_bytes());
            element.extend(num.to_ne_bytes());
            element.reverse();
            bytes.extend(element);
        } else {
            bytes.extend(num.to_ne_bytes());
            bytes.extend(den.to_ne_bytes());
        }
    }
    bytes
}

pub fn write_srationals(values: &[(i32, i32)]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|(num, den)| num.to_ne_bytes().into_iter().chain(den.to_ne_bytes()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_element_collapses_to_scalar() {
        assert_eq!(
            decode(field_type::BYTE, 1, &[7], None).unwrap(),
            TagValue::Byte(7)
        );
        assert_eq!(
            decode(field_type::UNDEFINED, 1, &[9], None).unwrap(),
            TagValue::Byte(9)
        );
        assert_eq!(
            decode(field_type::SHORT, 1, &write_shorts(&[400]), None).unwrap(),
            TagValue::Short(400)
        );
        assert_eq!(
            decode(field_type::LONG, 1, &write_longs(&[4000]), None).unwrap(),
            TagValue::Long(4000)
        );
        assert_eq!(
            decode(field_type::SLONG, 1, &write_slongs(&[-12]), None).unwrap(),
            TagValue::SLong(-12)
        );
        assert_eq!(
            decode(field_type::RATIONAL, 1, &write_rationals(&[(28, 10)], None), None).unwrap(),
            TagValue::Rational(Rational::new(28, 10))
        );
        assert_eq!(
            decode(field_type::SRATIONAL, 1, &write_srationals(&[(-1, 3)]), None).unwrap(),
            TagValue::Rational(Rational::new(-1, 3))
        );
    }

    #[test]
    fn test_ascii_drops_trailing_byte() {
        assert_eq!(
            decode(field_type::ASCII, 6, b"Canon\0", None).unwrap(),
            TagValue::Ascii("Canon".into())
        );
        assert_eq!(
            decode(field_type::ASCII, 0, b"", None).unwrap(),
            TagValue::Ascii(String::new())
        );
        assert_eq!(
            decode(field_type::ASCII, 6, &write_ascii("Nikon"), None).unwrap(),
            TagValue::Ascii("Nikon".into())
        );
    }

    #[test]
    fn test_ascii_replaces_non_ascii_bytes() {
        assert_eq!(
            decode(field_type::ASCII, 6, b"Caf\xc3\xa9\0", None).unwrap(),
            TagValue::Ascii("Caf??".into())
        );
    }

    #[test]
    fn test_byte_arrays() {
        assert_eq!(
            decode(field_type::BYTE, 3, &[1, 2, 3], None).unwrap(),
            TagValue::Bytes(vec![1, 2, 3])
        );
        assert_eq!(
            decode(field_type::UNDEFINED, 4, b"0230", None).unwrap(),
            TagValue::Undefined(b"0230".to_vec())
        );
        // Types without a variant of their own fall back to raw bytes
        assert_eq!(
            decode(12, 2, &[1, 2], None).unwrap(),
            TagValue::Undefined(vec![1, 2])
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_shorts_read_reversed_buffer() {
        // One short reads big-endian
        assert_eq!(
            decode(field_type::SHORT, 1, &[0x12, 0x34], None).unwrap(),
            TagValue::Short(0x1234)
        );
        // Reversing the whole buffer also reverses element order
        assert_eq!(
            decode(field_type::SHORT, 2, &[0x00, 0x01, 0x00, 0x02], None).unwrap(),
            TagValue::Shorts(vec![2, 1])
        );
        assert_eq!(
            decode(field_type::LONG, 1, &[0x00, 0x00, 0x01, 0x00], None).unwrap(),
            TagValue::Long(256)
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_slong_is_not_reversed() {
        assert_eq!(
            decode(field_type::SLONG, 1, &[0x00, 0x01, 0x00, 0x00], None).unwrap(),
            TagValue::SLong(256)
        );
        assert_eq!(
            decode(field_type::SLONG, 2, &[0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0], None).unwrap(),
            TagValue::SLongs(vec![-1, 2])
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_rational_layout_depends_on_hint() {
        let bytes = [0, 0, 0, 10, 0, 0, 0, 4];
        // Unhinted rationals read big-endian numerator then denominator
        assert_eq!(
            decode(field_type::RATIONAL, 1, &bytes, None).unwrap(),
            TagValue::Rational(Rational::new(10, 4))
        );

        let gps = [1, 0, 0, 0, 1, 0, 0, 0, 30, 0, 0, 0, 1, 0, 0, 0, 45, 0, 0, 0, 2, 0, 0, 0];
        assert_eq!(
            decode(field_type::RATIONAL, 3, &gps, Some(TagHint::Latitude)).unwrap(),
            TagValue::Rationals(vec![
                Rational::new(1, 1),
                Rational::new(30, 1),
                Rational::new(45, 2),
            ])
        );
    }

    #[test]
    fn test_gps_rationals_written_and_read() {
        let triple = [(51, 1), (30, 1), (2660, 100)];
        let bytes = write_rationals(&triple, Some(TagHint::Longitude));
        let value = decode(field_type::RATIONAL, 3, &bytes, Some(TagHint::Longitude)).unwrap();
        assert_eq!(
            value.as_rationals().unwrap(),
            &[
                Rational::new(51, 1),
                Rational::new(30, 1),
                Rational::new(2660, 100)
            ]
        );
    }

    #[test]
    fn test_truncated_buffer_is_an_error() {
        assert_eq!(
            decode(field_type::LONG, 2, &[0, 0, 0, 1], None),
            Err(DecodeError::Truncated {
                type_code: field_type::LONG,
                count: 2,
                len: 4
            })
        );
        assert!(decode(field_type::RATIONAL, 1, &[0; 4], None).is_err());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(TagValue::Shorts(vec![100, 200]).as_integer(), Some(100));
        assert_eq!(TagValue::Rational(Rational::new(1, 2)).as_f64(), Some(0.5));
        assert_eq!(TagValue::Long(3).as_f64(), Some(3.0));
        assert_eq!(TagValue::Ascii("N".into()).as_str(), Some("N"));
        assert_eq!(TagValue::Ascii("N".into()).as_integer(), None);
        assert_eq!(
            TagValue::Rational(Rational::new(1, 2)).as_rationals().map(|r| r.len()),
            Some(1)
        );
    }
}
