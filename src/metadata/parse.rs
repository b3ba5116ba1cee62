//! Dispatch of metadata groups onto a [`PhotoRecord`]

use super::convert::{compute_shutter_speed, dms_to_decimal_degrees};
use super::tag::{RawTag, TagHint, TagValue};
use crate::error::Result;
use crate::photo::{PhotoRecord, fill};
use crate::time::parse_exif_datetime;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Tag numbers consumed by the parser
pub mod tags {
    pub const GPS_LATITUDE_REF: u16 = 0x0001;
    pub const GPS_LATITUDE: u16 = 0x0002;
    pub const GPS_LONGITUDE_REF: u16 = 0x0003;
    pub const GPS_LONGITUDE: u16 = 0x0004;
    pub const GPS_ALTITUDE_REF: u16 = 0x0005;
    pub const GPS_ALTITUDE: u16 = 0x0006;

    pub const IMAGE_WIDTH: u16 = 0x0100;
    pub const IMAGE_HEIGHT: u16 = 0x0101;
    pub const MAKE: u16 = 0x010F;
    pub const MODEL: u16 = 0x0110;
    pub const DATE_TIME: u16 = 0x0132;

    pub const F_NUMBER: u16 = 0x829D;
    pub const ISO: u16 = 0x8827;
    pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
    pub const SHUTTER_SPEED: u16 = 0x9201;
    pub const FOCAL_LENGTH: u16 = 0x920A;
}

/// Container that reported an image size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionSource {
    Jpeg,
    Png,
}

/// A semantic group of raw tags read from one file
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataGroup {
    /// GPS IFD: coordinates and altitude
    Gps(Vec<RawTag>),
    /// IFD0: camera make, model and file date/time
    CameraBody(Vec<RawTag>),
    /// Exif sub-IFD: exposure settings and original capture time
    CameraShot(Vec<RawTag>),
    /// Pixel size from the image container
    ImageDimensions {
        source: DimensionSource,
        tags: Vec<RawTag>,
    },
    /// Anything else the container reported
    Unrecognized { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKind {
    Gps,
    CameraBody,
    CameraShot,
    ImageDimensions(DimensionSource),
    Unrecognized,
}

impl MetadataGroup {
    fn kind(&self) -> GroupKind {
        match self {
            MetadataGroup::Gps(_) => GroupKind::Gps,
            MetadataGroup::CameraBody(_) => GroupKind::CameraBody,
            MetadataGroup::CameraShot(_) => GroupKind::CameraShot,
            MetadataGroup::ImageDimensions { source, .. } => GroupKind::ImageDimensions(*source),
            MetadataGroup::Unrecognized { .. } => GroupKind::Unrecognized,
        }
    }
}

/// Fill `record` from `groups`.
///
/// Only the first group of each kind is consulted and fields already set on
/// the record are left alone. Unrecognized groups are skipped. Fails only
/// when a GPS reference is not one of `N`, `E`, `S`, `W`.
pub fn parse(record: &mut PhotoRecord, groups: &[MetadataGroup]) -> Result<()> {
    let mut seen = HashSet::new();

    for group in groups {
        if !seen.insert(group.kind()) && group.kind() != GroupKind::Unrecognized {
            trace!(name = %record.name, kind = ?group.kind(), "Ignoring repeated metadata group");
            continue;
        }

        match group {
            MetadataGroup::Gps(tags) => parse_gps(record, tags)?,
            MetadataGroup::CameraBody(tags) => parse_camera_body(record, tags),
            MetadataGroup::CameraShot(tags) => parse_camera_shot(record, tags),
            MetadataGroup::ImageDimensions { tags, .. } => parse_dimensions(record, tags),
            MetadataGroup::Unrecognized { name } => {
                debug!(photo = %record.name, group = %name, "Skipping unrecognized metadata group");
            }
        }
    }

    Ok(())
}

/// Decoded value of the first tag with `id`; undecodable tags count as absent
fn lookup(tags: &[RawTag], id: u16, hint: Option<TagHint>) -> Option<TagValue> {
    let raw = tags.iter().find(|t| t.id == id)?;
    match raw.decode(hint) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(tag = id, error = %e, "Ignoring undecodable tag");
            None
        }
    }
}

fn lookup_text(tags: &[RawTag], id: u16) -> Option<String> {
    lookup(tags, id, None)?
        .as_str()
        .map(|s| s.trim_end_matches(['\0', ' ']).to_string())
}

fn parse_gps(record: &mut PhotoRecord, tags: &[RawTag]) -> Result<()> {
    let latitude_ref = lookup_text(tags, tags::GPS_LATITUDE_REF);
    let latitude = lookup(tags, tags::GPS_LATITUDE, Some(TagHint::Latitude));
    let longitude_ref = lookup_text(tags, tags::GPS_LONGITUDE_REF);
    let longitude = lookup(tags, tags::GPS_LONGITUDE, Some(TagHint::Longitude));

    let latitude = dms_to_decimal_degrees(
        latitude.as_ref().and_then(TagValue::as_rationals),
        latitude_ref.as_deref(),
    )?;
    let longitude = dms_to_decimal_degrees(
        longitude.as_ref().and_then(TagValue::as_rationals),
        longitude_ref.as_deref(),
    )?;

    if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
        fill(&mut record.latitude, latitude);
        fill(&mut record.longitude, longitude);
    }

    // Altitude is only kept together with its reference
    let altitude_ref = lookup(tags, tags::GPS_ALTITUDE_REF, None).and_then(|v| v.as_integer());
    let altitude = lookup(tags, tags::GPS_ALTITUDE, None).and_then(|v| v.as_f64());
    if let (Some(reference), Some(altitude)) = (altitude_ref, altitude) {
        let reference = if reference == 0 {
            "Sea level"
        } else {
            "Below sea level"
        };
        fill(&mut record.altitude_reference, reference.to_string());
        fill(&mut record.altitude, altitude);
    }

    Ok(())
}

fn parse_camera_body(record: &mut PhotoRecord, tags: &[RawTag]) {
    if let Some(make) = lookup_text(tags, tags::MAKE) {
        fill(&mut record.make, make);
    }
    if let Some(model) = lookup_text(tags, tags::MODEL) {
        fill(&mut record.model, model);
    }
    if let Some(date_time) = lookup_text(tags, tags::DATE_TIME).and_then(|s| parse_exif_datetime(&s)) {
        fill(&mut record.date_time, date_time);
    }
}

fn parse_camera_shot(record: &mut PhotoRecord, tags: &[RawTag]) {
    if let Some(f_number) = lookup(tags, tags::F_NUMBER, None).and_then(|v| v.as_f64()) {
        fill(&mut record.f_number, f_number as f32);
    }
    if let Some(iso) = lookup(tags, tags::ISO, None)
        .and_then(|v| v.as_integer())
        .and_then(|v| u16::try_from(v).ok())
    {
        fill(&mut record.iso, iso);
    }
    if let Some(apex) = lookup(tags, tags::SHUTTER_SPEED, None).and_then(|v| v.as_f64()) {
        fill(&mut record.shutter_speed, compute_shutter_speed(apex as f32));
    }
    if let Some(original) =
        lookup_text(tags, tags::DATE_TIME_ORIGINAL).and_then(|s| parse_exif_datetime(&s))
    {
        fill(&mut record.date_time_original, original);
    }
    if let Some(focal_length) = lookup(tags, tags::FOCAL_LENGTH, None).and_then(|v| v.as_f64()) {
        fill(&mut record.focal_length, focal_length as f32);
    }
}

fn parse_dimensions(record: &mut PhotoRecord, tags: &[RawTag]) {
    let size = |id| {
        lookup(tags, id, None)
            .and_then(|v| v.as_integer())
            .and_then(|v| u32::try_from(v).ok())
    };
    if let Some(height) = size(tags::IMAGE_HEIGHT) {
        fill(&mut record.height, height);
    }
    if let Some(width) = size(tags::IMAGE_WIDTH) {
        fill(&mut record.width, width);
    }
}
