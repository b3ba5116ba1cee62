//! Conversions from raw EXIF representations to display values

use super::rational::Rational;
use crate::error::{Error, Result};

/// Convert a degrees/minutes/seconds triple and hemisphere reference into
/// signed decimal degrees.
///
/// Returns `Ok(None)` when the triple or reference is missing or the triple
/// does not have exactly three elements. A reference other than `N`, `E`, `S`
/// or `W` (any case) is an error. The degree component keeps its own sign.
pub fn dms_to_decimal_degrees(
    dms: Option<&[Rational]>,
    reference: Option<&str>,
) -> Result<Option<f64>> {
    let (Some([degrees, minutes, seconds]), Some(reference)) = (dms, reference) else {
        return Ok(None);
    };

    let sign = match reference.to_ascii_uppercase().as_str() {
        "N" | "E" => 1.0,
        "S" | "W" => -1.0,
        _ => return Err(Error::InvalidGpsReference(reference.to_string())),
    };

    let value = degrees.to_f64() + minutes.to_f64() / 60.0 + seconds.to_f64() / 3600.0;
    Ok(Some(value * sign))
}

/// Human readable shutter speed from an APEX time value.
///
/// Values up to 1 are whole or fractional seconds rounded to one decimal
/// (`"0.5 sec"`), larger values are fractions of a second (`"1/250 sec"`).
pub fn compute_shutter_speed(apex_value: f32) -> String {
    if apex_value <= 1.0 {
        let seconds = 1.0 / 2f64.powf(f64::from(apex_value));
        let rounded = ((seconds * 10.0).round() / 10.0) as f32;
        format!("{} sec", rounded)
    } else {
        let denominator = 2f64.powf(f64::from(apex_value)) as i64;
        format!("1/{} sec", denominator)
    }
}
