use std::f64::consts::PI;

use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

use crate::radar::SPEED_OF_LIGHT;

pub fn wavelength(f: f64) -> f64 {
    SPEED_OF_LIGHT / f
}

/// Buffers an object carrying a `"type"` tag. Yields `None` when the tag is
/// missing or is not a string, so the caller can fall back to its unknown
/// variant.
pub(crate) fn tagged_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Value>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Err(D::Error::custom(format!("expected a tagged object, found {}", value)));
    }
    let tagged = matches!(value.get("type"), Some(Value::String(_)));
    Ok(tagged.then_some(value))
}

// Power ratio to decibels.
pub fn decibels(x: f64) -> f64 {
    10. * x.log10()
}

pub fn decibels_or_else(x: f64, or: f64) -> f64 {
    if x <= 0. {
        or
    } else {
        10. * x.log10()
    }
}

// Voltage magnitude to decibels, i.e. 10 log10(|v|^2).
pub fn voltage_decibels(x: f64) -> f64 {
    20. * x.abs().log10()
}

/// Wraps a phase in radians into the interval (-π, π].
pub fn wrap_phase(x: f64) -> f64 {
    PI - (PI - x).rem_euclid(2. * PI)
}

/// Index of the first element of `axis` closest to `value`.
///
/// Nearest-bin quantization: there is no interpolation onto the grid.
pub fn nearest_index<'a>(axis: impl IntoIterator<Item = &'a f64>, value: f64) -> Option<usize> {
    axis.into_iter()
        .map(|x| (x - value).abs())
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|x| x.0)
}
