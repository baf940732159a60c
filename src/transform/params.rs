//! Image transformation parameter parsing
//!
//! Every recognized query key has a semantic kind, and each kind has a total
//! parser: malformed input degrades to a documented default instead of
//! rejecting the request.
//!
//! ```text
//! /image.jpg?w=800&h=600&fit=cover&bg=white&crop=100,100,10,10
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::IntErrorKind;

use super::colors::named_color;
use super::format::ImageType;
use super::options::{Angle, ColorSpec, CropSpec, FitMode};

/// Semantic type of a query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Orientation,
    Int,
    Float,
    Bool,
    Color,
    Fit,
    Format,
    Crop,
}

/// A parsed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Orientation(Angle),
    Int(u32),
    Float(f64),
    Bool(bool),
    Color(ColorSpec),
    Fit(FitMode),
    Format(ImageType),
    Crop(CropSpec),
}

/// Recognized query keys and their kinds
pub const ALLOWED_PARAMS: &[(&str, ParamKind)] = &[
    ("or", ParamKind::Orientation),
    ("w", ParamKind::Int),
    ("h", ParamKind::Int),
    ("fit", ParamKind::Fit),
    ("dpr", ParamKind::Float),
    ("bri", ParamKind::Int),
    ("con", ParamKind::Int),
    ("gam", ParamKind::Float),
    ("sharp", ParamKind::Int),
    ("blur", ParamKind::Int),
    ("pixel", ParamKind::Int),
    ("bg", ParamKind::Color),
    ("q", ParamKind::Int),
    ("fm", ParamKind::Format),
    ("crop", ParamKind::Crop),
];

/// One parsed value per key of [`ALLOWED_PARAMS`]
pub type ParsedParams = HashMap<&'static str, ParamValue>;

/// Parse every recognized key from a query map
///
/// Absent keys are parsed as the empty string, so the result always holds
/// exactly one value per schema key.
pub fn parse_params(query: &HashMap<String, String>) -> ParsedParams {
    ALLOWED_PARAMS
        .iter()
        .map(|&(key, kind)| {
            let raw = query.get(key).map(String::as_str).unwrap_or("");
            (key, parse_param(raw, kind))
        })
        .collect()
}

/// Parse a single raw value according to its kind
pub fn parse_param(raw: &str, kind: ParamKind) -> ParamValue {
    match kind {
        ParamKind::Orientation => ParamValue::Orientation(parse_orientation(raw)),
        ParamKind::Int => ParamValue::Int(parse_int(raw)),
        ParamKind::Float => ParamValue::Float(parse_float(raw)),
        ParamKind::Bool => ParamValue::Bool(parse_bool(raw)),
        ParamKind::Color => ParamValue::Color(parse_color(raw)),
        ParamKind::Fit => ParamValue::Fit(parse_fit(raw)),
        ParamKind::Format => ParamValue::Format(parse_format(raw)),
        ParamKind::Crop => ParamValue::Crop(parse_crop(raw)),
    }
}

/// Split a raw query string into a key → value map
///
/// Values are percent-decoded, `+` decodes to a space, and the first
/// occurrence of a repeated key wins.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for pair in query.trim_start_matches('?').split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        values
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }

    values
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    let decoded = urlencoding::decode(&raw).map(Cow::into_owned);
    decoded.unwrap_or(raw)
}

/// Non-negative integer: the absolute float value rounded half up
pub fn parse_int(raw: &str) -> u32 {
    (parse_float(raw) + 0.5).floor() as u32
}

/// Non-negative float: the absolute value, 0.0 when unparseable
pub fn parse_float(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0)
}

pub fn parse_bool(raw: &str) -> bool {
    matches!(raw, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Color from a keyword, an `r,g,b` triple, or a (short) hex code
pub fn parse_color(raw: &str) -> ColorSpec {
    if raw.is_empty() {
        return ColorSpec::default();
    }

    if let Some(rgb) = named_color(raw) {
        return ColorSpec::from(rgb);
    }

    if raw.contains(',') {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 3 {
            return ColorSpec::default();
        }
        return ColorSpec::new(parts.iter().map(|part| parse_component(part)).collect());
    }

    let digits = raw.strip_prefix('#').unwrap_or(raw).as_bytes();
    let expanded: Vec<u8> = if digits.len() == 3 {
        digits.iter().flat_map(|&digit| [digit, digit]).collect()
    } else {
        digits.to_vec()
    };

    match hex::decode(expanded) {
        Ok(bytes) if bytes.len() >= 3 => ColorSpec::new(bytes[..3].to_vec()),
        _ => ColorSpec::default(),
    }
}

/// One decimal color channel, clamped to 0-255
fn parse_component(raw: &str) -> u8 {
    match raw.trim().parse::<u64>() {
        Ok(value) => value.min(255) as u8,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => 255,
        Err(_) => 0,
    }
}

pub fn parse_orientation(raw: &str) -> Angle {
    raw.parse().unwrap_or_default()
}

pub fn parse_fit(raw: &str) -> FitMode {
    raw.parse().unwrap_or_default()
}

pub fn parse_format(raw: &str) -> ImageType {
    ImageType::from_extension(raw)
}

/// `width,height,x,y`; anything else yields the sentinel
pub fn parse_crop(raw: &str) -> CropSpec {
    let fields: Vec<&str> = raw.split(',').collect();
    if fields.len() != 4 {
        return CropSpec::NONE;
    }

    let parsed: Result<Vec<i32>, _> = fields.iter().map(|field| field.parse::<i32>()).collect();
    match parsed.as_deref() {
        Ok(&[width, height, x, y]) => CropSpec {
            width,
            height,
            x,
            y,
        },
        _ => CropSpec::NONE,
    }
}
