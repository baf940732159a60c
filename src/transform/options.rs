//! Typed transformation options
//!
//! [`TransformOptions`] is assembled once per request from the parsed query
//! and never mutated afterwards. Every field carries a defined value; absent
//! or malformed parameters become defaults.

use std::collections::HashMap;
use std::str::FromStr;

use super::format::ImageType;
use super::params::{parse_params, parse_query_string, ParamValue, ParsedParams};

/// Rotation angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Angle {
    #[default]
    D0,
    D90,
    D180,
    D270,
}

impl Angle {
    pub fn degrees(&self) -> u16 {
        match self {
            Angle::D0 => 0,
            Angle::D90 => 90,
            Angle::D180 => 180,
            Angle::D270 => 270,
        }
    }
}

impl FromStr for Angle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Angle::D0),
            "90" => Ok(Angle::D90),
            "180" => Ok(Angle::D180),
            "270" => Ok(Angle::D270),
            _ => Err(format!("unknown orientation: {}", s)),
        }
    }
}

/// How to fit the image within target dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale to fit within dimensions, preserving aspect ratio (default)
    #[default]
    Contain,
    /// Scale to fill target dimensions, cropping the overflow
    Cover,
    /// Stretch to fill exactly (may distort)
    Fill,
    /// Like contain, but never enlarge
    Inside,
    /// Scale to cover, may exceed target
    Outside,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            "fill" => Ok(FitMode::Fill),
            "inside" => Ok(FitMode::Inside),
            "outside" => Ok(FitMode::Outside),
            _ => Err(format!("unknown fit mode: {}", s)),
        }
    }
}

/// Requested crop rectangle
///
/// All fields `-1` ([`CropSpec::NONE`]) means no crop was requested or the
/// input was malformed; the two cases are not distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSpec {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl CropSpec {
    pub const NONE: CropSpec = CropSpec {
        width: -1,
        height: -1,
        x: -1,
        y: -1,
    };

    /// A crop the engine can act on: positive size and non-negative origin
    pub fn is_applicable(&self) -> bool {
        self.width > 0 && self.height > 0 && self.x >= 0 && self.y >= 0
    }
}

impl Default for CropSpec {
    fn default() -> Self {
        Self::NONE
    }
}

/// Color with zero to three byte components; empty means unset
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorSpec(Vec<u8>);

impl ColorSpec {
    pub fn new(components: Vec<u8>) -> Self {
        debug_assert!(components.len() <= 3);
        Self(components)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The color as RGB, when all three components are present
    pub fn rgb(&self) -> Option<[u8; 3]> {
        match self.0.as_slice() {
            &[r, g, b] => Some([r, g, b]),
            _ => None,
        }
    }
}

impl From<[u8; 3]> for ColorSpec {
    fn from(rgb: [u8; 3]) -> Self {
        Self(rgb.to_vec())
    }
}

/// Image transformation options for one request
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    // === Resize ===
    pub width: u32,
    pub height: u32,
    /// Device pixel ratio; 0 means unset
    pub dpr: f64,
    pub fit: FitMode,

    // === Format & Quality ===
    /// Output quality; 0 means engine default
    pub quality: u32,
    /// Output format; [`ImageType::Unknown`] keeps the source format
    pub format: ImageType,

    // === Geometry ===
    pub orientation: Angle,
    pub crop: CropSpec,

    // === Effects ===
    pub background: ColorSpec,
    pub brightness: u32,
    pub contrast: u32,
    pub gamma: f64,
    pub sharpen: u32,
    pub blur: u32,
    pub pixelate: u32,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            dpr: 0.0,
            fit: FitMode::Contain,
            quality: 0,
            format: ImageType::Unknown,
            orientation: Angle::D0,
            crop: CropSpec::NONE,
            background: ColorSpec::default(),
            brightness: 0,
            contrast: 0,
            gamma: 0.0,
            sharpen: 0,
            blur: 0,
            pixelate: 0,
        }
    }
}

impl TransformOptions {
    /// Parse from a raw query string (e.g., `w=800&h=600&fit=cover`)
    pub fn from_query_string(query: &str) -> Self {
        Self::from_query(&parse_query_string(query))
    }

    /// Parse from query parameters
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self::from_params(&parse_params(query))
    }

    /// Assemble options from a fully parsed parameter map
    ///
    /// # Panics
    ///
    /// Panics if a schema key is missing or carries a value of the wrong
    /// kind. [`parse_params`] always produces a complete, well-typed map, so
    /// this only fires on a parser defect, never on request input.
    pub fn from_params(params: &ParsedParams) -> Self {
        Self {
            width: int_param(params, "w"),
            height: int_param(params, "h"),
            dpr: float_param(params, "dpr"),
            fit: match params.get("fit") {
                Some(ParamValue::Fit(fit)) => *fit,
                other => schema_mismatch("fit", "fit", other),
            },
            quality: int_param(params, "q"),
            format: match params.get("fm") {
                Some(ParamValue::Format(format)) => *format,
                other => schema_mismatch("fm", "format", other),
            },
            orientation: match params.get("or") {
                Some(ParamValue::Orientation(angle)) => *angle,
                other => schema_mismatch("or", "orientation", other),
            },
            crop: match params.get("crop") {
                Some(ParamValue::Crop(crop)) => *crop,
                other => schema_mismatch("crop", "crop", other),
            },
            background: match params.get("bg") {
                Some(ParamValue::Color(color)) => color.clone(),
                other => schema_mismatch("bg", "color", other),
            },
            brightness: int_param(params, "bri"),
            contrast: int_param(params, "con"),
            gamma: float_param(params, "gam"),
            sharpen: int_param(params, "sharp"),
            blur: int_param(params, "blur"),
            pixelate: int_param(params, "pixel"),
        }
    }

    /// Check if any transformations are requested
    pub fn has_transformations(&self) -> bool {
        *self != Self::default()
    }
}

fn int_param(params: &ParsedParams, key: &str) -> u32 {
    match params.get(key) {
        Some(ParamValue::Int(value)) => *value,
        other => schema_mismatch(key, "int", other),
    }
}

fn float_param(params: &ParsedParams, key: &str) -> f64 {
    match params.get(key) {
        Some(ParamValue::Float(value)) => *value,
        other => schema_mismatch(key, "float", other),
    }
}

fn schema_mismatch(key: &str, expected: &str, found: Option<&ParamValue>) -> ! {
    panic!(
        "parameter schema mismatch for '{}': expected {}, found {:?}",
        key, expected, found
    )
}
