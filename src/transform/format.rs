//! Image type codes and pure format predicates
//!
//! These are the engine-side views of a buffer: which image type a byte
//! buffer holds, whether it is an SVG document, and how user-supplied format
//! names map onto type codes.

use regex::bytes::Regex;
use std::sync::OnceLock;

/// Image type code understood by the transformation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ImageType {
    /// Unknown or unset; as an output format it means "keep the source type"
    #[default]
    Unknown,
    Jpeg,
    Webp,
    Png,
    Tiff,
    Gif,
    Pdf,
    Svg,
    Magick,
    Heif,
    Avif,
}

impl ImageType {
    /// Map a file extension (as used by the `fm` parameter) to a type code
    ///
    /// Unrecognized extensions map to [`ImageType::Unknown`].
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageType::Jpeg,
            "webp" => ImageType::Webp,
            "png" => ImageType::Png,
            "tif" | "tiff" => ImageType::Tiff,
            "gif" => ImageType::Gif,
            "pdf" => ImageType::Pdf,
            "svg" => ImageType::Svg,
            "magick" => ImageType::Magick,
            "heif" | "heic" => ImageType::Heif,
            "avif" => ImageType::Avif,
            _ => ImageType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Unknown => "unknown",
            ImageType::Jpeg => "jpeg",
            ImageType::Webp => "webp",
            ImageType::Png => "png",
            ImageType::Tiff => "tiff",
            ImageType::Gif => "gif",
            ImageType::Pdf => "pdf",
            ImageType::Svg => "svg",
            ImageType::Magick => "magick",
            ImageType::Heif => "heif",
            ImageType::Avif => "avif",
        }
    }
}

/// Detect the image type of a buffer from its magic bytes
pub fn determine_image_type(buf: &[u8]) -> ImageType {
    if buf.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return ImageType::Jpeg;
    }
    if buf.starts_with(&[0x89, b'P', b'N', b'G']) {
        return ImageType::Png;
    }
    if buf.starts_with(b"GIF8") {
        return ImageType::Gif;
    }
    if buf.len() >= 12 && &buf[0..4] == b"RIFF" && &buf[8..12] == b"WEBP" {
        return ImageType::Webp;
    }
    if buf.starts_with(b"II*\0") || buf.starts_with(b"MM\0*") {
        return ImageType::Tiff;
    }
    if buf.starts_with(b"%PDF") {
        return ImageType::Pdf;
    }
    if let Some(kind) = iso_bmff_image_type(buf) {
        return kind;
    }
    if is_svg_image(buf) {
        return ImageType::Svg;
    }

    ImageType::Unknown
}

/// Classify HEIF/AVIF containers by their `ftyp` major brand
pub(crate) fn iso_bmff_image_type(buf: &[u8]) -> Option<ImageType> {
    if buf.len() < 12 || &buf[4..8] != b"ftyp" {
        return None;
    }

    match &buf[8..12] {
        b"avif" | b"avis" => Some(ImageType::Avif),
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"mif1" | b"msf1" => Some(ImageType::Heif),
        _ => None,
    }
}

static COMMENT_PATTERN: OnceLock<Regex> = OnceLock::new();
static SVG_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Constant patterns, checked by `test_svg_patterns_are_valid`
fn comment_pattern() -> &'static Regex {
    COMMENT_PATTERN
        .get_or_init(|| Regex::new(r"(?i-u)<!--[\s\S]*?-->").expect("Invalid comment regex"))
}

fn svg_pattern() -> &'static Regex {
    SVG_PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i-u)^\s*(?:<\?xml[^>]*>\s*)?(?:<!doctype svg[^>]*>\s*)?<svg[^>]*>[^*]*</svg>\s*$",
        )
        .expect("Invalid svg regex")
    })
}

/// Check whether a buffer holds a minimal well-formed SVG document
///
/// HTML comments are ignored. An optional XML prolog and SVG doctype may
/// precede the root `<svg>` element, which must be closed at the end of the
/// buffer.
pub fn is_svg_image(buf: &[u8]) -> bool {
    if looks_binary(buf) {
        return false;
    }

    let stripped = comment_pattern().replace_all(buf, &b""[..]);
    svg_pattern().is_match(&stripped)
}

/// Control bytes in the leading 24 bytes mark a buffer as binary
fn looks_binary(buf: &[u8]) -> bool {
    if buf.len() < 24 {
        return false;
    }
    buf[..24].iter().any(|&b| b <= 0x08)
}
