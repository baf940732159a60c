//! Content-type resolution for untrusted input buffers
//!
//! Declared metadata is never trusted; the MIME type is derived from the
//! bytes in three ordered stages:
//! 1. Signature sniffing over the first 512 bytes
//! 2. A secondary magic-number table when stage 1 is inconclusive
//! 3. An SVG check for buffers that look textual

use image::ImageFormat;

use super::format::{iso_bmff_image_type, is_svg_image, ImageType};

/// Generic fallback when nothing more specific is known
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// Number of leading bytes considered by signature sniffing
const SNIFF_LEN: usize = 512;

/// Buffers this short are never promoted to SVG
const MIN_SVG_LEN: usize = 8;

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// A byte-prefix pattern from the sniffing table
enum Signature {
    /// Case-insensitive HTML tag followed by a space or `>`
    Html(&'static [u8]),
    /// Pattern compared after masking each data byte
    Masked {
        mask: &'static [u8],
        pattern: &'static [u8],
        skip_ws: bool,
        mime: &'static str,
    },
    Exact {
        prefix: &'static [u8],
        mime: &'static str,
    },
    /// ISO base media file with an `mp4` compatible brand
    Mp4,
    /// No binary control bytes
    Text,
}

const EOT_MASK: [u8; 36] = {
    let mut mask = [0u8; 36];
    mask[34] = 0xFF;
    mask[35] = 0xFF;
    mask
};

const EOT_PATTERN: [u8; 36] = {
    let mut pattern = [0u8; 36];
    pattern[34] = b'L';
    pattern[35] = b'P';
    pattern
};

const fn exact(prefix: &'static [u8], mime: &'static str) -> Signature {
    Signature::Exact { prefix, mime }
}

const fn masked(mask: &'static [u8], pattern: &'static [u8], mime: &'static str) -> Signature {
    Signature::Masked {
        mask,
        pattern,
        skip_ws: false,
        mime,
    }
}

/// Ordered signature table; the first match wins
static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"<?xml",
        skip_ws: true,
        mime: "text/xml; charset=utf-8",
    },
    exact(b"%PDF-", "application/pdf"),
    exact(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks
    masked(b"\xFF\xFF\x00\x00", b"\xFE\xFF\x00\x00", "text/plain; charset=utf-16be"),
    masked(b"\xFF\xFF\x00\x00", b"\xFF\xFE\x00\x00", "text/plain; charset=utf-16le"),
    masked(b"\xFF\xFF\xFF\x00", b"\xEF\xBB\xBF\x00", TEXT_UTF8),
    // Images
    exact(b"\x00\x00\x01\x00", "image/x-icon"),
    exact(b"\x00\x00\x02\x00", "image/x-icon"),
    exact(b"BM", "image/bmp"),
    exact(b"GIF87a", "image/gif"),
    exact(b"GIF89a", "image/gif"),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WEBPVP",
        "image/webp",
    ),
    exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"FORM\x00\x00\x00\x00AIFF",
        "audio/aiff",
    ),
    masked(b"\xFF\xFF\xFF", b"ID3", "audio/mpeg"),
    masked(b"\xFF\xFF\xFF\xFF\xFF", b"OggS\x00", "application/ogg"),
    masked(
        b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        b"MThd\x00\x00\x00\x06",
        "audio/midi",
    ),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00AVI ",
        "video/avi",
    ),
    masked(
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        b"RIFF\x00\x00\x00\x00WAVE",
        "audio/wave",
    ),
    Signature::Mp4,
    exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts
    masked(&EOT_MASK, &EOT_PATTERN, "application/vnd.ms-fontobject"),
    exact(b"\x00\x01\x00\x00", "font/ttf"),
    exact(b"OTTO", "font/otf"),
    exact(b"ttcf", "font/collection"),
    exact(b"wOFF", "font/woff"),
    exact(b"wOF2", "font/woff2"),
    // Archives
    exact(b"\x1F\x8B\x08", "application/x-gzip"),
    exact(b"PK\x03\x04", "application/zip"),
    exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

impl Signature {
    fn sniff(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                for (&expected, &actual) in tag.iter().zip(data) {
                    let actual = if expected.is_ascii_uppercase() {
                        actual & 0xDF
                    } else {
                        actual
                    };
                    if expected != actual {
                        return None;
                    }
                }
                match data[tag.len()] {
                    b' ' | b'>' => Some("text/html; charset=utf-8"),
                    _ => None,
                }
            }
            Signature::Masked {
                mask,
                pattern,
                skip_ws,
                mime,
            } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                let matched = pattern
                    .iter()
                    .zip(mask.iter())
                    .zip(data)
                    .all(|((&p, &m), &d)| d & m == p);
                matched.then_some(*mime)
            }
            Signature::Exact { prefix, mime } => data.starts_with(prefix).then_some(*mime),
            Signature::Mp4 => is_mp4(data).then_some("video/mp4"),
            Signature::Text => {
                let binary = data[first_non_ws..].iter().any(|&b| {
                    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
                });
                (!binary).then_some(TEXT_UTF8)
            }
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }

    // Compatible brands follow the major brand and minor version
    (8..box_size)
        .step_by(4)
        .filter(|&offset| offset != 12)
        .any(|offset| data.get(offset..offset + 3) == Some(b"mp4"))
}

/// Stage 1: signature sniffing
///
/// Always returns a MIME type; [`FALLBACK_MIME_TYPE`] when no signature
/// matches.
pub fn detect_content_type(buf: &[u8]) -> &'static str {
    let data = &buf[..buf.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|signature| signature.sniff(data, first_non_ws))
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Stage 2: secondary magic-number table
pub fn magic_mime_type(buf: &[u8]) -> Option<&'static str> {
    if let Some(kind) = iso_bmff_image_type(buf) {
        return Some(match kind {
            ImageType::Avif => "image/avif",
            _ => "image/heif",
        });
    }

    let mime = match image::guess_format(buf).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Hdr => "image/vnd.radiance",
        ImageFormat::OpenExr => "image/x-exr",
        ImageFormat::Pnm => "image/x-portable-anymap",
        ImageFormat::Farbfeld => "image/x-farbfeld",
        ImageFormat::Dds => "image/vnd-ms.dds",
        _ => return None,
    };
    Some(mime)
}

fn looks_textual(mime: &str) -> bool {
    mime.starts_with("text/")
}

/// Resolve the MIME type of a buffer through all three stages
///
/// Never fails; the worst case is [`FALLBACK_MIME_TYPE`].
pub fn resolve_mime_type(buf: &[u8]) -> String {
    resolve_mime_type_with(buf, is_svg_image)
}

/// Like [`resolve_mime_type`], with the stage 3 SVG predicate supplied by
/// the caller
pub fn resolve_mime_type_with(buf: &[u8], is_svg: impl Fn(&[u8]) -> bool) -> String {
    let mut mime = detect_content_type(buf);

    if mime == FALLBACK_MIME_TYPE {
        if let Some(magic) = magic_mime_type(buf) {
            mime = magic;
        }
    }

    if looks_textual(mime) && buf.len() > MIN_SVG_LEN && is_svg(buf) {
        mime = SVG_MIME_TYPE;
    }

    mime.to_string()
}
