// Content type resolution across all three detection stages

use image_service::transform::sniff::{FALLBACK_MIME_TYPE, SVG_MIME_TYPE};
use image_service::transform::{determine_image_type, is_svg_image, resolve_mime_type, ImageType};
use rstest::rstest;

const MINIMAL_SVG: &[u8] =
    br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10"/></svg>"#;

#[rstest]
#[case::png(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00], "image/png")]
#[case::jpeg(&[0xFF, 0xD8, 0xFF, 0xDB, 0x00], "image/jpeg")]
#[case::gif(b"GIF87a\x01\x00\x01\x00", "image/gif")]
#[case::webp(b"RIFF\x24\x00\x00\x00WEBPVP8 ", "image/webp")]
#[case::tiff(b"MM\x00*\x00\x00\x00\x08", "image/tiff")]
#[case::pdf(b"%PDF-1.7\n", "application/pdf")]
#[case::binary(&[0x00, 0x01, 0xFE, 0xFF, 0x10], FALLBACK_MIME_TYPE)]
fn test_resolve_signatures(#[case] buf: &[u8], #[case] expected: &str) {
    assert_eq!(resolve_mime_type(buf), expected);
}

#[test]
fn test_minimal_svg_resolves_to_svg() {
    assert_eq!(resolve_mime_type(MINIMAL_SVG), SVG_MIME_TYPE);
    assert!(is_svg_image(MINIMAL_SVG));
    assert_eq!(determine_image_type(MINIMAL_SVG), ImageType::Svg);
}

#[test]
fn test_svg_with_doctype_and_comments() {
    let svg = br#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generator: hand written -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg width="4" height="4"><circle r="2"/></svg>
"#;
    assert_eq!(resolve_mime_type(svg), SVG_MIME_TYPE);
}

#[test]
fn test_html_document_is_not_svg() {
    let html = b"<!DOCTYPE html><html><body><svg></svg></body></html>";
    assert_eq!(resolve_mime_type(html), "text/html; charset=utf-8");
}

#[test]
fn test_plain_text_stays_text() {
    assert_eq!(
        resolve_mime_type(b"just some words here"),
        "text/plain; charset=utf-8"
    );
}

#[test]
fn test_heif_container_detected_by_magic_stage() {
    let heic = b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00mif1heic";
    assert_eq!(resolve_mime_type(heic), "image/heif");
    assert_eq!(determine_image_type(heic), ImageType::Heif);
}

#[test]
fn test_resolution_is_deterministic() {
    for buf in [MINIMAL_SVG, b"GIF89a\x00\x00".as_slice(), b"hello".as_slice()] {
        assert_eq!(resolve_mime_type(buf), resolve_mime_type(buf));
    }
}
