// Transform orchestration: validation, panic containment and commit

use std::any::Any;
use std::io::{Cursor, Write};
use std::sync::Barrier;
use std::thread;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use image_service::transform::{
    engine_options, process, process_image, resolve_mime_type, BufferResource, EngineOptions,
    FileResource, ImageConfig, ImageError, ImageType, RasterEngine, Resource, TransformEngine,
    TransformOptions,
};

fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 2 % 256) as u8, (y * 3 % 256) as u8, 90])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Jpeg(85))
        .unwrap();
    buf.into_inner()
}

/// Engine that unwinds with a fixed payload
struct PanickingEngine {
    payload: fn() -> Box<dyn Any + Send>,
}

impl TransformEngine for PanickingEngine {
    fn transform(&self, _buf: &[u8], _options: &EngineOptions) -> Result<Vec<u8>, ImageError> {
        std::panic::resume_unwind((self.payload)())
    }
}

fn aborted_message(payload: fn() -> Box<dyn Any + Send>) -> String {
    let engine = PanickingEngine { payload };
    let mut resource = BufferResource::new(create_test_jpeg(4, 4));
    let original = resource.body.clone();

    let err = process_image(
        &mut resource,
        &TransformOptions::default(),
        &engine,
        &ImageConfig::default(),
    )
    .unwrap_err();

    assert_eq!(resource.body, original, "resource must stay untouched");
    assert!(resource.mime_type.is_empty());
    match err {
        ImageError::EngineAborted { message } => message,
        other => panic!("expected EngineAborted, got {:?}", other),
    }
}

#[test]
fn test_end_to_end_jpeg_contain() {
    let config = ImageConfig::default();
    let engine = RasterEngine::new(&config);
    let options = TransformOptions::from_query_string("w=100&h=100&fit=contain");
    let mut resource = BufferResource::new(create_test_jpeg(300, 200));

    process_image(&mut resource, &options, &engine, &config).unwrap();

    assert_eq!(resource.mime_type, "image/jpeg");
    assert!(!resource.body.is_empty());
    let output = image::load_from_memory(&resource.body).unwrap();
    assert_eq!((output.width(), output.height()), (100, 67));
}

#[test]
fn test_output_resolves_to_reported_mime() {
    let config = ImageConfig::default();
    let engine = RasterEngine::new(&config);

    for (query, expected) in [
        ("fm=png", "image/png"),
        ("fm=webp", "image/webp"),
        ("fm=gif", "image/gif"),
        ("fm=tiff", "image/tiff"),
        ("w=20", "image/jpeg"),
    ] {
        let mut resource = BufferResource::new(create_test_jpeg(40, 30));
        let options = TransformOptions::from_query_string(query);
        process_image(&mut resource, &options, &engine, &config).unwrap();

        assert_eq!(resource.mime_type, expected, "query {}", query);
        assert_eq!(resolve_mime_type(&resource.body), expected, "query {}", query);
    }
}

#[test]
fn test_file_resource_round_trip() {
    let mut source = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    source.write_all(&create_test_jpeg(64, 64)).unwrap();
    source.flush().unwrap();

    let config = ImageConfig::default();
    let mut resource = FileResource::new(source.path());
    process_image(
        &mut resource,
        &TransformOptions::from_query_string("w=32&fm=png"),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap();

    assert_eq!(resource.mime_type, "image/png");
    assert_eq!(image::load_from_memory(&resource.body).unwrap().width(), 32);
}

#[test]
fn test_missing_file_surfaces_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ImageConfig::default();
    let mut resource = FileResource::new(dir.path().join("missing.jpg"));

    let err = process_image(
        &mut resource,
        &TransformOptions::default(),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap_err();

    assert!(matches!(err, ImageError::Io(_)));
    assert_eq!(err.to_http_status(), 500);
}

#[test]
fn test_unsupported_mime_names_the_type() {
    let config = ImageConfig::default();
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"></svg>"#;
    let mut resource = BufferResource::new(svg.to_vec());

    let err = process_image(
        &mut resource,
        &TransformOptions::default(),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Unsupported MIME type: image/svg+xml");
    assert_eq!(err.to_http_status(), 415);
    assert_eq!(resource.body, svg.to_vec());
}

#[test]
fn test_whitelist_is_configurable() {
    let config = ImageConfig {
        supported_mime_types: vec!["image/png".to_string()],
        ..Default::default()
    };
    let mut resource = BufferResource::new(create_test_jpeg(8, 8));

    let err = process_image(
        &mut resource,
        &TransformOptions::default(),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, ImageError::UnsupportedMimeType { ref mime } if mime == "image/jpeg"));
}

#[test]
fn test_panic_with_string_payload() {
    let message = aborted_message(|| Box::new(String::from("decoder state corrupted")));
    assert_eq!(message, "decoder state corrupted");
}

#[test]
fn test_panic_with_str_payload() {
    let message = aborted_message(|| Box::new("out of scratch memory"));
    assert_eq!(message, "out of scratch memory");
}

#[test]
fn test_panic_with_error_payload() {
    let message = aborted_message(|| Box::new(ImageError::resize_failed("kernel overflow")));
    assert_eq!(message, "Resize failed: kernel overflow");
}

#[test]
fn test_panic_with_opaque_payload() {
    let message = aborted_message(|| Box::new(7_i32));
    assert_eq!(message, "internal processing error");
}

#[test]
fn test_panic_does_not_disturb_next_request() {
    let config = ImageConfig::default();
    let panicking = PanickingEngine {
        payload: || Box::new("first request"),
    };
    let buf = create_test_jpeg(10, 10);
    assert!(process(&buf, &EngineOptions::default(), &panicking).is_err());

    let result = process(
        &buf,
        &engine_options(&TransformOptions::from_query_string("fm=png"), &config),
        &RasterEngine::new(&config),
    )
    .unwrap();
    assert_eq!(result.mime_type, "image/png");
}

#[test]
fn test_panic_is_isolated_from_concurrent_request() {
    let config = ImageConfig::default();
    let panicking = PanickingEngine {
        payload: || Box::new("concurrent failure"),
    };
    let raster = RasterEngine::new(&config);
    let buf = create_test_jpeg(64, 48);
    let barrier = Barrier::new(2);

    let (failed, succeeded) = thread::scope(|scope| {
        let failing = scope.spawn(|| {
            let mut resource = BufferResource::new(buf.clone());
            barrier.wait();
            let result =
                process_image(&mut resource, &TransformOptions::default(), &panicking, &config);
            (result, resource)
        });
        let working = scope.spawn(|| {
            let mut resource = BufferResource::new(buf.clone());
            let options = TransformOptions::from_query_string("w=32&fm=png");
            barrier.wait();
            let result = process_image(&mut resource, &options, &raster, &config);
            (result, resource)
        });
        (failing.join().unwrap(), working.join().unwrap())
    });

    let (result, resource) = failed;
    assert!(matches!(
        result,
        Err(ImageError::EngineAborted { ref message }) if message == "concurrent failure"
    ));
    assert_eq!(resource.body, buf);

    let (result, resource) = succeeded;
    result.unwrap();
    assert_eq!(resource.mime_type, "image/png");
    let img = image::load_from_memory(&resource.body).unwrap();
    assert_eq!((img.width(), img.height()), (32, 24));
}

#[test]
fn test_thin_source_resize_stays_within_output_limits() {
    let config = ImageConfig {
        max_width: 400,
        max_height: 400,
        ..Default::default()
    };
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(1, 50))
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    let mut resource = BufferResource::new(buf.into_inner());

    process_image(
        &mut resource,
        &TransformOptions::from_query_string("w=400&fm=png"),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap();

    let img = image::load_from_memory(&resource.body).unwrap();
    assert_eq!((img.width(), img.height()), (8, 400));
}

#[test]
fn test_unknown_output_type_reports_jpeg() {
    struct OpaqueEngine;

    impl TransformEngine for OpaqueEngine {
        fn transform(&self, _buf: &[u8], _options: &EngineOptions) -> Result<Vec<u8>, ImageError> {
            Ok(b"opaque bytes".to_vec())
        }

        fn determine_type(&self, _buf: &[u8]) -> ImageType {
            ImageType::Magick
        }
    }

    let result = process(b"input", &EngineOptions::default(), &OpaqueEngine).unwrap();
    assert_eq!(result.mime_type, "image/jpeg");
    assert_eq!(result.body, b"opaque bytes");
}

#[test]
fn test_resource_trait_object() {
    let mut resource: Box<dyn Resource> = Box::new(BufferResource::new(create_test_jpeg(8, 8)));
    let config = ImageConfig::default();
    process_image(
        resource.as_mut(),
        &TransformOptions::default(),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap();
}
