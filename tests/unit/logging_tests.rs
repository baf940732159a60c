// Logging tests
//
// The subscriber is process-global, so every test here tolerates an
// already-installed subscriber.

use image_service::config::{LogFormat, LoggingConfig};
use image_service::logging::init_subscriber;
use image_service::transform::{
    process_image, BufferResource, ImageConfig, RasterEngine, TransformOptions,
};

/// Test: Can initialize tracing subscriber
///
/// Initialization succeeds with the default JSON configuration and is a
/// no-op on repeated calls.
#[test]
fn test_can_initialize_tracing_subscriber() {
    let config = LoggingConfig::default();
    assert!(init_subscriber(&config).is_ok());
    assert!(init_subscriber(&config).is_ok());
}

#[test]
fn test_pretty_format_after_json_is_noop() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Pretty,
    };
    assert!(init_subscriber(&LoggingConfig::default()).is_ok());
    assert!(init_subscriber(&config).is_ok());
}

/// Test: Pipeline emits events without disturbing the result
#[test]
fn test_pipeline_runs_with_subscriber_installed() {
    init_subscriber(&LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Json,
    })
    .unwrap();

    let config = ImageConfig::default();
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
    let mut resource = BufferResource::new(png.to_vec());

    // Truncated PNG: detection passes, decoding fails
    let err = process_image(
        &mut resource,
        &TransformOptions::default(),
        &RasterEngine::new(&config),
        &config,
    )
    .unwrap_err();
    assert_eq!(err.to_http_status(), 400);
}
