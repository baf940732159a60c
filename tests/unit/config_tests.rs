// Configuration loading and validation

use std::io::Write;

use image_service::config::{Config, LogFormat};
use tempfile::NamedTempFile;

#[test]
fn test_can_deserialize_full_config() {
    let yaml = r#"
image:
  max_width: 1920
  max_height: 1080
  default_quality: 90
  max_source_width: 8000
  max_source_height: 6000
  max_source_pixels: 40000000
  max_source_file_size: 10485760
  supported_mime_types:
    - "image/jpeg"
    - "image/png"
logging:
  level: "warn"
  format: "json"
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert_eq!(config.image.max_width, 1920);
    assert_eq!(config.image.max_height, 1080);
    assert_eq!(config.image.default_quality, 90);
    assert_eq!(config.image.max_source_width, 8000);
    assert_eq!(config.image.max_source_height, 6000);
    assert_eq!(config.image.max_source_pixels, 40_000_000);
    assert_eq!(config.image.max_source_file_size, 10 * 1024 * 1024);
    assert_eq!(config.image.supported_mime_types.len(), 2);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_image_section_keeps_defaults() {
    let config = Config::from_yaml_with_env("image:\n  max_width: 800\n").unwrap();
    assert_eq!(config.image.max_width, 800);
    assert_eq!(config.image.max_height, 4096);
    assert!(config.image.is_mime_type_supported("image/webp"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let result = Config::from_yaml_with_env("logging:\n  format: \"xml\"\n");
    assert!(result.is_err());
}

#[test]
fn test_invalid_quality_fails_validation() {
    let config = Config::from_yaml_with_env("image:\n  default_quality: 150\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("default_quality"));
}

#[test]
fn test_config_from_file_with_env_substitution() {
    std::env::set_var("IMAGE_SERVICE_CONFIG_TEST_LEVEL", "debug");

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"logging:\n  level: ${IMAGE_SERVICE_CONFIG_TEST_LEVEL}\n  format: pretty\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}
