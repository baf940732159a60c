use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMAGE_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SOURCE_FILE_SIZE,
    DEFAULT_MAX_SOURCE_HEIGHT, DEFAULT_MAX_SOURCE_PIXELS, DEFAULT_MAX_SOURCE_WIDTH,
    DEFAULT_MAX_WIDTH, DEFAULT_SUPPORTED_MIME_TYPES,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Maximum allowed width for resized images (to prevent abuse)
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Maximum allowed height for resized images
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Default quality for lossy formats (JPEG, WebP)
    #[serde(default = "default_quality")]
    pub default_quality: u8,

    /// Maximum source width in pixels
    #[serde(default = "default_max_source_width")]
    pub max_source_width: u32,

    /// Maximum source height in pixels
    #[serde(default = "default_max_source_height")]
    pub max_source_height: u32,

    /// Maximum decoded source size in pixels (image bomb protection)
    #[serde(default = "default_max_source_pixels")]
    pub max_source_pixels: u64,

    /// Maximum input buffer size in bytes
    #[serde(default = "default_max_source_file_size")]
    pub max_source_file_size: usize,

    /// Detected input MIME types accepted for transformation
    #[serde(default = "default_supported_mime_types")]
    pub supported_mime_types: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            default_quality: default_quality(),
            max_source_width: default_max_source_width(),
            max_source_height: default_max_source_height(),
            max_source_pixels: default_max_source_pixels(),
            max_source_file_size: default_max_source_file_size(),
            supported_mime_types: default_supported_mime_types(),
        }
    }
}

impl ImageConfig {
    pub fn is_mime_type_supported(&self, mime: &str) -> bool {
        self.supported_mime_types.iter().any(|supported| supported == mime)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err("image.max_width and image.max_height must be positive".to_string());
        }
        if !(1..=100).contains(&self.default_quality) {
            return Err(format!(
                "image.default_quality must be 1-100, got {}",
                self.default_quality
            ));
        }
        if self.max_source_width == 0 || self.max_source_height == 0 {
            return Err(
                "image.max_source_width and image.max_source_height must be positive".to_string(),
            );
        }
        if self.max_source_pixels == 0 {
            return Err("image.max_source_pixels must be positive".to_string());
        }
        if self.supported_mime_types.is_empty() {
            return Err("image.supported_mime_types cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_quality() -> u8 {
    DEFAULT_IMAGE_QUALITY
}

fn default_max_source_width() -> u32 {
    DEFAULT_MAX_SOURCE_WIDTH
}

fn default_max_source_height() -> u32 {
    DEFAULT_MAX_SOURCE_HEIGHT
}

fn default_max_source_pixels() -> u64 {
    DEFAULT_MAX_SOURCE_PIXELS
}

fn default_max_source_file_size() -> usize {
    DEFAULT_MAX_SOURCE_FILE_SIZE
}

fn default_supported_mime_types() -> Vec<String> {
    DEFAULT_SUPPORTED_MIME_TYPES
        .iter()
        .map(|mime| mime.to_string())
        .collect()
}
