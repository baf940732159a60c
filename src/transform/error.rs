//! Image pipeline error types
//!
//! Provides structured error handling with HTTP status mapping. The
//! pipeline never maps or logs errors itself; callers own the response.

use thiserror::Error;

/// Message used when a contained engine panic carries no usable payload
pub const GENERIC_ENGINE_ERROR: &str = "internal processing error";

/// Errors that can occur while transforming an image
#[derive(Error, Debug)]
pub enum ImageError {
    // === Input Errors ===
    /// Reading the resource failed; the I/O error is surfaced unchanged
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Detected MIME type is not in the supported whitelist
    #[error("Unsupported MIME type: {mime}")]
    UnsupportedMimeType { mime: String },

    // === Engine Errors ===
    /// Image format cannot be decoded or encoded by the engine
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Failed to decode image data
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: String },

    /// Resize operation failed
    #[error("Resize failed: {message}")]
    ResizeFailed { message: String },

    /// Encoding to output format failed
    #[error("Failed to encode to {format}: {message}")]
    EncodeFailed { format: String, message: String },

    /// Crop area lies outside the source image
    #[error("Crop area {width}x{height}+{x}+{y} is outside image bounds {image_width}x{image_height}")]
    InvalidCrop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Image dimensions exceed safety limits (image bomb protection)
    #[error("Image dimensions {width}x{height} ({pixels} pixels) exceed limit of {max_pixels} pixels")]
    ImageBombDetected {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    /// Input file size exceeds limit
    #[error("File size {size} bytes exceeds maximum {max_size} bytes")]
    FileTooLarge { size: usize, max_size: usize },

    /// The engine terminated abnormally and the failure was contained
    #[error("{message}")]
    EngineAborted { message: String },
}

impl ImageError {
    /// Maps image errors to HTTP status codes
    ///
    /// Status mapping:
    /// - UnsupportedMimeType, UnsupportedFormat → 415 (Unsupported Media Type)
    /// - DecodeFailed, InvalidCrop, ImageBombDetected → 400 (Bad Request)
    /// - FileTooLarge → 413 (Payload Too Large)
    /// - Io, ResizeFailed, EncodeFailed, EngineAborted → 500 (Internal Server Error)
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::UnsupportedMimeType { .. } | ImageError::UnsupportedFormat { .. } => 415,

            ImageError::DecodeFailed { .. }
            | ImageError::InvalidCrop { .. }
            | ImageError::ImageBombDetected { .. } => 400,

            ImageError::FileTooLarge { .. } => 413,

            ImageError::Io(_)
            | ImageError::ResizeFailed { .. }
            | ImageError::EncodeFailed { .. }
            | ImageError::EngineAborted { .. } => 500,
        }
    }

    /// Helper constructors for common error patterns
    pub fn unsupported_mime(mime: impl Into<String>) -> Self {
        ImageError::UnsupportedMimeType { mime: mime.into() }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        ImageError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn engine_aborted(message: impl Into<String>) -> Self {
        ImageError::EngineAborted {
            message: message.into(),
        }
    }

    pub fn image_bomb(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageBombDetected {
            width,
            height,
            pixels: width as u64 * height as u64,
            max_pixels,
        }
    }
}
