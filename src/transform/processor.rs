//! Transform orchestration
//!
//! Runs one request through READ, DETECT, VALIDATE, TRANSFORM and COMMIT.
//! Any failure short-circuits the remaining stages and leaves the resource
//! untouched. Engine panics are contained and reported as
//! [`ImageError::EngineAborted`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use super::config::ImageConfig;
use super::engine::{CropArea, EngineOptions, TransformEngine};
use super::error::{ImageError, GENERIC_ENGINE_ERROR};
use super::format::ImageType;
use super::options::TransformOptions;
use super::resource::Resource;
use super::sniff::resolve_mime_type_with;

/// Encoded output of a successful transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub body: Vec<u8>,
    pub mime_type: String,
}

/// Transform a resource in place
///
/// On success the resource body and MIME type are replaced with the
/// engine's output. On failure the resource is left as it was.
pub fn process_image<R: Resource + ?Sized>(
    resource: &mut R,
    options: &TransformOptions,
    engine: &dyn TransformEngine,
    config: &ImageConfig,
) -> Result<(), ImageError> {
    let buf = resource.read()?;
    debug!(input_bytes = buf.len(), "Read image resource");

    let mime = resolve_mime_type_with(&buf, |data| engine.is_svg(data));
    debug!(mime = %mime, "Resolved content type");

    if !config.is_mime_type_supported(&mime) {
        return Err(ImageError::unsupported_mime(mime));
    }

    let result = process(&buf, &engine_options(options, config), engine)?;
    debug!(
        output_bytes = result.body.len(),
        output_mime = %result.mime_type,
        "Transformed image"
    );

    resource.store(result.body, result.mime_type);
    Ok(())
}

/// Run the engine once over a buffer, containing any panic
pub fn process(
    buf: &[u8],
    options: &EngineOptions,
    engine: &dyn TransformEngine,
) -> Result<TransformResult, ImageError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        engine.transform(buf, options).map(|body| {
            let image_type = engine.determine_type(&body);
            (body, image_type)
        })
    }));

    let (body, image_type) = match outcome {
        Ok(result) => result?,
        Err(payload) => return Err(ImageError::engine_aborted(panic_message(payload.as_ref()))),
    };

    Ok(TransformResult {
        body,
        mime_type: output_mime_type(image_type).to_string(),
    })
}

/// Extract a readable message from a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(err) = payload.downcast_ref::<ImageError>() {
        err.to_string()
    } else if let Some(err) = payload.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        err.to_string()
    } else if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        GENERIC_ENGINE_ERROR.to_string()
    }
}

/// MIME type reported for an engine output type
///
/// Types outside the table are reported as JPEG.
pub fn output_mime_type(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::Png => "image/png",
        ImageType::Webp => "image/webp",
        ImageType::Tiff => "image/tiff",
        ImageType::Gif => "image/gif",
        ImageType::Svg => "image/svg+xml",
        ImageType::Pdf => "application/pdf",
        _ => "image/jpeg",
    }
}

/// Derive engine instructions from request options and configured limits
pub fn engine_options(options: &TransformOptions, config: &ImageConfig) -> EngineOptions {
    let scale = |side: u32, max: u32| -> u32 {
        let side = if options.dpr > 0.0 {
            (side as f64 * options.dpr).round()
        } else {
            side as f64
        };
        side.min(max as f64) as u32
    };

    let quality = match options.quality {
        0 => config.default_quality,
        q => q.min(100) as u8,
    };

    let crop = options.crop;
    let area = crop.is_applicable().then(|| CropArea {
        x: crop.x as u32,
        y: crop.y as u32,
        width: crop.width as u32,
        height: crop.height as u32,
    });

    EngineOptions {
        width: scale(options.width, config.max_width),
        height: scale(options.height, config.max_height),
        fit: options.fit,
        area,
        rotate: options.orientation,
        quality,
        output: options.format,
        background: options.background.rgb(),
        brightness: options.brightness,
        contrast: options.contrast,
        gamma: options.gamma,
        sharpen: options.sharpen,
        blur: options.blur,
        pixelate: options.pixelate,
    }
}
