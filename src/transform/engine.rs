//! Transform engine seam and the bundled raster engine
//!
//! The pipeline talks to image engines only through [`TransformEngine`]. The
//! bundled [`RasterEngine`] decodes with the `image` crate, resizes with
//! `fast_image_resize` and encodes through [`EncoderFactory`].

use std::io::Cursor;
use std::num::NonZeroU32;

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, Rgba, RgbaImage};

use super::config::ImageConfig;
use tracing::debug;

use super::encoder::{EncoderFactory, EncoderQuality};
use super::error::ImageError;
use super::format::{determine_image_type, is_svg_image, ImageType};
use super::options::{Angle, FitMode};
use crate::constants::{
    DEFAULT_IMAGE_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SOURCE_FILE_SIZE,
    DEFAULT_MAX_SOURCE_HEIGHT, DEFAULT_MAX_SOURCE_PIXELS, DEFAULT_MAX_SOURCE_WIDTH,
    DEFAULT_MAX_WIDTH,
};

/// Upper bound for blur and sharpen sigma
const MAX_SIGMA: f32 = 100.0;

/// Upper bound for the contrast adjustment percentage
const MAX_CONTRAST: f32 = 100.0;

/// Rectangle extracted from the source before resizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalized instructions handed to an engine
///
/// Built from request options by the orchestrator; every field is already
/// clamped to configured limits.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Target width; 0 derives it from height and the aspect ratio
    pub width: u32,
    /// Target height; 0 derives it from width and the aspect ratio
    pub height: u32,
    pub fit: FitMode,
    pub area: Option<CropArea>,
    pub rotate: Angle,
    pub quality: u8,
    /// Requested output; [`ImageType::Unknown`] keeps the source type
    pub output: ImageType,
    pub background: Option<[u8; 3]>,
    pub brightness: u32,
    pub contrast: u32,
    pub gamma: f64,
    pub sharpen: u32,
    pub blur: u32,
    /// Block size in pixels; 0 and 1 disable pixelation
    pub pixelate: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fit: FitMode::default(),
            area: None,
            rotate: Angle::default(),
            quality: DEFAULT_IMAGE_QUALITY,
            output: ImageType::Unknown,
            background: None,
            brightness: 0,
            contrast: 0,
            gamma: 0.0,
            sharpen: 0,
            blur: 0,
            pixelate: 0,
        }
    }
}

/// Image engine invoked by the transform pipeline
///
/// Implementations must be shareable across threads. A panic inside
/// `transform` is contained by the caller.
#[cfg_attr(test, mockall::automock)]
pub trait TransformEngine: Send + Sync {
    /// Transform the encoded input and return the encoded output
    fn transform(&self, buf: &[u8], options: &EngineOptions) -> Result<Vec<u8>, ImageError>;

    /// Identify the image type of an encoded buffer
    fn determine_type(&self, buf: &[u8]) -> ImageType {
        determine_image_type(buf)
    }

    fn is_svg(&self, buf: &[u8]) -> bool {
        is_svg_image(buf)
    }
}

/// Raster engine built on `image` and `fast_image_resize`
#[derive(Debug, Clone)]
pub struct RasterEngine {
    max_width: u32,
    max_height: u32,
    max_source_width: u32,
    max_source_height: u32,
    max_source_pixels: u64,
    max_source_file_size: usize,
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            max_source_width: DEFAULT_MAX_SOURCE_WIDTH,
            max_source_height: DEFAULT_MAX_SOURCE_HEIGHT,
            max_source_pixels: DEFAULT_MAX_SOURCE_PIXELS,
            max_source_file_size: DEFAULT_MAX_SOURCE_FILE_SIZE,
        }
    }
}

impl RasterEngine {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            max_source_width: config.max_source_width,
            max_source_height: config.max_source_height,
            max_source_pixels: config.max_source_pixels,
            max_source_file_size: config.max_source_file_size,
        }
    }

    /// Reject oversized input before any pixel is decoded
    fn validate_source(&self, buf: &[u8]) -> Result<(), ImageError> {
        if buf.len() > self.max_source_file_size {
            return Err(ImageError::FileTooLarge {
                size: buf.len(),
                max_size: self.max_source_file_size,
            });
        }

        let (width, height) = ImageReader::new(Cursor::new(buf))
            .with_guessed_format()
            .map_err(|e| ImageError::decode_failed(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ImageError::decode_failed(e.to_string()))?;

        if width > self.max_source_width
            || height > self.max_source_height
            || width as u64 * height as u64 > self.max_source_pixels
        {
            return Err(ImageError::image_bomb(
                width,
                height,
                self.max_source_pixels,
            ));
        }
        Ok(())
    }

    fn output_type(&self, buf: &[u8], requested: ImageType) -> ImageType {
        let format = match requested {
            ImageType::Unknown => determine_image_type(buf),
            explicit => return explicit,
        };
        if EncoderFactory::supports(format) {
            format
        } else {
            ImageType::Jpeg
        }
    }
}

impl TransformEngine for RasterEngine {
    fn transform(&self, buf: &[u8], options: &EngineOptions) -> Result<Vec<u8>, ImageError> {
        self.validate_source(buf)?;
        let output = self.output_type(buf, options.output);
        let encoder = EncoderFactory::create(output)?;

        let mut img = decode_image(buf)?;

        if let Some(area) = options.area {
            img = crop_area(&img, area)?;
        }

        img = self.apply_fit(img, options)?;
        img = rotate(img, options.rotate);
        img = apply_effects(img, options)?;

        let mut rgba = img.into_rgba8();
        if !encoder.supports_transparency() {
            if let Some(background) = options.background {
                flatten_alpha(&mut rgba, background);
            }
        }

        let encoded = encoder.encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            EncoderQuality::with_quality(options.quality),
        )?;
        debug!(
            format = encoder.format().as_str(),
            width = rgba.width(),
            height = rgba.height(),
            output_bytes = encoded.len(),
            "Encoded image"
        );

        Ok(encoded)
    }
}

/// Decode image data into a DynamicImage
fn decode_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

fn crop_area(img: &DynamicImage, area: CropArea) -> Result<DynamicImage, ImageError> {
    let right = area.x as u64 + area.width as u64;
    let bottom = area.y as u64 + area.height as u64;
    if area.width == 0
        || area.height == 0
        || right > img.width() as u64
        || bottom > img.height() as u64
    {
        return Err(ImageError::InvalidCrop {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height,
            image_width: img.width(),
            image_height: img.height(),
        });
    }
    Ok(img.crop_imm(area.x, area.y, area.width, area.height))
}

/// Resize geometry for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FitPlan {
    pub width: u32,
    pub height: u32,
    /// Centre crop of the source taken before resizing (cover only)
    pub crop: Option<(u32, u32)>,
}

impl RasterEngine {
    /// Work out resize dimensions for a source and a requested box
    ///
    /// Planned sides never exceed the configured output limits.
    pub(crate) fn plan_fit(
        &self,
        src_width: u32,
        src_height: u32,
        width: u32,
        height: u32,
        fit: FitMode,
    ) -> FitPlan {
        let width = width.min(self.max_width);
        let height = height.min(self.max_height);
        let unchanged = FitPlan {
            width: src_width,
            height: src_height,
            crop: None,
        };
        if src_width == 0 || src_height == 0 || (width == 0 && height == 0) {
            return unchanged;
        }

        let scale_x = width as f64 / src_width as f64;
        let scale_y = height as f64 / src_height as f64;

        // One-sided requests keep the aspect ratio whatever the fit
        let scale = if width == 0 {
            scale_y
        } else if height == 0 {
            scale_x
        } else {
            match fit {
                FitMode::Fill => {
                    return FitPlan {
                        width,
                        height,
                        crop: None,
                    }
                }
                FitMode::Cover => {
                    // Crop the source to the box's aspect ratio so the resize
                    // target is the box itself
                    let scale = scale_x.max(scale_y);
                    let source_side = |side: u32, limit: u32| {
                        ((side as f64 / scale).round() as u32).clamp(1, limit)
                    };
                    return FitPlan {
                        width,
                        height,
                        crop: Some((
                            source_side(width, src_width),
                            source_side(height, src_height),
                        )),
                    };
                }
                FitMode::Contain | FitMode::Inside => scale_x.min(scale_y),
                FitMode::Outside => scale_x.max(scale_y),
            }
        };

        let scale = if fit == FitMode::Inside {
            scale.min(1.0)
        } else {
            scale
        };
        let scale = scale
            .min(self.max_width as f64 / src_width as f64)
            .min(self.max_height as f64 / src_height as f64);
        let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
        FitPlan {
            width: scaled(src_width),
            height: scaled(src_height),
            crop: None,
        }
    }

    fn apply_fit(
        &self,
        img: DynamicImage,
        options: &EngineOptions,
    ) -> Result<DynamicImage, ImageError> {
        let plan = self.plan_fit(
            img.width(),
            img.height(),
            options.width,
            options.height,
            options.fit,
        );

        let img = match plan.crop {
            Some((crop_w, crop_h)) => img.crop_imm(
                (img.width() - crop_w) / 2,
                (img.height() - crop_h) / 2,
                crop_w,
                crop_h,
            ),
            None => img,
        };

        let mut rgba = if (plan.width, plan.height) == (img.width(), img.height()) {
            img.into_rgba8()
        } else {
            resize_rgba(
                &img.into_rgba8(),
                plan.width,
                plan.height,
                ResizeAlg::Convolution(FilterType::Lanczos3),
            )?
        };

        let (box_w, box_h) = (
            options.width.min(self.max_width),
            options.height.min(self.max_height),
        );
        if options.fit == FitMode::Contain && box_w > 0 && box_h > 0 {
            if let Some(background) = options.background {
                rgba = pad_to_box(&rgba, box_w, box_h, background);
            }
        }

        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// Composite every pixel over an opaque background
fn flatten_alpha(img: &mut RgbaImage, background: [u8; 3]) {
    for pixel in img.pixels_mut() {
        let alpha = pixel[3] as u32;
        for (channel, bg) in pixel.0[..3].iter_mut().zip(background) {
            *channel = ((*channel as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        }
        pixel[3] = 255;
    }
}

/// Centre an image on an opaque canvas of the requested size
fn pad_to_box(img: &RgbaImage, width: u32, height: u32, background: [u8; 3]) -> RgbaImage {
    if img.width() >= width && img.height() >= height {
        return img.clone();
    }
    let [r, g, b] = background;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
    let x = (width.saturating_sub(img.width()) / 2) as i64;
    let y = (height.saturating_sub(img.height()) / 2) as i64;
    image::imageops::overlay(&mut canvas, img, x, y);
    canvas
}

/// Resize RGBA pixels using fast-image-resize
fn resize_rgba(
    img: &RgbaImage,
    target_w: u32,
    target_h: u32,
    algorithm: ResizeAlg,
) -> Result<RgbaImage, ImageError> {
    let src_width = NonZeroU32::new(img.width())
        .ok_or_else(|| ImageError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| ImageError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| ImageError::resize_failed("Target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(algorithm);

    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ImageError::resize_failed("Failed to create output image buffer"))
}

fn rotate(img: DynamicImage, angle: Angle) -> DynamicImage {
    match angle {
        Angle::D0 => img,
        Angle::D90 => img.rotate90(),
        Angle::D180 => img.rotate180(),
        Angle::D270 => img.rotate270(),
    }
}

fn apply_effects(img: DynamicImage, options: &EngineOptions) -> Result<DynamicImage, ImageError> {
    let mut img = img;

    if options.blur > 0 {
        img = img.blur((options.blur as f32).min(MAX_SIGMA));
    }
    if options.sharpen > 0 {
        img = img.unsharpen((options.sharpen as f32).min(MAX_SIGMA), 0);
    }
    if options.brightness > 0 {
        img = img.brighten(options.brightness.min(255) as i32);
    }
    if options.contrast > 0 {
        img = img.adjust_contrast((options.contrast as f32).min(MAX_CONTRAST));
    }
    if options.gamma > 0.0 && (options.gamma - 1.0).abs() > f64::EPSILON {
        img = apply_gamma(img, options.gamma);
    }
    if options.pixelate > 1 {
        img = pixelate(img, options.pixelate)?;
    }

    Ok(img)
}

/// Gamma-correct the colour channels through a lookup table
fn apply_gamma(img: DynamicImage, gamma: f64) -> DynamicImage {
    let exponent = 1.0 / gamma;
    let lut: Vec<u8> = (0..=255u16)
        .map(|v| ((v as f64 / 255.0).powf(exponent) * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();

    let mut rgba = img.into_rgba8();
    for pixel in rgba.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = lut[*channel as usize];
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Downscale then upscale with nearest-neighbour sampling
fn pixelate(img: DynamicImage, block: u32) -> Result<DynamicImage, ImageError> {
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    let small = resize_rgba(
        &rgba,
        (width / block).max(1),
        (height / block).max(1),
        ResizeAlg::Nearest,
    )?;
    let restored = resize_rgba(&small, width, height, ResizeAlg::Nearest)?;
    Ok(DynamicImage::ImageRgba8(restored))
}
