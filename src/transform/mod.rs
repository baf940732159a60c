//! Image transform request pipeline
//!
//! Turns query parameters into [`TransformOptions`], identifies the input
//! buffer's MIME type and drives a [`TransformEngine`] over a [`Resource`].
//!
//! # Example
//!
//! ```no_run
//! use image_service::transform::{
//!     process_image, BufferResource, ImageConfig, RasterEngine, TransformOptions,
//! };
//!
//! let config = ImageConfig::default();
//! let engine = RasterEngine::new(&config);
//! let options = TransformOptions::from_query_string("w=800&h=600&fit=cover&fm=webp");
//!
//! let mut resource = BufferResource::new(std::fs::read("photo.jpg").unwrap());
//! process_image(&mut resource, &options, &engine, &config).unwrap();
//! assert_eq!(resource.mime_type, "image/webp");
//! ```

pub mod colors;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod format;
pub mod options;
pub mod params;
pub mod processor;
pub mod resource;
pub mod sniff;

pub use config::ImageConfig;
pub use engine::{CropArea, EngineOptions, RasterEngine, TransformEngine};
pub use error::ImageError;
pub use format::{determine_image_type, is_svg_image, ImageType};
pub use options::{Angle, ColorSpec, CropSpec, FitMode, TransformOptions};
pub use params::{parse_params, parse_query_string, ParamKind, ParamValue};
pub use processor::{engine_options, output_mime_type, process, process_image, TransformResult};
pub use resource::{BufferResource, FileResource, Resource};
pub use sniff::{resolve_mime_type, resolve_mime_type_with};
