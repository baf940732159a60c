// Constants module - centralized default values for configuration
//
// Defaults used by the configuration layer and the bundled engine live here
// rather than as magic numbers at their use sites.

// =============================================================================
// Output limits
// =============================================================================

/// Default maximum output width in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 4096;

/// Default maximum output height in pixels
pub const DEFAULT_MAX_HEIGHT: u32 = 4096;

/// Default quality for lossy encoders when the request leaves `q` unset
pub const DEFAULT_IMAGE_QUALITY: u8 = 80;

// =============================================================================
// Source limits (image bomb protection)
// =============================================================================

/// Default maximum source width in pixels
pub const DEFAULT_MAX_SOURCE_WIDTH: u32 = 10_000;

/// Default maximum source height in pixels
pub const DEFAULT_MAX_SOURCE_HEIGHT: u32 = 10_000;

/// Default maximum decoded source size (100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;

/// Default maximum input buffer size (50 MB)
pub const DEFAULT_MAX_SOURCE_FILE_SIZE: usize = 50 * 1024 * 1024;

// =============================================================================
// Input validation
// =============================================================================

/// MIME types the bundled engine can decode
pub const DEFAULT_SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/tiff",
];

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";
