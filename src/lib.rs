//! Query-driven image transformation
//!
//! [`transform`] holds the request pipeline and the bundled raster engine.
//! [`config`] loads YAML settings, [`logging`] installs the tracing
//! subscriber and [`constants`] collects the defaults both share.

pub mod config;
pub mod constants;
pub mod logging;
pub mod transform;
