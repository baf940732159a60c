//! Input resources for the transform pipeline
//!
//! A resource is owned by the caller. The pipeline reads it once and, only
//! when the transform succeeds, overwrites its body and MIME type in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of input bytes and destination of the transformed result
pub trait Resource {
    /// Read the input bytes
    fn read(&mut self) -> io::Result<Vec<u8>>;

    /// Replace the body and MIME type with a transform result
    fn store(&mut self, body: Vec<u8>, mime_type: String);
}

/// Resource backed by an in-memory buffer
#[derive(Debug, Clone, Default)]
pub struct BufferResource {
    pub body: Vec<u8>,
    pub mime_type: String,
}

impl BufferResource {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            mime_type: String::new(),
        }
    }
}

impl Resource for BufferResource {
    fn read(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.body.clone())
    }

    fn store(&mut self, body: Vec<u8>, mime_type: String) {
        self.body = body;
        self.mime_type = mime_type;
    }
}

/// Resource read from a file on disk
///
/// `body` stays empty until a transform stores its result.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
    pub body: Vec<u8>,
    pub mime_type: String,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            body: Vec::new(),
            mime_type: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileResource {
    fn read(&mut self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn store(&mut self, body: Vec<u8>, mime_type: String) {
        self.body = body;
        self.mime_type = mime_type;
    }
}
