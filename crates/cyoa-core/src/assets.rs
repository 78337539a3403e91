//! Story files and the assets they reference
//!
//! Asset names are relative to the story directory. An [`Asset`] is an open
//! handle: whoever holds it owns the bytes, and dropping it closes it.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use log::{debug, info};

use crate::error::StoryError;

/// An opened background image or sound.
pub struct Asset {
    name: String,
    data: Vec<u8>,
}

impl Asset {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl core::fmt::Debug for Asset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for Asset {
    fn drop(&mut self) {
        debug!("Closed asset {}", self.name);
    }
}

/// Read-only access to a story directory.
pub trait AssetSource {
    /// Read a whole file. Missing files are [`StoryError::AssetLoad`].
    fn read(&mut self, name: &str) -> Result<Vec<u8>, StoryError>;

    /// Open a file as an owned handle.
    fn open(&mut self, name: &str) -> Result<Asset, StoryError> {
        let data = self.read(name)?;
        info!("Opened asset {} ({} bytes)", name, data.len());
        Ok(Asset::new(name, data))
    }
}

impl<T: AssetSource + ?Sized> AssetSource for &mut T {
    fn read(&mut self, name: &str) -> Result<Vec<u8>, StoryError> {
        (**self).read(name)
    }
}

/// A story directory held in memory, e.g. built from `include_bytes!`.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(name.to_string(), data.into());
    }
}

impl AssetSource for MemorySource {
    fn read(&mut self, name: &str) -> Result<Vec<u8>, StoryError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| StoryError::asset(name, "file not found"))
    }
}
