//! Byte providers for tile source images.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supplies the encoded bytes of a tile source image.
///
/// Reads are blocking; the renderer calls this at most once per tileset
/// image (or once per tile file for collection tilesets).
pub trait ImageSource {
    /// Encoded bytes of the image at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads images straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSource;

impl ImageSource for FsImageSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Images held in memory, keyed by the path the tileset resolves to.
#[derive(Debug, Default)]
pub struct MemoryImageSource {
    files: HashMap<PathBuf, Vec<u8>>,
    reads: Cell<usize>,
}

impl MemoryImageSource {
    /// Source with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `path`, replacing any earlier entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    /// Builder form of [`MemoryImageSource::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Number of successful reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl ImageSource for MemoryImageSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let bytes = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory image at {}", path.display()),
            )
        })?;
        self.reads.set(self.reads.get() + 1);
        Ok(bytes)
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }
}
