//! The read primitive behind every reload.
//!
//! [`FsReader`] reads the file as UTF-8 text. Any `Fn(&Path) -> io::Result<String>`
//! closure is also a [`FileReader`], which is how callers decode other
//! encodings or substitute a fake in tests.

use std::io;
use std::path::Path;

/// Reads the full content of the watched file.
///
/// Called once at construction and once per accepted trigger, each time on
/// a dedicated read thread.
pub trait FileReader: Send + Sync + 'static {
    /// Read the file at `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error. It is reported through the `error` handler and the
    /// cached content is left as it was.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads files from the local filesystem as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl<F> FileReader for F
where
    F: Fn(&Path) -> io::Result<String> + Send + Sync + 'static,
{
    fn read(&self, path: &Path) -> io::Result<String> {
        self(path)
    }
}
