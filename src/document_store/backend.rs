//! # Byte Sink Trait

use std::io::Read;

use super::errors::DocumentResult;

/// Readable content handle returned by a byte sink
pub type ContentHandle = Box<dyn Read + Send>;

/// Path-addressed content storage
pub trait ByteSink: Send + Sync + std::fmt::Debug {
    /// Copy `reader` to `path`, replacing any existing content.
    /// Returns the number of bytes written.
    fn write_all(&self, path: &str, reader: &mut dyn Read) -> DocumentResult<u64>;

    /// Delete the file at path. Fails with `FileMissing` if absent.
    fn delete(&self, path: &str) -> DocumentResult<()>;

    /// Open path for reading; `None` if absent or unreadable
    fn open_readable(&self, path: &str) -> DocumentResult<Option<ContentHandle>>;

    /// Length of the file at path; `None` if absent
    fn file_len(&self, path: &str) -> DocumentResult<Option<u64>>;
}
