//! Storage capability trait.

use std::path::Path;

use psdkit_core::Result;

use crate::operation::{ReadOperation, WriteOperation};

/// Positioned, length-bounded read/write capability with an issue/wait
/// completion protocol.
///
/// Positions are absolute byte offsets, so writes may land out of order;
/// the serializer relies on this to backpatch section length fields after
/// emitting the variable-length content that follows them.
///
/// Buffers cross this boundary by value: a write consumes its data at issue
/// time and a read yields a fresh buffer at wait time, so no alias into
/// caller memory outlives the issuing call. That is what allows an adapter
/// to run the transfer on another thread of control and resolve the handle
/// later. There is no cancellation primitive; once issued, an operation
/// runs to completion or failure.
pub trait Storage {
    /// Open the named resource for reading. An already-open instance is
    /// implicitly closed first.
    fn open_read(&mut self, path: &Path) -> Result<()>;

    /// Open the named resource for writing, truncating any previous
    /// content. An already-open instance is implicitly closed first.
    fn open_write(&mut self, path: &Path) -> Result<()>;

    /// Close the resource. Closing a non-open instance is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Issue a read of up to `len` bytes at the absolute `position`.
    ///
    /// A read that crosses the end of the resource still completes
    /// successfully with a short buffer; adapters do not distinguish
    /// partial transfers from full ones. Issuing against a non-open
    /// instance yields a handle that fails without side effects.
    fn issue_read(&mut self, len: usize, position: u64) -> ReadOperation;

    /// Issue a write of `data` at the absolute `position`.
    ///
    /// Issuing against a non-open instance yields a handle that fails
    /// without side effects.
    fn issue_write(&mut self, data: Vec<u8>, position: u64) -> WriteOperation;

    /// Size of the resource in bytes. Meaningful only while open for
    /// reading; returns 0 (rather than an error) when the size cannot be
    /// determined. Must leave the stream cursor where it was.
    fn size(&mut self) -> u64;
}
