//! # psdkit I/O
//!
//! The storage capability the PSD serializer writes through.
//!
//! The [`Storage`] trait models positioned, length-bounded reads and writes
//! against a named resource with an issue/wait completion protocol: issuing
//! an operation yields a handle, and waiting on the handle (once) yields the
//! outcome. The trait is asynchronous-capable (an adapter may run the
//! transfer on another thread of control and complete the handle later),
//! while [`NativeFile`], the reference adapter, completes every operation
//! before the issuing call returns.
//!
//! [`MemoryFile`] substitutes an in-memory medium behind the same contract,
//! which the serializer tests rely on.

pub mod operation;
pub mod storage;
pub mod native;
pub mod memory;

pub use operation::{ReadOperation, WriteOperation};
pub use storage::Storage;
pub use native::NativeFile;
pub use memory::MemoryFile;
