//! In-memory storage adapter.

use std::path::Path;

use psdkit_core::{Error, Result};

use crate::operation::{ReadOperation, WriteOperation};
use crate::storage::Storage;

/// [`Storage`] adapter over a growable byte buffer.
///
/// Demonstrates the medium-substitution point of the storage capability and
/// backs the serializer tests. Writes past the current end zero-fill the
/// gap, so out-of-order section emission behaves as it does on a file.
#[derive(Debug, Default)]
pub struct MemoryFile {
    data: Vec<u8>,
    open: bool,
    readable: bool,
}

impl MemoryFile {
    /// Create a closed, empty adapter.
    pub fn new() -> Self {
        MemoryFile::default()
    }

    /// Borrow the bytes written so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the adapter, returning the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn read_at(&mut self, len: usize, position: u64) -> Result<Vec<u8>> {
        if !self.open {
            return Err(Error::NotOpen);
        }
        let start = (position as usize).min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn write_at(&mut self, data: &[u8], position: u64) -> Result<()> {
        if !self.open {
            return Err(Error::NotOpen);
        }
        let start = position as usize;
        let end = start + data.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);
        Ok(())
    }
}

impl Storage for MemoryFile {
    fn open_read(&mut self, _path: &Path) -> Result<()> {
        self.open = true;
        self.readable = true;
        Ok(())
    }

    fn open_write(&mut self, _path: &Path) -> Result<()> {
        self.open = true;
        self.readable = false;
        self.data.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.readable = false;
        Ok(())
    }

    fn issue_read(&mut self, len: usize, position: u64) -> ReadOperation {
        ReadOperation::completed(self.read_at(len, position))
    }

    fn issue_write(&mut self, data: Vec<u8>, position: u64) -> WriteOperation {
        WriteOperation::completed(self.write_at(&data, position))
    }

    fn size(&mut self) -> u64 {
        if self.open && self.readable {
            self.data.len() as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_for_write() -> MemoryFile {
        let mut storage = MemoryFile::new();
        storage.open_write(Path::new("mem")).unwrap();
        storage
    }

    #[test]
    fn test_sparse_write_zero_fills() {
        let mut storage = open_for_write();
        storage.issue_write(vec![5, 6], 4).wait().unwrap();
        assert_eq!(storage.data(), &[0, 0, 0, 0, 5, 6]);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut storage = open_for_write();
        storage.issue_write(vec![1, 2, 3, 4], 0).wait().unwrap();
        storage.issue_write(vec![9], 1).wait().unwrap();
        assert_eq!(storage.data(), &[1, 9, 3, 4]);
    }

    #[test]
    fn test_read_clamps_to_end() {
        let mut storage = open_for_write();
        storage.issue_write(vec![1, 2, 3], 0).wait().unwrap();
        storage.open_read(Path::new("mem")).unwrap();
        assert_eq!(storage.issue_read(10, 1).wait().unwrap(), vec![2, 3]);
        assert_eq!(storage.issue_read(4, 100).wait().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_closed_adapter_fails() {
        let mut storage = MemoryFile::new();
        assert!(storage.issue_write(vec![1], 0).wait().is_err());
        assert!(storage.issue_read(1, 0).wait().is_err());
        assert_eq!(storage.size(), 0);
    }

    #[test]
    fn test_open_read_keeps_data() {
        let mut storage = open_for_write();
        storage.issue_write(vec![1, 2, 3], 0).wait().unwrap();
        storage.open_read(Path::new("mem")).unwrap();
        assert_eq!(storage.size(), 3);
    }
}
