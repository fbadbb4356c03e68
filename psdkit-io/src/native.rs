//! Reference storage adapter backed by the local filesystem.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use psdkit_core::{Error, Result};

use crate::operation::{ReadOperation, WriteOperation};
use crate::storage::Storage;

/// Synchronous [`Storage`] adapter over [`std::fs::File`].
///
/// Every issued operation completes before the issuing call returns; the
/// handle is resolved immediately and `wait` merely consumes it. Known
/// asymmetry inherited from the contract: a read that hits end-of-file
/// mid-transfer is reported successful with a short buffer, so callers that
/// care about exact transfer counts must check the returned length.
#[derive(Debug, Default)]
pub struct NativeFile {
    file: Option<fs::File>,
    readable: bool,
}

impl NativeFile {
    /// Create a closed adapter.
    pub fn new() -> Self {
        NativeFile {
            file: None,
            readable: false,
        }
    }

    fn read_at(&mut self, len: usize, position: u64) -> Result<Vec<u8>> {
        let file = self.file.as_mut().ok_or(Error::NotOpen)?;
        file.seek(SeekFrom::Start(position))?;

        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_at(&mut self, data: &[u8], position: u64) -> Result<()> {
        let file = self.file.as_mut().ok_or(Error::NotOpen)?;
        file.seek(SeekFrom::Start(position))?;
        file.write_all(data)?;
        Ok(())
    }
}

impl Storage for NativeFile {
    fn open_read(&mut self, path: &Path) -> Result<()> {
        if self.file.is_some() {
            self.close()?;
        }
        self.file = Some(fs::File::open(path)?);
        self.readable = true;
        Ok(())
    }

    fn open_write(&mut self, path: &Path) -> Result<()> {
        if self.file.is_some() {
            self.close()?;
        }
        self.file = Some(fs::File::create(path)?);
        self.readable = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
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
        if !self.readable {
            return 0;
        }
        let Some(file) = self.file.as_mut() else {
            return 0;
        };

        let Ok(original) = file.stream_position() else {
            return 0;
        };
        let size = file.seek(SeekFrom::End(0)).unwrap_or(0);
        if file.seek(SeekFrom::Start(original)).is_err() {
            tracing::warn!("failed to restore stream position after size query");
            return 0;
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.bin");

        let mut storage = NativeFile::new();
        storage.open_write(&path).unwrap();
        storage
            .issue_write(vec![1, 2, 3, 4, 5], 0)
            .wait()
            .unwrap();
        storage.close().unwrap();

        storage.open_read(&path).unwrap();
        let bytes = storage.issue_read(5, 0).wait().unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_out_of_order_write_backpatches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backpatch.bin");

        let mut storage = NativeFile::new();
        storage.open_write(&path).unwrap();
        storage.issue_write(vec![0, 0, 0, 0], 0).wait().unwrap();
        storage.issue_write(vec![9, 9], 4).wait().unwrap();
        // Overwrite the placeholder after later content exists.
        storage.issue_write(vec![7, 7, 7, 7], 0).wait().unwrap();
        storage.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![7, 7, 7, 7, 9, 9]);
    }

    #[test]
    fn test_short_read_is_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        let mut storage = NativeFile::new();
        storage.open_read(&path).unwrap();
        let bytes = storage.issue_read(10, 1).wait().unwrap();
        assert_eq!(bytes, vec![2, 3]);
    }

    #[test]
    fn test_non_open_operations_fail() {
        let mut storage = NativeFile::new();
        assert!(matches!(
            storage.issue_read(16, 0).wait(),
            Err(Error::NotOpen)
        ));
        assert!(matches!(
            storage.issue_write(vec![1], 0).wait(),
            Err(Error::NotOpen)
        ));
        assert_eq!(storage.size(), 0);
    }

    #[test]
    fn test_size_preserves_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("size.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let mut storage = NativeFile::new();
        storage.open_read(&path).unwrap();

        // Move the cursor by reading, then query the size.
        let _ = storage.issue_read(10, 10).wait().unwrap();
        let before = storage
            .file
            .as_mut()
            .unwrap()
            .stream_position()
            .unwrap();
        assert_eq!(storage.size(), 64);
        let after = storage.file.as_mut().unwrap().stream_position().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_size_zero_when_open_for_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wsize.bin");

        let mut storage = NativeFile::new();
        storage.open_write(&path).unwrap();
        storage.issue_write(vec![0u8; 32], 0).wait().unwrap();
        assert_eq!(storage.size(), 0);
    }

    #[test]
    fn test_reopen_closes_previous() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("second.bin");
        std::fs::write(&first, [1u8; 4]).unwrap();
        std::fs::write(&second, [2u8; 8]).unwrap();

        let mut storage = NativeFile::new();
        storage.open_read(&first).unwrap();
        storage.open_read(&second).unwrap();
        assert_eq!(storage.size(), 8);
        let bytes = storage.issue_read(8, 0).wait().unwrap();
        assert_eq!(bytes, vec![2u8; 8]);
    }
}
