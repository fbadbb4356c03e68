//! Completion handles for issued storage operations.
//!
//! A handle is waited on at most once; waiting consumes it, which is how the
//! single-wait contract is enforced. Synchronous adapters resolve the handle
//! before returning it, asynchronous adapters keep the sending half and
//! complete it from their own execution context.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use psdkit_core::{Error, Result};

/// Handle for an issued write.
#[derive(Debug)]
pub struct WriteOperation {
    receiver: Receiver<Result<()>>,
}

impl WriteOperation {
    /// Create a pending operation plus the completion side an adapter uses
    /// to resolve it.
    pub fn pending() -> (Self, SyncSender<Result<()>>) {
        let (sender, receiver) = sync_channel(1);
        (WriteOperation { receiver }, sender)
    }

    /// Create an operation that is already complete.
    pub fn completed(result: Result<()>) -> Self {
        let (operation, sender) = Self::pending();
        // Buffered channel of one: this send cannot block.
        let _ = sender.send(result);
        operation
    }

    /// Block until the operation is known complete and return its outcome.
    ///
    /// Consumes the handle; an operation cannot be waited on twice. If the
    /// adapter dropped the completion side without resolving it, the
    /// operation is reported as failed.
    pub fn wait(self) -> Result<()> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::storage("write operation abandoned by adapter")),
        }
    }
}

/// Handle for an issued read. Waiting yields the bytes transferred.
#[derive(Debug)]
pub struct ReadOperation {
    receiver: Receiver<Result<Vec<u8>>>,
}

impl ReadOperation {
    /// Create a pending operation plus the completion side an adapter uses
    /// to resolve it.
    pub fn pending() -> (Self, SyncSender<Result<Vec<u8>>>) {
        let (sender, receiver) = sync_channel(1);
        (ReadOperation { receiver }, sender)
    }

    /// Create an operation that is already complete.
    pub fn completed(result: Result<Vec<u8>>) -> Self {
        let (operation, sender) = Self::pending();
        let _ = sender.send(result);
        operation
    }

    /// Block until the operation is known complete and return the bytes.
    ///
    /// The buffer may be shorter than requested when the read crossed the
    /// end of the resource; see [`crate::Storage::issue_read`].
    pub fn wait(self) -> Result<Vec<u8>> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::storage("read operation abandoned by adapter")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_completed_write() {
        let operation = WriteOperation::completed(Ok(()));
        assert!(operation.wait().is_ok());
    }

    #[test]
    fn test_completed_failure() {
        let operation = WriteOperation::completed(Err(Error::NotOpen));
        assert!(matches!(operation.wait(), Err(Error::NotOpen)));
    }

    #[test]
    fn test_abandoned_operation_fails() {
        let (operation, sender) = WriteOperation::pending();
        drop(sender);
        assert!(operation.wait().is_err());
    }

    #[test]
    fn test_wait_blocks_for_deferred_completion() {
        let (operation, sender) = ReadOperation::pending();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let _ = sender.send(Ok(vec![1, 2, 3]));
        });
        assert_eq!(operation.wait().unwrap(), vec![1, 2, 3]);
        worker.join().unwrap();
    }
}
