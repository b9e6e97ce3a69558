use std::{fs, marker::PhantomData, path::PathBuf};

/// Enum of possible operations to rollback
#[derive(Debug)]
pub enum RollbackOperation {
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
    /// Put back the bytes and permissions a file held before it was overwritten.
    RestoreFile {
        path: PathBuf,
        contents: Vec<u8>,
        permissions: fs::Permissions,
    },
}
/// Active Transaction
pub struct Active;
/// Committed Transaction
pub struct Committed;
/// Canceled Transaction
pub struct Canceled;
/// A trait that tells us if rollback should occur when dropped.
pub trait TransactionState {
    const SHOULD_ROLLBACK: bool;
}
impl TransactionState for Active {
    const SHOULD_ROLLBACK: bool = true;
}
impl TransactionState for Committed {
    const SHOULD_ROLLBACK: bool = false;
}
impl TransactionState for Canceled {
    const SHOULD_ROLLBACK: bool = true;
}
/// Tracks what a materialization run changed on disk so it can be undone.
///
/// The state parameter decides what happens on drop. An [`Active`] or
/// [`Canceled`] transaction replays its rollback operations in reverse order;
/// a [`Committed`] one leaves the disk alone.
///
/// Rollback operations include:
/// - [`RollbackOperation::RemoveFile`] for files that did not exist before
/// - [`RollbackOperation::RestoreFile`] for files that were overwritten
/// - [`RollbackOperation::RemoveDir`] for the topmost directory the run created
///
/// # Example
///
/// ```rust
/// use arbor::transactions::{Active, RollbackOperation, Transaction};
///
/// let mut trx = Transaction::<Active>::new();
/// trx.add_operation(RollbackOperation::RemoveFile("some/path".into()));
/// trx.commit(); // No rollback will happen
/// ```
pub struct Transaction<State: TransactionState> {
    rollback_operations: Vec<RollbackOperation>,
    state: PhantomData<State>,
}
impl Transaction<Active> {
    pub fn new() -> Self {
        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
    /// Registers an action to reverse if the transaction is canceled or dropped
    /// without being committed.
    pub fn add_operation(&mut self, operation: RollbackOperation) {
        self.rollback_operations.push(operation);
    }
    /// Number of operations that a rollback would replay.
    pub fn pending(&self) -> usize {
        self.rollback_operations.len()
    }
    /// Finalizes the transaction, preventing any rollback from occurring.
    pub fn commit(mut self) -> Transaction<Committed> {
        self.rollback_operations.clear();

        Transaction {
            rollback_operations: vec![],
            state: PhantomData,
        }
    }
    /// Cancels the transaction. Its rollback operations run when the returned
    /// [`Transaction<Canceled>`] is dropped.
    pub fn cancel(mut self) -> Transaction<Canceled> {
        let rollback_operations = std::mem::take(&mut self.rollback_operations);

        Transaction {
            rollback_operations,
            state: PhantomData,
        }
    }
}
impl<S: TransactionState> Drop for Transaction<S> {
    fn drop(&mut self) {
        if S::SHOULD_ROLLBACK && !self.rollback_operations.is_empty() {
            log::debug!("rolling back {} operations", self.rollback_operations.len());
            while let Some(operation) = self.rollback_operations.pop() {
                match operation {
                    RollbackOperation::RemoveDir(path) => {
                        log::debug!("removing dir: {}", path.display());
                        let _ = fs::remove_dir_all(&path);
                    }
                    RollbackOperation::RemoveFile(path) => {
                        log::debug!("removing file: {}", path.display());
                        let _ = fs::remove_file(&path);
                    }
                    RollbackOperation::RestoreFile {
                        path,
                        contents,
                        permissions,
                    } => {
                        log::debug!("restoring file: {}", path.display());
                        // recreate rather than write through a mode this run may have set
                        let _ = fs::remove_file(&path);
                        let restored = fs::write(&path, contents)
                            .and_then(|()| fs::set_permissions(&path, permissions));
                        if let Err(error) = restored {
                            log::warn!("could not restore {}: {}", path.display(), error);
                        }
                    }
                }
            }
        } else if !S::SHOULD_ROLLBACK {
            log::debug!("committing transaction");
        }
    }
}
