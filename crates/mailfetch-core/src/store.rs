//! Lock-guarded state with explicit work scopes.
//!
//! A [`LockableStore`] runs units of work under a shared read lock or an
//! exclusive write lock. Write work can be transactional: it operates on a
//! staged copy that only replaces the stored value on commit.
//!
//! Nesting is explicit. Code that already holds a [`WorkScope`] passes a
//! [`NestedScope`] down instead of locking again, which would deadlock on
//! the write lock. A nested scope never starts a transaction of its own; its
//! changes belong to the enclosing scope.
//!
//! # Example
//!
//! ```
//! use mailfetch_core::{LockMode, LockableStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> mailfetch_core::Result<()> {
//! let store = LockableStore::new(Vec::<u32>::new());
//!
//! let mut scope = store.begin(LockMode::Write, true).await;
//! scope.write(|items| {
//!     items.push(1);
//!     Ok(())
//! })?;
//! scope.nested().write(|items| {
//!     items.push(2);
//!     Ok(())
//! })?;
//! scope.commit();
//!
//! assert_eq!(store.read(|items| Ok(items.len())).await?, 2);
//! # Ok(())
//! # }
//! ```

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

/// Which lock a scope holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared; any number of readers at once.
    Read,
    /// Exclusive.
    Write,
}

/// State shared between tasks behind a read/write lock.
#[derive(Debug, Default)]
pub struct LockableStore<S> {
    state: RwLock<S>,
}

impl<S: Clone> LockableStore<S> {
    /// Wraps `state`.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Runs `work` under the read lock.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub async fn read<T>(&self, work: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        self.begin(LockMode::Read, false).await.read(work)
    }

    /// Runs `work` under the write lock, changing the state in place.
    ///
    /// Changes made before `work` fails are kept.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub async fn write<T>(&self, work: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        self.begin(LockMode::Write, false).await.write(work)
    }

    /// Runs `work` under the write lock and keeps its changes only if it
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub async fn transaction<T>(&self, work: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let mut scope = self.begin(LockMode::Write, true).await;
        let value = scope.write(work)?;
        scope.commit();
        Ok(value)
    }

    /// Acquires a lock and returns the scope holding it.
    ///
    /// A transactional read scope is a plain read scope. A transactional
    /// write scope rolls back unless [`WorkScope::commit`] is called.
    pub async fn begin(&self, mode: LockMode, transactional: bool) -> WorkScope<'_, S> {
        let held = match mode {
            LockMode::Read => Held::Read(self.state.read().await),
            LockMode::Write if transactional => {
                let guard = self.state.write().await;
                let staged = guard.clone();
                Held::Transaction { guard, staged }
            }
            LockMode::Write => Held::Write(self.state.write().await),
        };
        tracing::trace!(?mode, transactional, "work scope started");
        WorkScope { held: Some(held) }
    }

    /// Consumes the store and returns the state.
    pub fn into_inner(self) -> S {
        self.state.into_inner()
    }
}

enum Held<'a, S> {
    Read(RwLockReadGuard<'a, S>),
    Write(RwLockWriteGuard<'a, S>),
    Transaction {
        guard: RwLockWriteGuard<'a, S>,
        staged: S,
    },
}

/// A held lock, the execution context for units of work.
///
/// Dropping an uncommitted transactional scope discards its changes.
pub struct WorkScope<'a, S> {
    held: Option<Held<'a, S>>,
}

impl<S> WorkScope<'_, S> {
    /// Returns the lock this scope holds.
    #[must_use]
    pub const fn mode(&self) -> LockMode {
        match self.held {
            Some(Held::Read(_)) | None => LockMode::Read,
            Some(Held::Write(_) | Held::Transaction { .. }) => LockMode::Write,
        }
    }

    /// Returns true if changes wait for [`WorkScope::commit`].
    #[must_use]
    pub const fn is_transactional(&self) -> bool {
        matches!(self.held, Some(Held::Transaction { .. }))
    }

    /// Runs `work` against the state as this scope sees it.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub fn read<T>(&self, work: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        match &self.held {
            Some(Held::Read(guard)) => work(&**guard),
            Some(Held::Write(guard)) => work(&**guard),
            Some(Held::Transaction { staged, .. }) => work(staged),
            None => Err(Error::ReadOnly),
        }
    }

    /// Runs `work` with mutable access to the state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] in a read scope, or the error of `work`.
    pub fn write<T>(&mut self, work: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        self.nested().write(work)
    }

    /// Returns a scope for callees that reuses this lock.
    pub fn nested(&mut self) -> NestedScope<'_, S> {
        let access = match &mut self.held {
            Some(Held::Read(guard)) => Access::Read(&**guard),
            Some(Held::Write(guard)) => Access::Write(&mut **guard),
            Some(Held::Transaction { staged, .. }) => Access::Write(staged),
            None => Access::Closed,
        };
        NestedScope { access }
    }

    /// Publishes the changes of a transactional scope and releases the lock.
    ///
    /// For other scopes this only releases the lock.
    pub fn commit(mut self) {
        if let Some(Held::Transaction { mut guard, staged }) = self.held.take() {
            *guard = staged;
            tracing::trace!("work scope committed");
        }
    }
}

impl<S> Drop for WorkScope<'_, S> {
    fn drop(&mut self) {
        if let Some(Held::Transaction { .. }) = self.held.take() {
            tracing::debug!("work scope dropped without commit, rolling back");
        }
    }
}

impl<S> std::fmt::Debug for WorkScope<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkScope")
            .field("mode", &self.mode())
            .field("transactional", &self.is_transactional())
            .finish()
    }
}

enum Access<'s, S> {
    Read(&'s S),
    Write(&'s mut S),
    Closed,
}

/// A scope borrowed from an enclosing one.
///
/// It has no commit of its own: changes are published or rolled back with
/// the outermost [`WorkScope`].
pub struct NestedScope<'s, S> {
    access: Access<'s, S>,
}

impl<S> NestedScope<'_, S> {
    /// Runs `work` against the state.
    ///
    /// # Errors
    ///
    /// Returns the error of `work`.
    pub fn read<T>(&self, work: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        match &self.access {
            Access::Read(state) => work(*state),
            Access::Write(state) => work(&**state),
            Access::Closed => Err(Error::ReadOnly),
        }
    }

    /// Runs `work` with mutable access to the state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] under a read lock, or the error of `work`.
    pub fn write<T>(&mut self, work: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        match &mut self.access {
            Access::Write(state) => work(&mut **state),
            Access::Read(_) | Access::Closed => Err(Error::ReadOnly),
        }
    }

    /// Returns a scope for a further callee, still on the same lock.
    pub fn nested(&mut self) -> NestedScope<'_, S> {
        let access = match &mut self.access {
            Access::Read(state) => Access::Read(&**state),
            Access::Write(state) => Access::Write(&mut **state),
            Access::Closed => Access::Closed,
        };
        NestedScope { access }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn push(value: u32) -> impl FnOnce(&mut Vec<u32>) -> Result<()> {
        move |items| {
            items.push(value);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_read_and_write() {
        let store = LockableStore::new(vec![1_u32]);

        store.write(push(2)).await.unwrap();
        let items = store.read(|items| Ok(items.clone())).await.unwrap();

        assert_eq!(items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_plain_write_keeps_partial_changes() {
        let store = LockableStore::new(Vec::<u32>::new());

        let result: Result<()> = store
            .write(|items| {
                items.push(1);
                Err(Error::work("disk full"))
            })
            .await;

        assert!(matches!(result, Err(Error::Work(_))));
        assert_eq!(store.into_inner(), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_transaction_rolls_back() {
        let store = LockableStore::new(vec![1_u32]);

        let result: Result<()> = store
            .transaction(|items| {
                items.push(2);
                Err(Error::work("constraint violated"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.into_inner(), vec![1]);
    }

    #[tokio::test]
    async fn test_dropped_scope_rolls_back() {
        let store = LockableStore::new(Vec::<u32>::new());

        {
            let mut scope = store.begin(LockMode::Write, true).await;
            scope.write(push(7)).unwrap();
            assert_eq!(scope.read(|items| Ok(items.len())).unwrap(), 1);
        }

        assert!(store.read(|items| Ok(items.is_empty())).await.unwrap());
    }

    #[tokio::test]
    async fn test_uncommitted_changes_are_invisible_until_commit() {
        let store = LockableStore::new(Vec::<u32>::new());

        let mut scope = store.begin(LockMode::Write, true).await;
        scope.write(push(1)).unwrap();
        scope.commit();

        assert_eq!(store.into_inner(), vec![1]);
    }

    #[tokio::test]
    async fn test_nested_scope_joins_outer_transaction() {
        let store = LockableStore::new(Vec::<u32>::new());

        let mut scope = store.begin(LockMode::Write, true).await;
        {
            let mut nested = scope.nested();
            nested.write(push(1)).unwrap();
            nested.nested().write(push(2)).unwrap();
        }
        drop(scope);

        assert!(store.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_read_scope_rejects_writes() {
        let store = LockableStore::new(vec![3_u32]);

        let mut scope = store.begin(LockMode::Read, true).await;
        assert_eq!(scope.mode(), LockMode::Read);
        assert!(!scope.is_transactional());
        assert!(matches!(scope.write(push(4)), Err(Error::ReadOnly)));
        assert!(matches!(scope.nested().write(push(4)), Err(Error::ReadOnly)));
        assert_eq!(scope.nested().read(|items| Ok(items[0])).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_readers_share_the_lock() {
        let store = LockableStore::new(5_u32);

        let first = store.begin(LockMode::Read, false).await;
        let second = store.begin(LockMode::Read, false).await;

        assert_eq!(first.read(|v| Ok(*v)).unwrap(), 5);
        assert_eq!(second.read(|v| Ok(*v)).unwrap(), 5);
    }
}
