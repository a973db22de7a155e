// liquidity/src/guard.rs

use crate::{LiquidityError, LiquidityResult};
use std::cell::Cell;

/// Mutual exclusion flag for pool entry points
///
/// Execution is strictly serialized, so this never blocks: a second entry
/// while the flag is held can only be a re-entrant call from inside a running
/// operation (e.g. a ledger callback), and it fails immediately.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    locked: Cell<bool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or fail with `Reentrant` if an operation is running
    pub fn acquire(&self) -> LiquidityResult<LockGuard<'_>> {
        if self.locked.replace(true) {
            return Err(LiquidityError::Reentrant);
        }
        Ok(LockGuard { guard: self })
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

/// Releases the lock when dropped, on every exit path
#[derive(Debug)]
pub struct LockGuard<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.guard.locked.set(false);
    }
}
