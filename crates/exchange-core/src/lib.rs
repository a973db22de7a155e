// exchange-core/src/lib.rs

//! Shared primitives for the two-asset exchange
//!
//! This crate provides:
//! - Arbitrary precision token amounts with explicit floor/ceil division
//! - Account addresses
//! - Journaled state with nested checkpoint/commit/rollback
//! - The atomic unit every public exchange operation runs inside

pub mod address;
pub mod journal;
pub mod types;

pub use address::Address;
pub use journal::{atomically, JournaledMap, Transactional};
pub use types::Amount;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while parsing or constructing core values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
