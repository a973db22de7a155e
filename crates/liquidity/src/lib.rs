// liquidity/src/lib.rs

//! Constant-product liquidity pool and router
//!
//! This crate implements the exchange core:
//! - `LiquidityPool`: reserves, liquidity shares and the mint/burn/swap primitives
//! - `Router`: slippage-guarded orchestration and quoting on top of the pool
//!
//! Every public operation runs as one atomic unit over the pool and both
//! asset ledgers, behind a reentrancy guard.

pub mod config;
pub mod events;
pub mod guard;
pub mod math;
pub mod pool;
pub mod router;

pub use config::PoolConfig;
pub use events::PoolEvent;
pub use guard::{LockGuard, ReentrancyGuard};
pub use pool::{BurnOutcome, LiquidityPool, MintOutcome, SwapDirection, SwapOutcome};
pub use router::{LiquidityQuote, Router};

use exchange_core::Amount;
use ledger::LedgerError;

/// Result type for liquidity operations
pub type LiquidityResult<T> = Result<T, LiquidityError>;

/// Errors that can occur in liquidity operations
///
/// Every error is terminal for the operation that raised it; the atomic unit
/// around the operation has already been rolled back when the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiquidityError {
    #[error("Zero input")]
    ZeroInput,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: Amount, available: Amount },

    #[error("Non-matching value: required {required}, supplied {supplied}")]
    NonMatchingValue { required: Amount, supplied: Amount },

    #[error("Below minimum liquidity: {liquidity} does not exceed {minimum}")]
    BelowMinimumLiquidity { liquidity: Amount, minimum: Amount },

    #[error("Below min: minted {minted}, minimum {minimum}")]
    BelowMin { minted: Amount, minimum: Amount },

    #[error("Slippage exceeded: realized {realized}, minimum {minimum}")]
    SlippageExceeded { realized: Amount, minimum: Amount },

    #[error("Zero trade")]
    ZeroTrade,

    #[error("Reentrant call")]
    Reentrant,

    #[error("Transfer failed: {0}")]
    Transfer(#[from] LedgerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
