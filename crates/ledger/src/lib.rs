// ledger/src/lib.rs

//! Fungible asset ledgers consumed by the exchange
//!
//! This crate implements the collaborator side of the pool:
//! - `AssetLedger`: the capability interface the pool talks to
//! - `TaxPolicy`: flat transfer tax applied by the ledger itself
//! - `TokenLedger`: in-memory ledger with balances, allowances and tax

pub mod asset;
pub mod tax;
pub mod token;

pub use asset::AssetLedger;
pub use tax::{TaxConfig, TaxPolicy};
pub use token::TokenLedger;

use exchange_core::{Address, Amount};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in ledger operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient balance: {holder} holds {available}, needs {required}")]
    InsufficientBalance {
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance: {spender} may spend {available}, needs {required}")]
    InsufficientAllowance {
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
