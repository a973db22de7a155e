// liquidity/src/events.rs

use exchange_core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Observable side effects of committed pool operations
///
/// Amounts are what the counterparty experiences: the nominal amount it sent
/// in and the amount it actually received out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    Mint {
        provider: Address,
        amount_a_in: Amount,
        amount_b_in: Amount,
        shares_out: Amount,
    },
    Burn {
        provider: Address,
        amount_a_out: Amount,
        amount_b_out: Amount,
        shares_in: Amount,
    },
    /// Exactly one non-zero `*_in` and one non-zero `*_out`
    Swap {
        trader: Address,
        a_in: Amount,
        b_in: Amount,
        a_out: Amount,
        b_out: Amount,
    },
    Sync {
        reserve_a: Amount,
        reserve_b: Amount,
    },
    SharesTransferred {
        from: Address,
        to: Address,
        amount: Amount,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::Mint { .. } => "Mint",
            PoolEvent::Burn { .. } => "Burn",
            PoolEvent::Swap { .. } => "Swap",
            PoolEvent::Sync { .. } => "Sync",
            PoolEvent::SharesTransferred { .. } => "SharesTransferred",
        }
    }
}
