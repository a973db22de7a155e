// liquidity/src/router.rs

use crate::{
    math, BurnOutcome, LiquidityError, LiquidityPool, LiquidityResult, MintOutcome, SwapDirection,
    SwapOutcome,
};
use exchange_core::{atomically, Address, Amount, Transactional};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub use crate::math::min_after_slippage;

/// What a deposit would cost and earn at current reserves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityQuote {
    /// Asset B the pool would take alongside the offered asset A
    pub amount_b_required: Amount,
    pub shares: Amount,
}

/// Slippage-guarded entry point to a pool
///
/// The router pre-computes nothing binding: it runs the pool operation, then
/// compares what the caller actually received against the caller's minimum.
/// A shortfall aborts the whole unit, pool operation included.
pub struct Router {
    pool: Rc<LiquidityPool>,
}

impl Router {
    pub fn new(pool: Rc<LiquidityPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &LiquidityPool {
        &self.pool
    }

    /// Swap `amount_in`, failing unless at least `min_amount_out` is delivered
    pub fn swap_exact_in_for_out(
        &self,
        caller: &Address,
        amount_in: &Amount,
        min_amount_out: &Amount,
        direction: SwapDirection,
    ) -> LiquidityResult<SwapOutcome> {
        self.atomically(|| {
            let outcome = self.pool.swap(direction, caller, amount_in)?;
            if &outcome.amount_delivered < min_amount_out {
                return Err(LiquidityError::SlippageExceeded {
                    realized: outcome.amount_delivered,
                    minimum: min_amount_out.clone(),
                });
            }
            Ok(outcome)
        })
    }

    pub fn swap_exact_a_for_b(
        &self,
        caller: &Address,
        amount_in: &Amount,
        min_amount_out: &Amount,
    ) -> LiquidityResult<SwapOutcome> {
        self.swap_exact_in_for_out(caller, amount_in, min_amount_out, SwapDirection::AToB)
    }

    pub fn swap_exact_b_for_a(
        &self,
        caller: &Address,
        amount_in: &Amount,
        min_amount_out: &Amount,
    ) -> LiquidityResult<SwapOutcome> {
        self.swap_exact_in_for_out(caller, amount_in, min_amount_out, SwapDirection::BToA)
    }

    /// Deposit liquidity, failing unless at least `min_shares_out` are minted
    pub fn add_liquidity(
        &self,
        caller: &Address,
        amount_a_desired: &Amount,
        amount_b_desired: &Amount,
        min_shares_out: &Amount,
    ) -> LiquidityResult<MintOutcome> {
        self.atomically(|| {
            let outcome = self.pool.mint(caller, amount_a_desired, amount_b_desired)?;
            if &outcome.shares < min_shares_out {
                return Err(LiquidityError::BelowMin {
                    minted: outcome.shares,
                    minimum: min_shares_out.clone(),
                });
            }
            Ok(outcome)
        })
    }

    /// Burn shares, failing unless both delivered amounts meet their minimums
    pub fn remove_liquidity(
        &self,
        caller: &Address,
        shares: &Amount,
        min_amount_a: &Amount,
        min_amount_b: &Amount,
    ) -> LiquidityResult<BurnOutcome> {
        self.atomically(|| {
            let outcome = self.pool.burn(caller, shares)?;
            if &outcome.delivered_a < min_amount_a {
                return Err(LiquidityError::SlippageExceeded {
                    realized: outcome.delivered_a,
                    minimum: min_amount_a.clone(),
                });
            }
            if &outcome.delivered_b < min_amount_b {
                return Err(LiquidityError::SlippageExceeded {
                    realized: outcome.delivered_b,
                    minimum: min_amount_b.clone(),
                });
            }
            Ok(outcome)
        })
    }

    /// Amount a swap of `amount_in` would deliver right now, taxes included
    pub fn quote_swap(&self, direction: SwapDirection, amount_in: &Amount) -> LiquidityResult<Amount> {
        if amount_in.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }
        let (reserve_a, reserve_b) = self.pool.reserves();
        let (reserve_in, reserve_out) = match direction {
            SwapDirection::AToB => (reserve_a, reserve_b),
            SwapDirection::BToA => (reserve_b, reserve_a),
        };
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(LiquidityError::InsufficientLiquidity);
        }

        let (ledger_in, ledger_out) = self.pool.ledgers(direction);
        math::expected_swap_output(
            &reserve_in,
            &reserve_out,
            amount_in,
            self.pool.fee_percent(),
            &ledger_in.tax_policy(),
            &ledger_out.tax_policy(),
        )
        .ok_or(LiquidityError::InsufficientLiquidity)
    }

    /// Asset B and shares for depositing `amount_a` (and `amount_b` on the first deposit)
    pub fn quote_add_liquidity(&self, amount_a: &Amount, amount_b: &Amount) -> LiquidityResult<LiquidityQuote> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let tax_a = self.pool.asset_a().tax_policy();
        let tax_b = self.pool.asset_b().tax_policy();
        let received_a = tax_a.delivered(amount_a);
        let total_shares = self.pool.total_shares();

        if total_shares.is_zero() {
            let liquidity = math::initial_liquidity(&received_a, &tax_b.delivered(amount_b));
            let minimum = self.pool.minimum_liquidity();
            let shares = liquidity
                .checked_sub(minimum)
                .filter(|shares| !shares.is_zero())
                .ok_or_else(|| LiquidityError::BelowMinimumLiquidity {
                    liquidity: liquidity.clone(),
                    minimum: minimum.clone(),
                })?;
            return Ok(LiquidityQuote {
                amount_b_required: amount_b.clone(),
                shares,
            });
        }

        let (reserve_a, reserve_b) = self.pool.reserves();
        let required_b = math::required_counterpart(&received_a, &reserve_a, &reserve_b)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        let shares = math::shares_for_deposit(&received_a, &reserve_a, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        if required_b.is_zero() || shares.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }

        Ok(LiquidityQuote {
            amount_b_required: tax_b.gross_for(&required_b),
            shares,
        })
    }

    /// Amounts of A and B delivered for burning `shares` right now
    ///
    /// Only shares outside the sink can be redeemed, so a request above that
    /// bound fails the same way `burn` would.
    pub fn quote_remove_liquidity(&self, shares: &Amount) -> LiquidityResult<(Amount, Amount)> {
        if shares.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }
        let total_shares = self.pool.total_shares();
        let redeemable = total_shares.saturating_sub(&self.pool.shares_of(self.pool.sink()));
        if shares > &redeemable {
            return Err(LiquidityError::InsufficientShares {
                requested: shares.clone(),
                available: redeemable,
            });
        }

        let (reserve_a, reserve_b) = self.pool.reserves();
        let gross_a = math::redeem_amount(shares, &reserve_a, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        let gross_b = math::redeem_amount(shares, &reserve_b, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        if gross_a.is_zero() || gross_b.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }

        Ok((
            self.pool.asset_a().tax_policy().delivered(&gross_a),
            self.pool.asset_b().tax_policy().delivered(&gross_b),
        ))
    }

    fn atomically<T>(&self, op: impl FnOnce() -> LiquidityResult<T>) -> LiquidityResult<T> {
        atomically(&[self.pool.as_ref() as &dyn Transactional], op)
    }
}
