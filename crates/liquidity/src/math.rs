// liquidity/src/math.rs

//! Pool arithmetic (constant product formula: x * y = k)
//!
//! All amounts are arbitrary precision integers and every division floors.
//! Swap and redemption outputs therefore never exceed the exact rational
//! result.

use exchange_core::Amount;
use ledger::TaxPolicy;

/// Denominator for slippage tolerances expressed in parts per million
pub const SLIPPAGE_PPM_DENOMINATOR: u64 = 1_000_000;

/// Input left for pricing after the trading fee
///
/// effective_in = floor(amount_in * (100 - fee_percent) / 100)
pub fn apply_fee(amount_in: &Amount, fee_percent: u8) -> Amount {
    amount_in.percent_floor(100u8.saturating_sub(fee_percent))
}

/// Calculate swap output
///
/// Formula: amount_out = floor(reserve_out * effective_in / (reserve_in + effective_in))
pub fn swap_output(reserve_in: &Amount, reserve_out: &Amount, effective_in: &Amount) -> Option<Amount> {
    let denominator = reserve_in.checked_add(effective_in)?;
    reserve_out.mul_div_floor(effective_in, &denominator)
}

/// Liquidity created by the first deposit: floor(sqrt(amount_a * amount_b))
pub fn initial_liquidity(amount_a: &Amount, amount_b: &Amount) -> Amount {
    amount_a
        .checked_mul(amount_b)
        .map(|product| product.sqrt())
        .unwrap_or_else(Amount::zero)
}

/// Asset B needed to match `amount_a` at the current reserve ratio
///
/// required_b = floor(reserve_b * amount_a / reserve_a)
pub fn required_counterpart(amount_a: &Amount, reserve_a: &Amount, reserve_b: &Amount) -> Option<Amount> {
    reserve_b.mul_div_floor(amount_a, reserve_a)
}

/// Shares minted for a deposit anchored on `amount_a`
///
/// shares = floor(total_shares * amount_a / reserve_a)
pub fn shares_for_deposit(amount_a: &Amount, reserve_a: &Amount, total_shares: &Amount) -> Option<Amount> {
    total_shares.mul_div_floor(amount_a, reserve_a)
}

/// Pro-rata redemption of one reserve
///
/// amount_out = floor(reserve * shares / total_shares)
pub fn redeem_amount(shares: &Amount, reserve: &Amount, total_shares: &Amount) -> Option<Amount> {
    reserve.mul_div_floor(shares, total_shares)
}

/// Expected amount a trader receives, including transfer tax on both sides
///
/// Mirrors the pool's execution path exactly: inbound tax, fee, curve,
/// outbound tax.
pub fn expected_swap_output(
    reserve_in: &Amount,
    reserve_out: &Amount,
    amount_in: &Amount,
    fee_percent: u8,
    tax_in: &TaxPolicy,
    tax_out: &TaxPolicy,
) -> Option<Amount> {
    let received = tax_in.delivered(amount_in);
    let effective_in = apply_fee(&received, fee_percent);
    let gross_out = swap_output(reserve_in, reserve_out, &effective_in)?;
    Some(tax_out.delivered(&gross_out))
}

/// Minimum acceptable output for a slippage tolerance in parts per million
///
/// min = amount - floor(amount * slippage_ppm / 1_000_000)
pub fn min_after_slippage(amount: &Amount, slippage_ppm: u64) -> Amount {
    let slippage = Amount::from_u64(slippage_ppm.min(SLIPPAGE_PPM_DENOMINATOR));
    let cut = amount
        .mul_div_floor(&slippage, &Amount::from_u64(SLIPPAGE_PPM_DENOMINATOR))
        .unwrap_or_else(Amount::zero);
    amount.saturating_sub(&cut)
}
