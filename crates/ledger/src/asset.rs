// ledger/src/asset.rs

use crate::{LedgerResult, TaxPolicy};
use exchange_core::{Address, Amount, Transactional};

/// Capability interface of an external asset ledger
///
/// Transfers report what the recipient actually received, which is less than
/// the nominal amount whenever a transfer tax is active. Callers must treat
/// that figure (or an observed balance delta) as ground truth.
///
/// Ledgers take part in the host's atomic units through `Transactional`:
/// a failed exchange operation undoes every transfer it issued.
pub trait AssetLedger: Transactional {
    /// Short display name, e.g. "SPC"
    fn symbol(&self) -> &str;

    fn balance_of(&self, holder: &Address) -> Amount;

    /// Move `amount` from `from` to `to`, returning the delivered amount
    fn transfer(&self, from: &Address, to: &Address, amount: &Amount) -> LedgerResult<Amount>;

    /// Like `transfer`, spending `spender`'s allowance over `from`'s balance
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> LedgerResult<Amount>;

    fn approve(&self, owner: &Address, spender: &Address, amount: &Amount) -> LedgerResult<()>;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// The tax the ledger currently charges on transfers
    fn tax_policy(&self) -> TaxPolicy;

    fn is_taxed(&self) -> bool {
        self.tax_policy().is_active()
    }
}
