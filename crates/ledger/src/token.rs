// ledger/src/token.rs

use crate::{AssetLedger, LedgerError, LedgerResult, TaxConfig, TaxPolicy};
use exchange_core::{Address, Amount, JournaledMap, Transactional};
use std::cell::RefCell;

/// Scalar ledger fields captured at each checkpoint
#[derive(Debug, Clone)]
struct Snapshot {
    total_supply: Amount,
    tax: TaxPolicy,
    tax_collected: Amount,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: JournaledMap<Address, Amount>,
    allowances: JournaledMap<(Address, Address), Amount>,
    total_supply: Amount,
    tax: TaxPolicy,
    /// Cumulative tax withheld from transfers
    tax_collected: Amount,
    checkpoints: Vec<Snapshot>,
}

impl LedgerState {
    fn balance(&self, holder: &Address) -> Amount {
        self.balances.get(holder).cloned().unwrap_or_else(Amount::zero)
    }

    fn set_balance(&mut self, holder: Address, balance: Amount) {
        if balance.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}

/// In-memory fungible token ledger with an optional transfer tax
///
/// Collected tax goes to the treasury when one is configured and is burned
/// otherwise.
#[derive(Debug)]
pub struct TokenLedger {
    symbol: String,
    treasury: Option<Address>,
    state: RefCell<LedgerState>,
}

impl TokenLedger {
    /// Create new ledger
    pub fn new(symbol: impl Into<String>, config: &TaxConfig) -> LedgerResult<Self> {
        config.validate()?;
        let state = LedgerState {
            tax: config.policy(),
            ..LedgerState::default()
        };
        Ok(Self {
            symbol: symbol.into(),
            treasury: config.treasury,
            state: RefCell::new(state),
        })
    }

    /// Ledger that never charges tax
    pub fn untaxed(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            treasury: None,
            state: RefCell::new(LedgerState::default()),
        }
    }

    /// Create new units out of thin air (seeding)
    pub fn mint(&self, to: &Address, amount: &Amount) {
        let mut state = self.state.borrow_mut();
        let balance = state.balance(to) + amount.clone();
        state.set_balance(*to, balance);
        state.total_supply = state.total_supply.clone() + amount.clone();
        tracing::debug!("{}: minted {} to {}", self.symbol, amount, to);
    }

    /// Switch the transfer tax on or off, keeping the configured rate
    pub fn set_taxed(&self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.tax = TaxPolicy::new(state.tax.rate_percent(), enabled);
        tracing::info!("{}: transfer tax {}", self.symbol, if enabled { "enabled" } else { "disabled" });
    }

    pub fn total_supply(&self) -> Amount {
        self.state.borrow().total_supply.clone()
    }

    pub fn tax_collected(&self) -> Amount {
        self.state.borrow().tax_collected.clone()
    }

    pub fn treasury(&self) -> Option<Address> {
        self.treasury
    }

    /// Number of holders with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.state.borrow().balances.len()
    }

    fn move_funds(&self, from: &Address, to: &Address, amount: &Amount) -> LedgerResult<Amount> {
        let mut state = self.state.borrow_mut();

        let from_balance = state.balance(from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                holder: *from,
                required: amount.clone(),
                available: from_balance.clone(),
            })?;

        let tax = state.tax.tax_on(amount);
        let delivered = amount.saturating_sub(&tax);

        state.set_balance(*from, remaining);
        let to_balance = state.balance(to) + delivered.clone();
        state.set_balance(*to, to_balance);

        if !tax.is_zero() {
            match self.treasury {
                Some(treasury) => {
                    let treasury_balance = state.balance(&treasury) + tax.clone();
                    state.set_balance(treasury, treasury_balance);
                }
                None => {
                    state.total_supply = state.total_supply.saturating_sub(&tax);
                }
            }
            state.tax_collected = state.tax_collected.clone() + tax.clone();
        }

        tracing::debug!(
            "{}: {} -> {} amount={} delivered={} tax={}",
            self.symbol,
            from,
            to,
            amount,
            delivered,
            tax
        );

        Ok(delivered)
    }
}

impl AssetLedger for TokenLedger {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.state.borrow().balance(holder)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: &Amount) -> LedgerResult<Amount> {
        self.move_funds(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> LedgerResult<Amount> {
        {
            let mut state = self.state.borrow_mut();
            let key = (*from, *spender);
            let allowance = state.allowances.get(&key).cloned().unwrap_or_else(Amount::zero);
            let remaining = allowance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientAllowance {
                    spender: *spender,
                    required: amount.clone(),
                    available: allowance.clone(),
                })?;
            // Balance is checked before the allowance is spent
            if state.balance(from) < *amount {
                return Err(LedgerError::InsufficientBalance {
                    holder: *from,
                    required: amount.clone(),
                    available: state.balance(from),
                });
            }
            state.allowances.insert(key, remaining);
        }
        self.move_funds(from, to, amount)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: &Amount) -> LedgerResult<()> {
        self.state
            .borrow_mut()
            .allowances
            .insert((*owner, *spender), amount.clone());
        Ok(())
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .borrow()
            .allowances
            .get(&(*owner, *spender))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    fn tax_policy(&self) -> TaxPolicy {
        self.state.borrow().tax
    }
}

impl Transactional for TokenLedger {
    fn checkpoint(&self) {
        let mut state = self.state.borrow_mut();
        let snapshot = Snapshot {
            total_supply: state.total_supply.clone(),
            tax: state.tax,
            tax_collected: state.tax_collected.clone(),
        };
        state.checkpoints.push(snapshot);
        state.balances.checkpoint();
        state.allowances.checkpoint();
    }

    fn commit(&self) {
        let mut state = self.state.borrow_mut();
        state.checkpoints.pop();
        state.balances.commit();
        state.allowances.commit();
    }

    fn rollback(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(snapshot) = state.checkpoints.pop() {
            state.total_supply = snapshot.total_supply;
            state.tax = snapshot.tax;
            state.tax_collected = snapshot.tax_collected;
        }
        state.balances.rollback();
        state.allowances.rollback();
    }
}
