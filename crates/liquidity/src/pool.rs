// liquidity/src/pool.rs

use crate::{math, LiquidityError, LiquidityResult, PoolConfig, PoolEvent, ReentrancyGuard};
use exchange_core::{atomically, Address, Amount, JournaledMap, Transactional};
use ledger::AssetLedger;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Which reserve a swap takes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Asset A in, asset B out
    AToB,
    /// Asset B in, asset A out
    BToA,
}

/// Result of a committed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub direction: SwapDirection,
    /// Nominal amount taken from the trader
    pub amount_in: Amount,
    /// Amount the pool actually received (after inbound tax)
    pub amount_received: Amount,
    /// Amount the pool paid out
    pub amount_out: Amount,
    /// Amount the trader actually received (after outbound tax)
    pub amount_delivered: Amount,
}

/// Result of a committed mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    /// Asset A taken from the provider
    pub amount_a: Amount,
    /// Asset B taken from the provider
    pub amount_b: Amount,
    /// Offered asset B that was left with the provider
    pub refunded_b: Amount,
    pub shares: Amount,
}

/// Result of a committed burn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnOutcome {
    pub shares: Amount,
    /// Amounts the pool paid out
    pub gross_a: Amount,
    pub gross_b: Amount,
    /// Amounts the provider actually received
    pub delivered_a: Amount,
    pub delivered_b: Amount,
}

/// Scalar pool fields captured at each checkpoint
#[derive(Debug, Clone)]
struct Snapshot {
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    event_count: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    shares: JournaledMap<Address, Amount>,
    events: Vec<PoolEvent>,
    checkpoints: Vec<Snapshot>,
}

impl PoolState {
    fn shares_of(&self, holder: &Address) -> Amount {
        self.shares.get(holder).cloned().unwrap_or_else(Amount::zero)
    }

    fn set_shares(&mut self, holder: Address, balance: Amount) {
        if balance.is_zero() {
            self.shares.remove(&holder);
        } else {
            self.shares.insert(holder, balance);
        }
    }

    fn credit(&mut self, holder: Address, amount: &Amount) {
        let balance = self.shares_of(&holder) + amount.clone();
        self.set_shares(holder, balance);
    }
}

/// Two-asset constant-product liquidity pool
///
/// The pool owns its reserves and the liquidity share ledger. It pulls inputs
/// from callers with `transfer_from` (callers approve the pool) and prices
/// only what it observably received. Outputs go straight to the caller.
///
/// It knows nothing about slippage; see `Router`.
pub struct LiquidityPool {
    address: Address,
    asset_a: Rc<dyn AssetLedger>,
    asset_b: Rc<dyn AssetLedger>,
    config: PoolConfig,
    guard: ReentrancyGuard,
    state: RefCell<PoolState>,
}

impl LiquidityPool {
    /// Create an empty pool trading `asset_a` against `asset_b`
    pub fn new(
        address: Address,
        asset_a: Rc<dyn AssetLedger>,
        asset_b: Rc<dyn AssetLedger>,
        config: PoolConfig,
    ) -> LiquidityResult<Self> {
        config.validate(&address)?;
        if Rc::ptr_eq(&asset_a, &asset_b) {
            return Err(LiquidityError::InvalidConfiguration(
                "pool assets must be two distinct ledgers".into(),
            ));
        }

        tracing::info!(
            "Created pool {} for {}/{} (fee {}%, minimum liquidity {})",
            address,
            asset_a.symbol(),
            asset_b.symbol(),
            config.fee_percent,
            config.minimum_liquidity
        );

        Ok(Self {
            address,
            asset_a,
            asset_b,
            config,
            guard: ReentrancyGuard::new(),
            state: RefCell::new(PoolState::default()),
        })
    }

    // ------------------------------------------------------------------
    // Swaps
    // ------------------------------------------------------------------

    pub fn swap_a_for_b(&self, trader: &Address, amount_a_in: &Amount) -> LiquidityResult<SwapOutcome> {
        self.swap(SwapDirection::AToB, trader, amount_a_in)
    }

    pub fn swap_b_for_a(&self, trader: &Address, amount_b_in: &Amount) -> LiquidityResult<SwapOutcome> {
        self.swap(SwapDirection::BToA, trader, amount_b_in)
    }

    /// Swap at whatever price the curve yields
    pub fn swap(
        &self,
        direction: SwapDirection,
        trader: &Address,
        amount_in: &Amount,
    ) -> LiquidityResult<SwapOutcome> {
        let _lock = self.guard.acquire()?;
        self.atomically(|| self.execute_swap(direction, trader, amount_in))
    }

    fn execute_swap(
        &self,
        direction: SwapDirection,
        trader: &Address,
        amount_in: &Amount,
    ) -> LiquidityResult<SwapOutcome> {
        if amount_in.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let (reserve_in, reserve_out) = match direction {
            SwapDirection::AToB => self.reserves(),
            SwapDirection::BToA => {
                let (a, b) = self.reserves();
                (b, a)
            }
        };
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(LiquidityError::InsufficientLiquidity);
        }

        let (ledger_in, ledger_out) = self.ledgers(direction);

        let amount_received = self.pull(ledger_in, trader, amount_in)?;
        if amount_received.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let effective_in = math::apply_fee(&amount_received, self.config.fee_percent);
        let amount_out = math::swap_output(&reserve_in, &reserve_out, &effective_in)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        tracing::debug!(
            "Swap pricing: received={} effective={} out={}",
            amount_received,
            effective_in,
            amount_out
        );
        if amount_out.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }

        let amount_delivered = ledger_out.transfer(&self.address, trader, &amount_out)?;
        self.sync_reserves();

        let zero = Amount::zero;
        let event = match direction {
            SwapDirection::AToB => PoolEvent::Swap {
                trader: *trader,
                a_in: amount_in.clone(),
                b_in: zero(),
                a_out: zero(),
                b_out: amount_delivered.clone(),
            },
            SwapDirection::BToA => PoolEvent::Swap {
                trader: *trader,
                a_in: zero(),
                b_in: amount_in.clone(),
                a_out: amount_delivered.clone(),
                b_out: zero(),
            },
        };
        self.emit(event);

        tracing::info!(
            "Swap by {}: {} {} in, {} {} out",
            trader,
            amount_in,
            ledger_in.symbol(),
            amount_delivered,
            ledger_out.symbol()
        );

        Ok(SwapOutcome {
            direction,
            amount_in: amount_in.clone(),
            amount_received,
            amount_out,
            amount_delivered,
        })
    }

    // ------------------------------------------------------------------
    // Liquidity provision
    // ------------------------------------------------------------------

    /// Deposit both assets and receive liquidity shares
    ///
    /// The first deposit sets the price and locks the minimum liquidity at
    /// the sink. Later deposits are anchored on `amount_a_in`: only the
    /// matching amount of asset B is taken, the rest stays with the provider,
    /// and offering too little asset B fails with `NonMatchingValue`.
    pub fn mint(
        &self,
        provider: &Address,
        amount_a_in: &Amount,
        amount_b_in: &Amount,
    ) -> LiquidityResult<MintOutcome> {
        let _lock = self.guard.acquire()?;
        self.atomically(|| self.execute_mint(provider, amount_a_in, amount_b_in))
    }

    fn execute_mint(
        &self,
        provider: &Address,
        amount_a_in: &Amount,
        amount_b_in: &Amount,
    ) -> LiquidityResult<MintOutcome> {
        if amount_a_in.is_zero() || amount_b_in.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let outcome = if self.total_shares().is_zero() {
            self.mint_initial(provider, amount_a_in, amount_b_in)?
        } else {
            self.mint_proportional(provider, amount_a_in, amount_b_in)?
        };

        self.sync_reserves();
        self.emit(PoolEvent::Mint {
            provider: *provider,
            amount_a_in: outcome.amount_a.clone(),
            amount_b_in: outcome.amount_b.clone(),
            shares_out: outcome.shares.clone(),
        });

        tracing::info!(
            "Mint by {}: {} {} + {} {} for {} shares",
            provider,
            outcome.amount_a,
            self.asset_a.symbol(),
            outcome.amount_b,
            self.asset_b.symbol(),
            outcome.shares
        );

        Ok(outcome)
    }

    fn mint_initial(
        &self,
        provider: &Address,
        amount_a_in: &Amount,
        amount_b_in: &Amount,
    ) -> LiquidityResult<MintOutcome> {
        let received_a = self.pull(self.asset_a.as_ref(), provider, amount_a_in)?;
        let received_b = self.pull(self.asset_b.as_ref(), provider, amount_b_in)?;
        if received_a.is_zero() || received_b.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let liquidity = math::initial_liquidity(&received_a, &received_b);
        let minimum = &self.config.minimum_liquidity;
        let shares = liquidity
            .checked_sub(minimum)
            .filter(|shares| !shares.is_zero())
            .ok_or_else(|| LiquidityError::BelowMinimumLiquidity {
                liquidity: liquidity.clone(),
                minimum: minimum.clone(),
            })?;

        {
            let mut state = self.state.borrow_mut();
            state.credit(self.config.sink, minimum);
            state.credit(*provider, &shares);
            state.total_shares = liquidity;
        }

        tracing::debug!("Initial mint locked {} shares at {}", minimum, self.config.sink);

        Ok(MintOutcome {
            amount_a: amount_a_in.clone(),
            amount_b: amount_b_in.clone(),
            refunded_b: Amount::zero(),
            shares,
        })
    }

    fn mint_proportional(
        &self,
        provider: &Address,
        amount_a_in: &Amount,
        amount_b_in: &Amount,
    ) -> LiquidityResult<MintOutcome> {
        let (reserve_a, reserve_b) = self.reserves();
        if reserve_a.is_zero() || reserve_b.is_zero() {
            return Err(LiquidityError::InsufficientLiquidity);
        }

        let received_a = self.pull(self.asset_a.as_ref(), provider, amount_a_in)?;
        if received_a.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let required_b = math::required_counterpart(&received_a, &reserve_a, &reserve_b)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        if required_b.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }
        // Ask for enough that the pool still holds `required_b` after the ledger's tax
        let gross_b = self.asset_b.tax_policy().gross_for(&required_b);
        tracing::debug!(
            "Mint ratio: received_a={} required_b={} gross_b={} offered_b={}",
            received_a,
            required_b,
            gross_b,
            amount_b_in
        );
        if amount_b_in < &gross_b {
            return Err(LiquidityError::NonMatchingValue {
                required: gross_b,
                supplied: amount_b_in.clone(),
            });
        }

        let received_b = self.pull(self.asset_b.as_ref(), provider, &gross_b)?;
        if received_b < required_b {
            return Err(LiquidityError::NonMatchingValue {
                required: required_b,
                supplied: received_b,
            });
        }

        let total_shares = self.total_shares();
        let shares = math::shares_for_deposit(&received_a, &reserve_a, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        if shares.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }

        {
            let mut state = self.state.borrow_mut();
            state.credit(*provider, &shares);
            state.total_shares = total_shares + shares.clone();
        }

        Ok(MintOutcome {
            amount_a: amount_a_in.clone(),
            refunded_b: amount_b_in.saturating_sub(&gross_b),
            amount_b: gross_b,
            shares,
        })
    }

    // ------------------------------------------------------------------
    // Liquidity removal
    // ------------------------------------------------------------------

    /// Redeem shares for a pro-rata cut of both reserves
    pub fn burn(&self, provider: &Address, shares_in: &Amount) -> LiquidityResult<BurnOutcome> {
        let _lock = self.guard.acquire()?;
        self.atomically(|| self.execute_burn(provider, shares_in))
    }

    fn execute_burn(&self, provider: &Address, shares_in: &Amount) -> LiquidityResult<BurnOutcome> {
        if shares_in.is_zero() {
            return Err(LiquidityError::ZeroInput);
        }

        let available = self.spendable_shares(provider);
        if &available < shares_in {
            return Err(LiquidityError::InsufficientShares {
                requested: shares_in.clone(),
                available,
            });
        }

        let (reserve_a, reserve_b) = self.reserves();
        let total_shares = self.total_shares();
        let gross_a = math::redeem_amount(shares_in, &reserve_a, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        let gross_b = math::redeem_amount(shares_in, &reserve_b, &total_shares)
            .ok_or(LiquidityError::InsufficientLiquidity)?;
        if gross_a.is_zero() || gross_b.is_zero() {
            return Err(LiquidityError::ZeroTrade);
        }

        // Effects before interactions: shares and reserves settle before any transfer
        {
            let mut state = self.state.borrow_mut();
            let remaining = available.saturating_sub(shares_in);
            state.set_shares(*provider, remaining);
            state.total_shares = total_shares.saturating_sub(shares_in);
            state.reserve_a = reserve_a.saturating_sub(&gross_a);
            state.reserve_b = reserve_b.saturating_sub(&gross_b);
        }

        let delivered_a = self.asset_a.transfer(&self.address, provider, &gross_a)?;
        let delivered_b = self.asset_b.transfer(&self.address, provider, &gross_b)?;
        self.sync_reserves();

        self.emit(PoolEvent::Burn {
            provider: *provider,
            amount_a_out: delivered_a.clone(),
            amount_b_out: delivered_b.clone(),
            shares_in: shares_in.clone(),
        });

        tracing::info!(
            "Burn by {}: {} shares for {} {} + {} {}",
            provider,
            shares_in,
            delivered_a,
            self.asset_a.symbol(),
            delivered_b,
            self.asset_b.symbol()
        );

        Ok(BurnOutcome {
            shares: shares_in.clone(),
            gross_a,
            gross_b,
            delivered_a,
            delivered_b,
        })
    }

    // ------------------------------------------------------------------
    // Share transfers and reconciliation
    // ------------------------------------------------------------------

    /// Move liquidity shares between holders
    pub fn transfer_shares(&self, from: &Address, to: &Address, amount: &Amount) -> LiquidityResult<()> {
        let _lock = self.guard.acquire()?;
        self.atomically(|| {
            if amount.is_zero() {
                return Err(LiquidityError::ZeroInput);
            }
            let available = self.spendable_shares(from);
            if &available < amount {
                return Err(LiquidityError::InsufficientShares {
                    requested: amount.clone(),
                    available,
                });
            }

            {
                let mut state = self.state.borrow_mut();
                state.set_shares(*from, available.saturating_sub(amount));
                state.credit(*to, amount);
            }

            self.emit(PoolEvent::SharesTransferred {
                from: *from,
                to: *to,
                amount: amount.clone(),
            });
            Ok(())
        })
    }

    /// Reconcile reserves with the balances the pool actually holds
    pub fn sync(&self) -> LiquidityResult<(Amount, Amount)> {
        let _lock = self.guard.acquire()?;
        self.atomically(|| {
            self.sync_reserves();
            let (reserve_a, reserve_b) = self.reserves();
            self.emit(PoolEvent::Sync {
                reserve_a: reserve_a.clone(),
                reserve_b: reserve_b.clone(),
            });
            Ok((reserve_a, reserve_b))
        })
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn fee_percent(&self) -> u8 {
        self.config.fee_percent
    }

    pub fn minimum_liquidity(&self) -> &Amount {
        &self.config.minimum_liquidity
    }

    pub fn sink(&self) -> &Address {
        &self.config.sink
    }

    pub fn asset_a(&self) -> &dyn AssetLedger {
        self.asset_a.as_ref()
    }

    pub fn asset_b(&self) -> &dyn AssetLedger {
        self.asset_b.as_ref()
    }

    /// Ledgers for the input and output side of a swap
    pub fn ledgers(&self, direction: SwapDirection) -> (&dyn AssetLedger, &dyn AssetLedger) {
        match direction {
            SwapDirection::AToB => (self.asset_a.as_ref(), self.asset_b.as_ref()),
            SwapDirection::BToA => (self.asset_b.as_ref(), self.asset_a.as_ref()),
        }
    }

    /// Get current reserves
    pub fn reserves(&self) -> (Amount, Amount) {
        let state = self.state.borrow();
        (state.reserve_a.clone(), state.reserve_b.clone())
    }

    pub fn total_shares(&self) -> Amount {
        self.state.borrow().total_shares.clone()
    }

    pub fn shares_of(&self, holder: &Address) -> Amount {
        self.state.borrow().shares_of(holder)
    }

    /// All non-zero share balances, ordered by holder
    pub fn share_holders(&self) -> Vec<(Address, Amount)> {
        let state = self.state.borrow();
        let mut holders: Vec<_> = state
            .shares
            .iter()
            .map(|(holder, shares)| (*holder, shares.clone()))
            .collect();
        holders.sort_by_key(|(holder, _)| *holder);
        holders
    }

    pub fn is_initialized(&self) -> bool {
        !self.total_shares().is_zero()
    }

    pub fn is_locked(&self) -> bool {
        self.guard.is_locked()
    }

    /// Events of all committed operations, oldest first
    pub fn events(&self) -> Vec<PoolEvent> {
        self.state.borrow().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn last_event(&self) -> Option<PoolEvent> {
        self.state.borrow().events.last().cloned()
    }

    /// Check share conservation, the minimum-liquidity floor and that
    /// reserves match the balances the pool holds
    pub fn verify_invariants(&self) -> LiquidityResult<()> {
        let state = self.state.borrow();
        let violation = |msg: String| Err(LiquidityError::InvariantViolation(msg));

        let sum = state
            .shares
            .values()
            .fold(Amount::zero(), |acc, shares| acc + shares.clone());
        if sum != state.total_shares {
            return violation(format!(
                "share balances sum to {}, total supply is {}",
                sum, state.total_shares
            ));
        }

        if !state.total_shares.is_zero() {
            let minimum = &self.config.minimum_liquidity;
            if &state.total_shares < minimum || &state.shares_of(&self.config.sink) < minimum {
                return violation(format!("minimum liquidity {} is not locked", minimum));
            }
            if state.reserve_a.is_zero() || state.reserve_b.is_zero() {
                return violation("initialized pool has an empty reserve".into());
            }
        }

        let balance_a = self.asset_a.balance_of(&self.address);
        let balance_b = self.asset_b.balance_of(&self.address);
        if balance_a != state.reserve_a || balance_b != state.reserve_b {
            return violation(format!(
                "reserves ({}, {}) differ from balances ({}, {})",
                state.reserve_a, state.reserve_b, balance_a, balance_b
            ));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn atomically<T>(&self, op: impl FnOnce() -> LiquidityResult<T>) -> LiquidityResult<T> {
        atomically(&[self as &dyn Transactional], op)
    }

    /// Shares `holder` may burn or transfer; the sink's are locked forever
    fn spendable_shares(&self, holder: &Address) -> Amount {
        if holder == &self.config.sink {
            return Amount::zero();
        }
        self.shares_of(holder)
    }

    /// Take `amount` from `from` and return what the pool observably received
    fn pull(&self, ledger: &dyn AssetLedger, from: &Address, amount: &Amount) -> LiquidityResult<Amount> {
        let before = ledger.balance_of(&self.address);
        ledger.transfer_from(&self.address, from, &self.address, amount)?;
        let after = ledger.balance_of(&self.address);
        Ok(after.saturating_sub(&before))
    }

    fn sync_reserves(&self) {
        let balance_a = self.asset_a.balance_of(&self.address);
        let balance_b = self.asset_b.balance_of(&self.address);
        let mut state = self.state.borrow_mut();
        state.reserve_a = balance_a;
        state.reserve_b = balance_b;
    }

    fn emit(&self, event: PoolEvent) {
        tracing::debug!("Pool event: {:?}", event);
        self.state.borrow_mut().events.push(event);
    }
}

/// The pool's own state and both of its asset ledgers form one unit
impl Transactional for LiquidityPool {
    fn checkpoint(&self) {
        {
            let mut state = self.state.borrow_mut();
            let snapshot = Snapshot {
                reserve_a: state.reserve_a.clone(),
                reserve_b: state.reserve_b.clone(),
                total_shares: state.total_shares.clone(),
                event_count: state.events.len(),
            };
            state.checkpoints.push(snapshot);
            state.shares.checkpoint();
        }
        self.asset_a.checkpoint();
        self.asset_b.checkpoint();
    }

    fn commit(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.checkpoints.pop();
            state.shares.commit();
        }
        self.asset_a.commit();
        self.asset_b.commit();
    }

    fn rollback(&self) {
        self.asset_b.rollback();
        self.asset_a.rollback();
        let mut state = self.state.borrow_mut();
        if let Some(snapshot) = state.checkpoints.pop() {
            state.reserve_a = snapshot.reserve_a;
            state.reserve_b = snapshot.reserve_b;
            state.total_shares = snapshot.total_shares;
            state.events.truncate(snapshot.event_count);
        }
        state.shares.rollback();
    }
}

impl std::fmt::Debug for LiquidityPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (reserve_a, reserve_b) = self.reserves();
        f.debug_struct("LiquidityPool")
            .field("address", &self.address)
            .field("pair", &format!("{}/{}", self.asset_a.symbol(), self.asset_b.symbol()))
            .field("reserve_a", &reserve_a)
            .field("reserve_b", &reserve_b)
            .field("total_shares", &self.total_shares())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger::{TaxConfig, TokenLedger};

    struct Fixture {
        eth: Rc<TokenLedger>,
        spc: Rc<TokenLedger>,
        pool: LiquidityPool,
    }

    fn fixture() -> Fixture {
        let eth = Rc::new(TokenLedger::untaxed("ETH"));
        let config = TaxConfig {
            enabled: false,
            rate_percent: 2,
            treasury: Some(Address::from_label("treasury")),
        };
        let spc = Rc::new(TokenLedger::new("SPC", &config).unwrap());
        let pool = LiquidityPool::new(
            Address::from_label("pool"),
            eth.clone(),
            spc.clone(),
            PoolConfig::default(),
        )
        .unwrap();
        Fixture { eth, spc, pool }
    }

    fn fund(f: &Fixture, holder: &Address, eth: Amount, spc: Amount) {
        f.eth.mint(holder, &eth);
        f.spc.mint(holder, &spc);
        f.eth.approve(holder, f.pool.address(), &eth).unwrap();
        f.spc.approve(holder, f.pool.address(), &spc).unwrap();
    }

    fn seeded() -> (Fixture, Address) {
        let f = fixture();
        let provider = Address::from_label("alice");
        fund(&f, &provider, Amount::from_tokens(100), Amount::from_tokens(500));
        f.pool
            .mint(&provider, &Amount::from_tokens(10), &Amount::from_tokens(50))
            .unwrap();
        (f, provider)
    }

    #[test]
    fn test_rejects_same_ledger_twice() {
        let eth: Rc<TokenLedger> = Rc::new(TokenLedger::untaxed("ETH"));
        let result = LiquidityPool::new(
            Address::from_label("pool"),
            eth.clone(),
            eth,
            PoolConfig::default(),
        );
        assert!(matches!(result, Err(LiquidityError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_first_mint_locks_minimum_liquidity() {
        let (f, provider) = seeded();

        let total = f.pool.total_shares();
        assert_eq!(total, "22360679774997896964".parse().unwrap());
        assert_eq!(f.pool.shares_of(&provider), "22360679774997895964".parse().unwrap());
        assert_eq!(f.pool.shares_of(f.pool.sink()), Amount::from_u64(1000));
        assert_eq!(
            f.pool.reserves(),
            (Amount::from_tokens(10), Amount::from_tokens(50))
        );
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_first_mint_boundary() {
        let f = fixture();
        let provider = Address::from_label("alice");
        fund(&f, &provider, Amount::from_u64(10_000), Amount::from_u64(10_000));

        // sqrt(1000 * 1000) == minimum
        let err = f
            .pool
            .mint(&provider, &Amount::from_u64(1000), &Amount::from_u64(1000))
            .unwrap_err();
        assert!(matches!(err, LiquidityError::BelowMinimumLiquidity { .. }));
        assert_eq!(f.pool.event_count(), 0);
        assert!(f.eth.balance_of(f.pool.address()).is_zero());

        // sqrt(1001 * 1001) == minimum + 1
        let outcome = f
            .pool
            .mint(&provider, &Amount::from_u64(1001), &Amount::from_u64(1001))
            .unwrap();
        assert_eq!(outcome.shares, Amount::from_u64(1));
        assert_eq!(f.pool.shares_of(f.pool.sink()), Amount::from_u64(1000));
    }

    #[test]
    fn test_mint_zero_input() {
        let f = fixture();
        let provider = Address::from_label("alice");
        let err = f
            .pool
            .mint(&provider, &Amount::zero(), &Amount::from_u64(5))
            .unwrap_err();
        assert_eq!(err, LiquidityError::ZeroInput);
    }

    #[test]
    fn test_swap_requires_liquidity() {
        let f = fixture();
        let trader = Address::from_label("bob");
        fund(&f, &trader, Amount::from_u64(100), Amount::zero());
        let err = f.pool.swap_a_for_b(&trader, &Amount::from_u64(100)).unwrap_err();
        assert_eq!(err, LiquidityError::InsufficientLiquidity);
    }

    #[test]
    fn test_swap_zero_input() {
        let (f, _) = seeded();
        let err = f
            .pool
            .swap_a_for_b(&Address::from_label("bob"), &Amount::zero())
            .unwrap_err();
        assert_eq!(err, LiquidityError::ZeroInput);
    }

    #[test]
    fn test_swap_untaxed() {
        let (f, _) = seeded();
        let trader = Address::from_label("bob");
        fund(&f, &trader, Amount::from_tokens(1), Amount::zero());

        let outcome = f.pool.swap_a_for_b(&trader, &Amount::from_tokens(1)).unwrap();
        let expected: Amount = "4504094631483166515".parse().unwrap();
        assert_eq!(outcome.amount_out, expected);
        assert_eq!(outcome.amount_delivered, expected);
        assert_eq!(f.spc.balance_of(&trader), expected);
        assert_eq!(
            f.pool.reserves(),
            (
                Amount::from_tokens(11),
                Amount::from_tokens(50).checked_sub(&expected).unwrap()
            )
        );
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_swap_product_never_decreases() {
        let (f, _) = seeded();
        let trader = Address::from_label("bob");
        fund(&f, &trader, Amount::from_tokens(5), Amount::from_tokens(5));

        let (a0, b0) = f.pool.reserves();
        f.pool.swap_b_for_a(&trader, &Amount::from_tokens(3)).unwrap();
        let (a1, b1) = f.pool.reserves();
        assert!(a1.checked_mul(&b1).unwrap() >= a0.checked_mul(&b0).unwrap());
    }

    #[test]
    fn test_swap_without_allowance_rolls_back() {
        let (f, _) = seeded();
        let trader = Address::from_label("bob");
        f.eth.mint(&trader, &Amount::from_tokens(1));
        let events_before = f.pool.event_count();

        let err = f.pool.swap_a_for_b(&trader, &Amount::from_tokens(1)).unwrap_err();
        assert!(matches!(err, LiquidityError::Transfer(_)));
        assert_eq!(f.pool.event_count(), events_before);
        assert_eq!(f.eth.balance_of(&trader), Amount::from_tokens(1));
        assert!(!f.pool.is_locked());
    }

    #[test]
    fn test_proportional_mint_keeps_excess() {
        let f = fixture();
        let provider = Address::from_label("carol");
        fund(&f, &provider, Amount::from_tokens(2_000), Amount::from_tokens(10_000));
        f.pool
            .mint(&provider, &Amount::from_tokens(1_000), &Amount::from_tokens(5_000))
            .unwrap();

        let before = f.spc.balance_of(&provider);
        let outcome = f
            .pool
            .mint(&provider, &Amount::from_tokens(200), &Amount::from_tokens(5_000))
            .unwrap();

        assert_eq!(outcome.amount_b, Amount::from_tokens(1_000));
        assert_eq!(outcome.refunded_b, Amount::from_tokens(4_000));
        assert_eq!(
            before.checked_sub(&f.spc.balance_of(&provider)).unwrap(),
            Amount::from_tokens(1_000)
        );
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_proportional_mint_rejects_shortfall() {
        let f = fixture();
        let provider = Address::from_label("carol");
        fund(&f, &provider, Amount::from_tokens(10), Amount::from_tokens(20));
        f.pool
            .mint(&provider, &Amount::from_tokens(1), &Amount::from_tokens(5))
            .unwrap();

        let err = f
            .pool
            .mint(&provider, &Amount::from_tokens(2), &Amount::from_tokens(6))
            .unwrap_err();
        assert_eq!(
            err,
            LiquidityError::NonMatchingValue {
                required: Amount::from_tokens(10),
                supplied: Amount::from_tokens(6),
            }
        );
        // the pulled asset A went back with the rollback
        assert_eq!(f.eth.balance_of(&provider), Amount::from_tokens(9));
    }

    #[test]
    fn test_proportional_mint_no_minimum_cut() {
        let f = fixture();
        let first = Address::from_label("carol");
        let second = Address::from_label("bob");
        fund(&f, &first, Amount::from_tokens(1), Amount::from_tokens(1));
        fund(&f, &second, Amount::from_tokens(1), Amount::from_tokens(1));

        f.pool.mint(&first, &Amount::from_tokens(1), &Amount::from_tokens(1)).unwrap();
        let outcome = f
            .pool
            .mint(&second, &Amount::from_tokens(1), &Amount::from_tokens(1))
            .unwrap();
        assert_eq!(outcome.shares, Amount::from_tokens(1));
    }

    #[test]
    fn test_proportional_mint_counterpart_rounds_down() {
        let f = fixture();
        let provider = Address::from_label("carol");
        fund(&f, &provider, Amount::from_u64(3001), Amount::from_u64(10_003));
        f.pool
            .mint(&provider, &Amount::from_u64(3000), &Amount::from_u64(10_000))
            .unwrap();
        assert_eq!(f.pool.total_shares(), Amount::from_u64(5477));

        // 10000 * 1 / 3000 = 3.33, so 3 units of asset B match
        let outcome = f
            .pool
            .mint(&provider, &Amount::from_u64(1), &Amount::from_u64(3))
            .unwrap();
        assert_eq!(outcome.amount_b, Amount::from_u64(3));
        assert!(outcome.refunded_b.is_zero());
        assert_eq!(outcome.shares, Amount::from_u64(1));
        assert_eq!(
            f.pool.reserves(),
            (Amount::from_u64(3001), Amount::from_u64(10_003))
        );
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_proportional_mint_zero_counterpart() {
        let f = fixture();
        let provider = Address::from_label("carol");
        fund(&f, &provider, Amount::from_u64(20_000), Amount::from_u64(10_000));
        f.pool
            .mint(&provider, &Amount::from_u64(10_000), &Amount::from_u64(3000))
            .unwrap();

        // 3000 * 1 / 10000 floors to zero
        let err = f
            .pool
            .mint(&provider, &Amount::from_u64(1), &Amount::from_u64(5))
            .unwrap_err();
        assert_eq!(err, LiquidityError::ZeroTrade);
        assert_eq!(
            f.pool.reserves(),
            (Amount::from_u64(10_000), Amount::from_u64(3000))
        );
    }

    #[test]
    fn test_taxed_mint_grosses_up_counterpart() {
        let f = fixture();
        let provider = Address::from_label("alice");
        fund(&f, &provider, Amount::from_tokens(100), Amount::from_tokens(500));
        f.pool
            .mint(&provider, &Amount::from_tokens(10), &Amount::from_tokens(50))
            .unwrap();
        f.spc.set_taxed(true);

        let outcome = f
            .pool
            .mint(&provider, &Amount::from_tokens(1), &Amount::from_tokens(10))
            .unwrap();
        // 5 SPC must arrive, so ceil(5 / 0.98) is requested
        let gross = f.spc.tax_policy().gross_for(&Amount::from_tokens(5));
        assert_eq!(outcome.amount_b, gross);
        let (_, reserve_b) = f.pool.reserves();
        assert!(reserve_b >= Amount::from_tokens(55));
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_burn_all_provider_shares() {
        let (f, provider) = seeded();
        let shares = f.pool.shares_of(&provider);

        let outcome = f.pool.burn(&provider, &shares).unwrap();
        assert_eq!(outcome.gross_a, "9999999999999999552".parse().unwrap());
        assert_eq!(outcome.gross_b, "49999999999999997763".parse().unwrap());
        assert_eq!(outcome.delivered_b, outcome.gross_b);

        let (reserve_a, reserve_b) = f.pool.reserves();
        assert!(!reserve_a.is_zero());
        assert!(!reserve_b.is_zero());
        assert_eq!(f.pool.total_shares(), Amount::from_u64(1000));
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_burn_rejects_overdraw_and_sink() {
        let (f, provider) = seeded();
        let shares = f.pool.shares_of(&provider) + Amount::from_u64(1);
        assert!(matches!(
            f.pool.burn(&provider, &shares),
            Err(LiquidityError::InsufficientShares { .. })
        ));

        let sink = *f.pool.sink();
        assert!(matches!(
            f.pool.burn(&sink, &Amount::from_u64(1)),
            Err(LiquidityError::InsufficientShares { .. })
        ));
        assert!(matches!(
            f.pool.transfer_shares(&sink, &provider, &Amount::from_u64(1)),
            Err(LiquidityError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn test_burn_zero_trade() {
        let f = fixture();
        let provider = Address::from_label("carol");
        fund(&f, &provider, Amount::from_u64(100_000_000), Amount::from_u64(1));
        f.pool
            .mint(&provider, &Amount::from_u64(100_000_000), &Amount::from_u64(1))
            .unwrap();

        let shares = f.pool.shares_of(&provider);
        assert_eq!(shares, Amount::from_u64(9000));
        assert_eq!(f.pool.burn(&provider, &shares).unwrap_err(), LiquidityError::ZeroTrade);
        assert_eq!(f.pool.shares_of(&provider), shares);
    }

    #[test]
    fn test_transfer_shares() {
        let (f, provider) = seeded();
        let bob = Address::from_label("bob");

        f.pool
            .transfer_shares(&provider, &bob, &Amount::from_u64(500))
            .unwrap();
        assert_eq!(f.pool.shares_of(&bob), Amount::from_u64(500));
        f.pool.verify_invariants().unwrap();

        let outcome = f.pool.burn(&bob, &Amount::from_u64(500)).unwrap();
        assert!(!outcome.delivered_a.is_zero());
    }

    #[test]
    fn test_sync_absorbs_donation() {
        let (f, _) = seeded();
        let donor = Address::from_label("donor");
        f.eth.mint(&donor, &Amount::from_u64(7));
        f.eth.transfer(&donor, f.pool.address(), &Amount::from_u64(7)).unwrap();
        assert!(f.pool.verify_invariants().is_err());

        let (reserve_a, _) = f.pool.sync().unwrap();
        assert_eq!(reserve_a, Amount::from_tokens(10) + Amount::from_u64(7));
        f.pool.verify_invariants().unwrap();
    }

    #[test]
    fn test_events_recorded() {
        let (f, provider) = seeded();
        assert_eq!(f.pool.event_count(), 1);
        let events = f.pool.events();
        assert_eq!(
            events[0],
            PoolEvent::Mint {
                provider,
                amount_a_in: Amount::from_tokens(10),
                amount_b_in: Amount::from_tokens(50),
                shares_out: "22360679774997895964".parse().unwrap(),
            }
        );
    }
}
