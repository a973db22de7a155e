// simulator/src/scenario.rs
use crate::SimulatorConfig;
use exchange_core::{Address, Amount};
use ledger::{AssetLedger, TokenLedger};
use liquidity::{math::min_after_slippage, LiquidityPool, PoolEvent, Router, SwapDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Scripted run: accounts to seed, then steps executed in order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub accounts: Vec<Account>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub label: String,
    #[serde(default)]
    pub asset_a: Amount,
    #[serde(default)]
    pub asset_b: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSide {
    A,
    B,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    AddLiquidity {
        account: String,
        amount_a: Amount,
        amount_b: Amount,
        #[serde(default)]
        min_shares: Amount,
    },
    /// Burns all of the account's shares when `shares` is absent
    RemoveLiquidity {
        account: String,
        #[serde(default)]
        shares: Option<Amount>,
        #[serde(default)]
        min_a: Amount,
        #[serde(default)]
        min_b: Amount,
    },
    /// `min_out` wins over `slippage_ppm`; with neither any output is accepted
    Swap {
        account: String,
        direction: SwapDirection,
        amount_in: Amount,
        #[serde(default)]
        min_out: Option<Amount>,
        #[serde(default)]
        slippage_ppm: Option<u64>,
    },
    SetTax {
        asset: AssetSide,
        enabled: bool,
    },
    /// Approve the pool for the account's whole balance of both assets
    ApproveAll {
        account: String,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::AddLiquidity { .. } => "add_liquidity",
            Step::RemoveLiquidity { .. } => "remove_liquidity",
            Step::Swap { .. } => "swap",
            Step::SetTax { .. } => "set_tax",
            Step::ApproveAll { .. } => "approve_all",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub action: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReport {
    pub address: Address,
    pub reserve_a: Amount,
    pub reserve_b: Amount,
    pub total_shares: Amount,
    pub events: Vec<PoolEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountReport {
    pub label: String,
    pub address: Address,
    pub balance_a: Amount,
    pub balance_b: Amount,
    pub shares: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub pool: PoolReport,
    pub accounts: Vec<AccountReport>,
}

/// Two ledgers, one pool and a router, driven by scenario steps
pub struct Simulation {
    asset_a: Rc<TokenLedger>,
    asset_b: Rc<TokenLedger>,
    router: Router,
    accounts: BTreeMap<String, Address>,
}

impl Simulation {
    pub fn new(config: &SimulatorConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let asset_a = Rc::new(TokenLedger::new(config.asset_a.symbol.clone(), &config.asset_a.tax)?);
        let asset_b = Rc::new(TokenLedger::new(config.asset_b.symbol.clone(), &config.asset_b.tax)?);
        let pool = LiquidityPool::new(
            config.pool_address,
            asset_a.clone(),
            asset_b.clone(),
            config.pool.clone(),
        )?;

        Ok(Self {
            asset_a,
            asset_b,
            router: Router::new(Rc::new(pool)),
            accounts: BTreeMap::new(),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Address for `label`, registering it on first use
    pub fn account(&mut self, label: &str) -> Address {
        *self
            .accounts
            .entry(label.to_string())
            .or_insert_with(|| Address::from_label(label))
    }

    pub fn fund(&mut self, label: &str, amount_a: &Amount, amount_b: &Amount) {
        let address = self.account(label);
        if !amount_a.is_zero() {
            self.asset_a.mint(&address, amount_a);
        }
        if !amount_b.is_zero() {
            self.asset_b.mint(&address, amount_b);
        }
        tracing::info!("Funded {} ({}) with {} + {}", label, address, amount_a, amount_b);
    }

    /// Seed the accounts and execute every step, recording failures without stopping
    pub fn run(&mut self, scenario: &Scenario) -> Report {
        for account in &scenario.accounts {
            self.fund(&account.label, &account.asset_a, &account.asset_b);
        }

        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let report = match self.execute(step) {
                Ok(outcome) => StepReport {
                    index,
                    action: step.action().to_string(),
                    ok: true,
                    outcome: Some(outcome),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!("Step {} ({}) failed: {}", index, step.action(), err);
                    StepReport {
                        index,
                        action: step.action().to_string(),
                        ok: false,
                        outcome: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            steps.push(report);
        }

        self.report(steps)
    }

    pub fn execute(&mut self, step: &Step) -> anyhow::Result<serde_json::Value> {
        tracing::debug!("Executing {:?}", step);
        let value = match step {
            Step::AddLiquidity {
                account,
                amount_a,
                amount_b,
                min_shares,
            } => {
                let caller = self.account(account);
                let outcome = self.router.add_liquidity(&caller, amount_a, amount_b, min_shares)?;
                serde_json::to_value(outcome)?
            }
            Step::RemoveLiquidity {
                account,
                shares,
                min_a,
                min_b,
            } => {
                let caller = self.account(account);
                let shares = match shares {
                    Some(shares) => shares.clone(),
                    None => self.router.pool().shares_of(&caller),
                };
                let outcome = self.router.remove_liquidity(&caller, &shares, min_a, min_b)?;
                serde_json::to_value(outcome)?
            }
            Step::Swap {
                account,
                direction,
                amount_in,
                min_out,
                slippage_ppm,
            } => {
                let caller = self.account(account);
                let minimum = match (min_out, slippage_ppm) {
                    (Some(min_out), _) => min_out.clone(),
                    (None, Some(ppm)) => {
                        let quote = self.router.quote_swap(*direction, amount_in)?;
                        min_after_slippage(&quote, *ppm)
                    }
                    (None, None) => Amount::zero(),
                };
                let outcome = self
                    .router
                    .swap_exact_in_for_out(&caller, amount_in, &minimum, *direction)?;
                serde_json::to_value(outcome)?
            }
            Step::SetTax { asset, enabled } => {
                let ledger = match asset {
                    AssetSide::A => &self.asset_a,
                    AssetSide::B => &self.asset_b,
                };
                ledger.set_taxed(*enabled);
                serde_json::json!({ "symbol": ledger.symbol(), "taxed": ledger.is_taxed() })
            }
            Step::ApproveAll { account } => {
                let owner = self.account(account);
                let spender = *self.router.pool().address();
                let amount_a = self.asset_a.balance_of(&owner);
                let amount_b = self.asset_b.balance_of(&owner);
                self.asset_a.approve(&owner, &spender, &amount_a)?;
                self.asset_b.approve(&owner, &spender, &amount_b)?;
                serde_json::json!({ "allowance_a": amount_a, "allowance_b": amount_b })
            }
        };
        Ok(value)
    }

    pub fn report(&self, steps: Vec<StepReport>) -> Report {
        let pool = self.router.pool();
        let (reserve_a, reserve_b) = pool.reserves();

        let accounts = self
            .accounts
            .iter()
            .map(|(label, address)| AccountReport {
                label: label.clone(),
                address: *address,
                balance_a: self.asset_a.balance_of(address),
                balance_b: self.asset_b.balance_of(address),
                shares: pool.shares_of(address),
            })
            .collect();

        Report {
            steps,
            pool: PoolReport {
                address: *pool.address(),
                reserve_a,
                reserve_b,
                total_shares: pool.total_shares(),
                events: pool.events(),
            },
            accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = r#"{
        "accounts": [
            { "label": "alice", "asset_a": "10000000000000000000", "asset_b": "50000000000000000000" },
            { "label": "bob", "asset_a": "1000000000000000000" }
        ],
        "steps": [
            { "action": "approve_all", "account": "alice" },
            { "action": "approve_all", "account": "bob" },
            { "action": "add_liquidity", "account": "alice",
              "amount_a": "10000000000000000000", "amount_b": "50000000000000000000" },
            { "action": "set_tax", "asset": "b", "enabled": true },
            { "action": "swap", "account": "bob", "direction": "a_to_b",
              "amount_in": "1000000000000000000", "min_out": "4414012738853503186" },
            { "action": "swap", "account": "bob", "direction": "a_to_b",
              "amount_in": "1000000000000000000", "slippage_ppm": 0 },
            { "action": "remove_liquidity", "account": "alice" }
        ]
    }"#;

    #[test]
    fn test_reference_scenario() {
        let scenario: Scenario = serde_json::from_str(REFERENCE).unwrap();
        let mut sim = Simulation::new(&SimulatorConfig::default()).unwrap();
        let report = sim.run(&scenario);

        let ok: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(ok, vec![true, true, true, true, false, true, true]);
        assert!(report.steps[4]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Slippage exceeded"));

        let swap = report.steps[5].outcome.as_ref().unwrap();
        assert_eq!(swap["amount_delivered"], "4414012738853503185");

        let bob = report.accounts.iter().find(|a| a.label == "bob").unwrap();
        assert!(bob.balance_a.is_zero());
        assert_eq!(bob.balance_b, "4414012738853503185".parse().unwrap());

        assert_eq!(report.pool.total_shares, Amount::from_u64(1000));
        assert!(!report.pool.reserve_a.is_zero());
        assert!(!report.pool.reserve_b.is_zero());
        sim.router().pool().verify_invariants().unwrap();
    }

    #[test]
    fn test_missing_approval_is_reported() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "accounts": [{ "label": "carol", "asset_a": "5000", "asset_b": "5000" }],
                "steps": [
                    { "action": "add_liquidity", "account": "carol", "amount_a": "5000", "amount_b": "5000" }
                ]
            }"#,
        )
        .unwrap();
        let mut sim = Simulation::new(&SimulatorConfig::default()).unwrap();
        let report = sim.run(&scenario);

        assert!(!report.steps[0].ok);
        assert!(report.steps[0].error.as_deref().unwrap().contains("allowance"));
        assert!(report.pool.events.is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let mut sim = Simulation::new(&SimulatorConfig::default()).unwrap();
        let report = sim.run(&Scenario::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pool"]["total_shares"], "0");
        assert!(json["steps"].as_array().unwrap().is_empty());
    }
}
