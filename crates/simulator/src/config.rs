// simulator/src/config.rs
use exchange_core::Address;
use ledger::TaxConfig;
use liquidity::PoolConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub pool_address: Address,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    pub pool: PoolConfig,
    pub asset_a: AssetConfig,
    pub asset_b: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    #[serde(default)]
    pub tax: TaxConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            pool_address: Address::from_label("pool"),
            log_level: "info".into(),
            pool: PoolConfig::default(),
            asset_a: AssetConfig {
                symbol: "ETH".into(),
                tax: TaxConfig::default(),
            },
            asset_b: AssetConfig {
                symbol: "SPC".into(),
                tax: TaxConfig {
                    treasury: Some(Address::from_label("treasury")),
                    ..TaxConfig::default()
                },
            },
        }
    }
}

impl SimulatorConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.pool.validate(&self.pool_address)?;
        self.asset_a.tax.validate()?;
        self.asset_b.tax.validate()?;
        if self.asset_a.symbol == self.asset_b.symbol {
            anyhow::bail!("asset symbols must differ, both are {}", self.asset_a.symbol);
        }
        Ok(())
    }
}
