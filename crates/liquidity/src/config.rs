// liquidity/src/config.rs

use crate::{LiquidityError, LiquidityResult};
use exchange_core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Pool parameters fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Trading fee in whole percent, deducted from the input before pricing
    /// Default: 1
    pub fee_percent: u8,
    /// Shares locked at the sink on the first mint
    /// Default: 1000
    pub minimum_liquidity: Amount,
    /// Unspendable holder of the minimum liquidity
    /// Default: 0x00..01
    pub sink: Address,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fee_percent: 1,
            minimum_liquidity: Amount::from_u64(1000),
            sink: Address::from_low_u64(1),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self, pool_address: &Address) -> LiquidityResult<()> {
        if self.fee_percent >= 100 {
            return Err(LiquidityError::InvalidConfiguration(format!(
                "fee must be below 100%, got {}%",
                self.fee_percent
            )));
        }
        if self.minimum_liquidity.is_zero() {
            return Err(LiquidityError::InvalidConfiguration(
                "minimum liquidity must be non-zero".into(),
            ));
        }
        if &self.sink == pool_address {
            return Err(LiquidityError::InvalidConfiguration(
                "sink must differ from the pool address".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PoolConfig::default();
        assert!(config.validate(&Address::from_label("pool")).is_ok());
        assert_eq!(config.sink.to_hex(), "0x0000000000000000000000000000000000000001");
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let pool = Address::from_label("pool");

        let config = PoolConfig { fee_percent: 100, ..PoolConfig::default() };
        assert!(config.validate(&pool).is_err());

        let config = PoolConfig { minimum_liquidity: Amount::zero(), ..PoolConfig::default() };
        assert!(config.validate(&pool).is_err());

        let config = PoolConfig { sink: pool, ..PoolConfig::default() };
        assert!(config.validate(&pool).is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PoolConfig = serde_json::from_str(r#"{ "fee_percent": 3 }"#).unwrap();
        assert_eq!(config.fee_percent, 3);
        assert_eq!(config.minimum_liquidity, Amount::from_u64(1000));
    }
}
