// ledger/src/tax.rs

use crate::{LedgerError, LedgerResult};
use exchange_core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Transfer tax configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Whether the tax is charged right now
    pub enabled: bool,
    /// Tax rate in whole percent (0-99)
    /// Default: 2
    pub rate_percent: u8,
    /// Receiver of collected tax; burned when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treasury: Option<Address>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_percent: 2,
            treasury: None,
        }
    }
}

impl TaxConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.rate_percent >= 100 {
            return Err(LedgerError::InvalidConfiguration(format!(
                "tax rate must be below 100%, got {}%",
                self.rate_percent
            )));
        }
        Ok(())
    }

    pub fn policy(&self) -> TaxPolicy {
        TaxPolicy::new(self.rate_percent, self.enabled)
    }
}

/// The tax a ledger currently charges on every transfer
///
/// The recipient of `amount` receives `amount - floor(amount * rate / 100)`;
/// the sender is always debited the full `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPolicy {
    rate_percent: u8,
    enabled: bool,
}

impl TaxPolicy {
    pub fn new(rate_percent: u8, enabled: bool) -> Self {
        Self {
            rate_percent: rate_percent.min(99),
            enabled,
        }
    }

    pub fn untaxed() -> Self {
        Self::new(0, false)
    }

    pub fn rate_percent(&self) -> u8 {
        self.rate_percent
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.rate_percent > 0
    }

    /// Tax withheld from a transfer of `amount`
    pub fn tax_on(&self, amount: &Amount) -> Amount {
        if !self.is_active() {
            return Amount::zero();
        }
        amount.percent_floor(self.rate_percent)
    }

    /// What the recipient of a transfer of `amount` ends up with
    pub fn delivered(&self, amount: &Amount) -> Amount {
        amount.saturating_sub(&self.tax_on(amount))
    }

    /// A gross transfer amount guaranteed to deliver at least `net`
    pub fn gross_for(&self, net: &Amount) -> Amount {
        if !self.is_active() {
            return net.clone();
        }
        let hundred = Amount::from_u64(100);
        let kept = Amount::from_u64(100 - u64::from(self.rate_percent));
        // kept > 0 because the rate is capped at 99
        net.mul_div_ceil(&hundred, &kept).unwrap_or_else(|| net.clone())
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::untaxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untaxed_delivers_everything() {
        let policy = TaxPolicy::untaxed();
        let amount = Amount::from_u64(12_345);
        assert!(!policy.is_active());
        assert_eq!(policy.delivered(&amount), amount);
        assert_eq!(policy.gross_for(&amount), amount);
    }

    #[test]
    fn test_disabled_tax_is_inactive() {
        let policy = TaxPolicy::new(2, false);
        assert!(!policy.is_active());
        assert!(policy.tax_on(&Amount::from_u64(1000)).is_zero());
    }

    #[test]
    fn test_tax_floors_in_favor_of_recipient() {
        let policy = TaxPolicy::new(2, true);
        // 2% of 4504094631483166515 = 90081892629663330.3
        let gross: Amount = "4504094631483166515".parse().unwrap();
        assert_eq!(
            policy.delivered(&gross),
            "4414012738853503185".parse::<Amount>().unwrap()
        );
    }

    #[test]
    fn test_gross_for_covers_net() {
        let policy = TaxPolicy::new(2, true);
        for net in [1u64, 49, 50, 98, 1000, 999_999_999] {
            let net = Amount::from_u64(net);
            let gross = policy.gross_for(&net);
            assert!(policy.delivered(&gross) >= net);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(TaxConfig::default().validate().is_ok());
        let config = TaxConfig {
            rate_percent: 100,
            ..TaxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_gross_for_covers_net(rate in 1u8..100, net in 1u64..u64::MAX / 200) {
                let policy = TaxPolicy::new(rate, true);
                let net = Amount::from_u64(net);
                let gross = policy.gross_for(&net);
                prop_assert!(policy.delivered(&gross) >= net);
                prop_assert!(gross >= net);
            }
        }
    }
}
