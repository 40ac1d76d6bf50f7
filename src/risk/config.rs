use primitive_types::U256;
use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::types::{AccountId, PRECISION, SECONDS_PER_DAY};

fn default_min_leverage() -> u64 {
    PRECISION // 1x
}
fn default_max_leverage() -> u64 {
    100 * PRECISION // 100x
}
fn default_funding_interval_secs() -> u64 {
    6 * 60 * 60
}
fn default_profit_fee_bps() -> u32 {
    200 // 2%
}
fn default_funding_fee_bps() -> u32 {
    200 // 2%
}
fn default_max_daily_funding_rate() -> u64 {
    PRECISION // 100% per day
}
fn default_fee_collector() -> AccountId {
    AccountId([0xfe; 32])
}

/// Engine parameters. Leverage and funding rate are PRECISION (1e8) scaled.
///
/// Loadable from TOML; omitted keys take the defaults:
///
/// ```toml
/// max_leverage = 5000000000        # 50x
/// funding_interval_secs = 3600
/// max_price_age_secs = 60
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineCfg {
    #[serde(default = "default_min_leverage")]
    pub min_leverage: u64,
    #[serde(default = "default_max_leverage")]
    pub max_leverage: u64,
    #[serde(default = "default_funding_interval_secs")]
    pub funding_interval_secs: u64,
    #[serde(default = "default_profit_fee_bps")]
    pub profit_fee_bps: u32,
    #[serde(default = "default_funding_fee_bps")]
    pub funding_fee_bps: u32,
    #[serde(default = "default_max_daily_funding_rate")]
    pub max_daily_funding_rate: u64,
    /// Reject oracle readings older than this. `None` trusts the latest price.
    #[serde(default)]
    pub max_price_age_secs: Option<u64>,
    #[serde(default = "default_fee_collector")]
    pub fee_collector: AccountId,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            min_leverage: default_min_leverage(),
            max_leverage: default_max_leverage(),
            funding_interval_secs: default_funding_interval_secs(),
            profit_fee_bps: default_profit_fee_bps(),
            funding_fee_bps: default_funding_fee_bps(),
            max_daily_funding_rate: default_max_daily_funding_rate(),
            max_price_age_secs: None,
            fee_collector: default_fee_collector(),
        }
    }
}

impl EngineCfg {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EngineCfg =
            toml::from_str(s).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_leverage < PRECISION {
            return Err(EngineError::InvalidConfig(
                "min_leverage below 1x".to_string(),
            ));
        }
        if self.max_leverage < self.min_leverage {
            return Err(EngineError::InvalidConfig(
                "max_leverage below min_leverage".to_string(),
            ));
        }
        if self.funding_interval_secs == 0 || self.funding_interval_secs > SECONDS_PER_DAY {
            return Err(EngineError::InvalidConfig(
                "funding_interval_secs must be in (0, 86400]".to_string(),
            ));
        }
        if self.profit_fee_bps >= 10_000 || self.funding_fee_bps >= 10_000 {
            return Err(EngineError::InvalidConfig(
                "fees must be below 10000 bps".to_string(),
            ));
        }
        // A single event may never take more than the heavy side's whole margin.
        if self.max_daily_funding_rate > self.events_per_day() * PRECISION {
            return Err(EngineError::InvalidConfig(
                "max_daily_funding_rate exceeds 100% per funding event".to_string(),
            ));
        }
        Ok(())
    }

    pub fn events_per_day(&self) -> u64 {
        SECONDS_PER_DAY / self.funding_interval_secs
    }

    pub fn min_leverage_u256(&self) -> U256 {
        U256::from(self.min_leverage)
    }

    pub fn max_leverage_u256(&self) -> U256 {
        U256::from(self.max_leverage)
    }
}
