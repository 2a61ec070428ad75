use std::collections::BTreeSet;
use std::fs;

use rollover_core::{Limits, StrategyParams, Timestamp, BPS_DENOMINATOR, DEFAULT_POOL_DEVIATION_RATE};
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Strategy parameters and keeper policy
    pub strategy: StrategyConfig,

    /// Simulated market the keeper runs against
    pub simulation: SimulationConfig,

    /// Optional rewards stream for share holders
    #[serde(default)]
    pub rewards: Option<RewardsConfig>,
}

/// Strategy parameters and rebalancing policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Buffer below which LP is divested
    pub limit_low: u64,

    /// Buffer target after a rebalance
    pub limit_mid: u64,

    /// Buffer above which the surplus is invested
    pub limit_high: u64,

    /// Tolerated reserve-ratio drift per second (WAD-scaled)
    pub pool_deviation_rate: u64,

    /// Width of the start-pool ratio bounds around the live ratio (basis points)
    pub ratio_tolerance_bps: u32,

    /// Minimum seconds between rebalancing actions
    pub min_action_interval: i64,
}

/// Simulated market and deposit flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Unix start time; defaults to now
    #[serde(default)]
    pub start_time: Option<Timestamp>,

    /// Simulated seconds per keeper tick
    pub step_seconds: i64,

    /// Number of keeper ticks
    pub steps: u64,

    /// Base deposited when the strategy is initialized
    pub initial_deposit: u64,

    /// Base deposited by a second holder on every tick
    #[serde(default)]
    pub deposit_per_step: u64,

    /// Series the strategy rotates through
    pub series: Vec<SeriesConfig>,
}

/// One fyToken series and its pool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeriesConfig {
    /// Series number, unique and non-zero
    pub id: u32,

    /// Seconds from the start time to maturity
    pub maturity_offset: i64,

    pub base_reserves: u64,
    pub fy_token_reserves: u64,

    /// Simulated trade flow moving the base reserves every tick (basis points)
    #[serde(default)]
    pub drift_bps: i32,
}

/// Rewards stream started with the strategy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewardsConfig {
    /// Reward tokens emitted per second across all holders
    pub rate: u64,

    /// Seconds the stream runs for
    pub duration: i64,

    /// Funded budget; unbounded when absent
    #[serde(default)]
    pub budget: Option<u64>,
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: KeeperConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        self.strategy.validate()?;
        self.simulation.validate()?;
        if let Some(rewards) = &self.rewards {
            rewards.validate()?;
        }
        Ok(())
    }
}

impl StrategyConfig {
    fn validate(&self) -> KeeperResult<()> {
        self.limits()?;

        if self.ratio_tolerance_bps as u128 > BPS_DENOMINATOR {
            return Err(invalid(
                "ratio_tolerance_bps",
                &self.ratio_tolerance_bps.to_string(),
                "at most 10000 (100%)",
            ));
        }

        if self.min_action_interval < 0 {
            return Err(invalid(
                "min_action_interval",
                &self.min_action_interval.to_string(),
                "non-negative",
            ));
        }

        Ok(())
    }

    pub fn limits(&self) -> KeeperResult<Limits> {
        Limits::new(
            self.limit_low as u128,
            self.limit_mid as u128,
            self.limit_high as u128,
        )
        .map_err(|e| KeeperError::InvalidConfig(e.to_string()))
    }

    pub fn params(&self) -> KeeperResult<StrategyParams> {
        Ok(StrategyParams {
            pool_deviation_rate: self.pool_deviation_rate as u128,
            limits: self.limits()?,
        })
    }
}

impl SimulationConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.step_seconds <= 0 {
            return Err(invalid("step_seconds", &self.step_seconds.to_string(), "greater than 0"));
        }

        if self.initial_deposit == 0 {
            return Err(invalid("initial_deposit", "0", "greater than 0"));
        }

        if self.series.is_empty() {
            return Err(invalid("series", "empty", "at least one series"));
        }

        let mut ids = BTreeSet::new();
        let mut last_maturity = 0;
        for series in &self.series {
            series.validate()?;
            if !ids.insert(series.id) {
                return Err(invalid("series.id", &series.id.to_string(), "unique"));
            }
            if series.maturity_offset <= last_maturity {
                return Err(invalid(
                    "series.maturity_offset",
                    &series.maturity_offset.to_string(),
                    &format!("greater than previous maturity ({})", last_maturity),
                ));
            }
            last_maturity = series.maturity_offset;
        }

        Ok(())
    }

    /// Configured start time, or the current wall-clock time
    pub fn start(&self) -> Timestamp {
        self.start_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

impl SeriesConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.id == 0 {
            return Err(invalid("series.id", "0", "non-zero"));
        }

        if self.base_reserves == 0 || self.fy_token_reserves == 0 {
            return Err(invalid(
                "series reserves",
                &format!("{}/{}", self.base_reserves, self.fy_token_reserves),
                "both greater than 0",
            ));
        }

        if self.drift_bps.unsigned_abs() as u128 >= BPS_DENOMINATOR {
            return Err(invalid("series.drift_bps", &self.drift_bps.to_string(), "within (-10000, 10000)"));
        }

        Ok(())
    }
}

impl RewardsConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.duration <= 0 {
            return Err(invalid("rewards.duration", &self.duration.to_string(), "greater than 0"));
        }

        if let Some(budget) = self.budget {
            let required = self.rate as u128 * self.duration as u128;
            if (budget as u128) < required {
                return Err(invalid(
                    "rewards.budget",
                    &budget.to_string(),
                    &format!("at least rate * duration ({})", required),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(name: &str, value: &str, expected: &str) -> KeeperError {
    KeeperError::InvalidConfig(format!("{} = {}, expected {}", name, value, expected))
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            limit_low: 50_000,
            limit_mid: 100_000,
            limit_high: 200_000,
            pool_deviation_rate: DEFAULT_POOL_DEVIATION_RATE as u64,
            ratio_tolerance_bps: 100, // 1%
            min_action_interval: 3_600,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            step_seconds: 3_600,
            steps: 24 * 90,
            initial_deposit: 1_000_000,
            deposit_per_step: 0,
            series: vec![],
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            simulation: SimulationConfig::default(),
            rewards: None,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let month = 30 * 86_400;
    let example_config = KeeperConfig {
        strategy: StrategyConfig::default(),
        simulation: SimulationConfig {
            start_time: Some(1_700_000_000),
            deposit_per_step: 1_000,
            series: vec![
                SeriesConfig {
                    id: 1,
                    maturity_offset: month,
                    base_reserves: 3_000_000,
                    fy_token_reserves: 1_000_000,
                    drift_bps: 1,
                },
                SeriesConfig {
                    id: 2,
                    maturity_offset: 2 * month,
                    base_reserves: 2_000_000,
                    fy_token_reserves: 1_000_000,
                    drift_bps: 0,
                },
                SeriesConfig {
                    id: 3,
                    maturity_offset: 3 * month,
                    base_reserves: 2_500_000,
                    fy_token_reserves: 1_000_000,
                    drift_bps: -1,
                },
            ],
            ..SimulationConfig::default()
        },
        rewards: Some(RewardsConfig {
            rate: 10,
            duration: 3 * month,
            budget: None,
        }),
    };

    example_config.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(id: u32, maturity_offset: i64) -> SeriesConfig {
        SeriesConfig {
            id,
            maturity_offset,
            base_reserves: 2_000_000,
            fy_token_reserves: 1_000_000,
            drift_bps: 0,
        }
    }

    fn valid() -> KeeperConfig {
        let mut config = KeeperConfig::default();
        config.simulation.series = vec![series(1, 100), series(2, 200)];
        config
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid();
        assert!(config.validate().is_ok());

        // Limits out of order
        config.strategy.limit_low = 300_000;
        assert!(matches!(config.validate(), Err(KeeperError::InvalidConfig(_))));
    }

    #[test]
    fn test_series_validation() {
        let mut config = KeeperConfig::default();
        assert!(config.validate().is_err());

        config.simulation.series = vec![series(1, 200), series(2, 100)];
        assert!(config.validate().is_err());

        config.simulation.series = vec![series(1, 100), series(1, 200)];
        assert!(config.validate().is_err());

        let mut drifting = series(1, 100);
        drifting.drift_bps = -10_000;
        config.simulation.series = vec![drifting];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rewards_budget() {
        let mut config = valid();
        config.rewards = Some(RewardsConfig {
            rate: 2,
            duration: 100,
            budget: Some(199),
        });
        assert!(config.validate().is_err());

        config.rewards = Some(RewardsConfig {
            rate: 2,
            duration: 100,
            budget: Some(200),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: KeeperConfig = toml::from_str(
            r#"
            [strategy]
            limit_low = 1
            limit_mid = 2
            limit_high = 3
            pool_deviation_rate = 100000000000000
            ratio_tolerance_bps = 50
            min_action_interval = 60

            [simulation]
            start_time = 1700000000
            step_seconds = 60
            steps = 10
            initial_deposit = 1000

            [[simulation.series]]
            id = 7
            maturity_offset = 600
            base_reserves = 100
            fy_token_reserves = 50
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert!(config.rewards.is_none());
        assert_eq!(config.simulation.deposit_per_step, 0);
        assert_eq!(config.simulation.series[0].drift_bps, 0);
        assert_eq!(config.simulation.start(), 1_700_000_000);

        let params = config.strategy.params().unwrap();
        assert_eq!(params.limits, Limits { low: 1, mid: 2, high: 3 });
    }

    #[test]
    fn test_example_config_round_trip() {
        let path = std::env::temp_dir().join(format!("rollover-keeper-{}.toml", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        create_example_config(&path).unwrap();
        let loaded = KeeperConfig::load(&path).unwrap();
        assert_eq!(loaded.simulation.series.len(), 3);
        assert_eq!(loaded.simulation.series[2].drift_bps, -1);
        assert!(loaded.rewards.is_some());

        fs::remove_file(&path).unwrap();
    }
}
