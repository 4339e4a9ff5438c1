use community_domain::domain::ScalingConfig;

use crate::{clock::Granularity, transform::DEFAULT_EMISSION_FACTOR_KG_PER_KWH};
use serde::Deserialize;
use std::{fs, path::PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    /// Hour numbering used by the market export (MGP counts hours 1-24).
    #[serde(default = "default_demand_hour_base")]
    pub demand_hour_base: u8,
}

fn default_demand_hour_base() -> u8 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockConfig {
    #[serde(default)]
    pub utc_offset_hours: i8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumptionConfig {
    /// Average demand over the whole current hour, or use only the current quarter.
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    #[serde(default = "default_true")]
    pub interpolate_missing_hours: bool,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            granularity: default_granularity(),
            interpolate_missing_hours: true,
        }
    }
}

fn default_granularity() -> Granularity {
    Granularity::Hourly
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarbonConfig {
    /// kg CO2 avoided per kWh produced locally.
    #[serde(default = "default_emission_factor")]
    pub emission_factor_kg_per_kwh: f64,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            emission_factor_kg_per_kwh: default_emission_factor(),
        }
    }
}

fn default_emission_factor() -> f64 {
    DEFAULT_EMISSION_FACTOR_KG_PER_KWH
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub scaling: ScalingConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    #[serde(default)]
    pub carbon: CarbonConfig,
    pub server: ServerConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| "dashboard-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{path}': {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.scaling.validate()?;
        if cfg.dataset.demand_hour_base > 1 {
            anyhow::bail!("dataset.demand_hour_base must be 0 or 1");
        }
        let factor = cfg.carbon.emission_factor_kg_per_kwh;
        if !factor.is_finite() || factor < 0.0 {
            anyhow::bail!("carbon.emission_factor_kg_per_kwh must be a non-negative number, got {factor}");
        }
        Ok(cfg)
    }
}
