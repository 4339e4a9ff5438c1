use community_domain::domain::ScalingConfig;
use serde::{Deserialize, Serialize};

/// Presentation view of the same underlying aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Whole community: plant output scaled to the target capacity.
    Community,
    /// One household's share of plant output and regional demand.
    Household,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Community => "community",
            View::Household => "household",
        }
    }
}

const KW_PER_MW: f64 = 1000.0;

pub fn scale_generation(view: View, total_real_generation_kw: f64, cfg: &ScalingConfig) -> f64 {
    match view {
        View::Community => total_real_generation_kw * cfg.self_sufficiency_factor,
        View::Household => total_real_generation_kw / 1000.0,
    }
}

pub fn scale_consumption(view: View, avg_demand_mw: f64, cfg: &ScalingConfig) -> f64 {
    let demand_kw = avg_demand_mw * KW_PER_MW;
    match view {
        View::Community => demand_kw * cfg.regional_fraction,
        View::Household => demand_kw / cfg.household_divisor as f64,
    }
}
