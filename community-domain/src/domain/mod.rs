mod demand;
mod metrics;
mod scaling;
mod solar;

pub use demand::{DemandPeriod, DemandRecord, Region};
pub use metrics::{
    CarbonMetrics, DashboardMetrics, EnergyFlowPoint, EnergyTotals, SourceBreakdown,
};
pub use scaling::{
    ScalingConfig, ValidationError, DEFAULT_HOUSEHOLD_DIVISOR, DEFAULT_REGIONAL_FRACTION,
    DEFAULT_SELF_SUFFICIENCY_FACTOR, SELF_SUFFICIENCY_RANGE,
};
pub use solar::{PlantId, SolarRecord};
