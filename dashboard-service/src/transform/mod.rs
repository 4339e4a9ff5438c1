//! Pure computation steps: aggregation of the raw datasets, scaling to a
//! presentation view, assembly of dashboard figures, and 24-hour carbon totals.

pub mod assemble;
pub mod carbon;
pub mod demand;
pub mod generation;
pub mod scaling;

pub use assemble::{assemble, flow_point};
pub use carbon::{carbon_metrics, history_totals, DEFAULT_EMISSION_FACTOR_KG_PER_KWH};
pub use demand::InsufficientDataError;
pub use generation::GenerationBreakdown;
pub use scaling::View;
