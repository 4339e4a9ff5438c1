use community_domain::domain::{CarbonMetrics, EnergyFlowPoint, EnergyTotals};

/// Grid emission intensity used when none is configured (kg CO2 per kWh).
pub const DEFAULT_EMISSION_FACTOR_KG_PER_KWH: f64 = 0.35;

/// Sum an hourly flow into energy totals. Non-finite points count as zero.
pub fn history_totals(flow: &[EnergyFlowPoint]) -> EnergyTotals {
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    flow.iter().fold(EnergyTotals::default(), |acc, p| EnergyTotals {
        produced_kwh: acc.produced_kwh + finite(p.produced_kw),
        consumed_kwh: acc.consumed_kwh + finite(p.consumed_kw),
    })
}

/// Rules:
/// - offset = produced energy × emission factor
/// - baseline comparison = produced ÷ consumed, capped to [0, 1]; 0 without consumption
pub fn carbon_metrics(totals: &EnergyTotals, emission_factor_kg_per_kwh: f64) -> CarbonMetrics {
    let baseline_comparison = if totals.consumed_kwh > 0.0 {
        (totals.produced_kwh / totals.consumed_kwh).clamp(0.0, 1.0)
    } else {
        0.0
    };

    CarbonMetrics {
        total_offset_kg: totals.produced_kwh * emission_factor_kg_per_kwh,
        baseline_comparison,
    }
}
