/// Share of the current load covered by solar versus the grid, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceBreakdown {
    pub solar_pct: f64,
    pub grid_pct: f64,
}

/// Dashboard-ready figures for a single view and hour. All values in kW.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashboardMetrics {
    pub generation_kw: f64,
    pub consumption_kw: f64,
    pub net_balance_kw: f64,
    pub grid_export_kw: f64,
    pub grid_import_kw: f64,
    pub self_consumption_ratio: f64,
    pub source_breakdown: SourceBreakdown,
}

/// One hour of the 24-hour energy flow chart.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyFlowPoint {
    pub hour: u8,
    pub produced_kw: f64,
    pub consumed_kw: f64,
    pub sold_kw: f64,
    pub bought_kw: f64,
    pub efficiency: f64,
}

/// Energy over the 24-hour flow window, in kWh (each hourly point covers one hour).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyTotals {
    pub produced_kwh: f64,
    pub consumed_kwh: f64,
}

/// CO2 avoided by local generation over the 24-hour window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarbonMetrics {
    pub total_offset_kg: f64,
    /// Produced over consumed energy, capped to 0..=1.
    pub baseline_comparison: f64,
}
