use community_domain::domain::{DashboardMetrics, EnergyFlowPoint, SourceBreakdown};

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn source_breakdown(generation_kw: f64, consumption_kw: f64) -> SourceBreakdown {
    let total = generation_kw.max(consumption_kw);
    if total <= 0.0 {
        return SourceBreakdown::default();
    }

    let grid_pct = if consumption_kw > generation_kw {
        (consumption_kw - generation_kw) / total * 100.0
    } else {
        0.0
    };

    SourceBreakdown {
        solar_pct: generation_kw / total * 100.0,
        grid_pct,
    }
}

/// Combine scaled generation and consumption into dashboard figures.
pub fn assemble(generation_kw: f64, consumption_kw: f64) -> DashboardMetrics {
    let generation_kw = finite_or_zero(generation_kw);
    let consumption_kw = finite_or_zero(consumption_kw);
    let net_balance_kw = generation_kw - consumption_kw;

    let self_consumption_ratio = if consumption_kw > 0.0 {
        (generation_kw / consumption_kw).min(1.0)
    } else {
        0.0
    };

    DashboardMetrics {
        generation_kw,
        consumption_kw,
        net_balance_kw,
        grid_export_kw: net_balance_kw.max(0.0),
        grid_import_kw: (-net_balance_kw).max(0.0),
        self_consumption_ratio,
        source_breakdown: source_breakdown(generation_kw, consumption_kw),
    }
}

pub fn flow_point(hour: u8, metrics: &DashboardMetrics) -> EnergyFlowPoint {
    EnergyFlowPoint {
        hour,
        produced_kw: metrics.generation_kw,
        consumed_kw: metrics.consumption_kw,
        sold_kw: metrics.grid_export_kw,
        bought_kw: metrics.grid_import_kw,
        efficiency: metrics.self_consumption_ratio,
    }
}
