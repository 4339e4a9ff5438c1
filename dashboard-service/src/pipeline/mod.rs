use std::sync::Arc;

use community_domain::domain::{
    CarbonMetrics, DashboardMetrics, EnergyFlowPoint, EnergyTotals, ScalingConfig, ValidationError,
};
use parking_lot::RwLock;
use serde::Serialize;

use crate::{
    clock::{key_at, Clock, Granularity, SystemClock, TimeKey},
    config::AppConfig,
    sources::{load_with_retry, DatasetSource},
    store::{DataLoadError, RecordStore},
    transform::{
        assemble, carbon_metrics, demand, flow_point, generation, history_totals,
        scaling::{scale_consumption, scale_generation},
        GenerationBreakdown, InsufficientDataError, View, DEFAULT_EMISSION_FACTOR_KG_PER_KWH,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub demand_granularity: Granularity,
    pub interpolate_missing_hours: bool,
    pub emission_factor_kg_per_kwh: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            demand_granularity: Granularity::Hourly,
            interpolate_missing_hours: true,
            emission_factor_kg_per_kwh: DEFAULT_EMISSION_FACTOR_KG_PER_KWH,
        }
    }
}

/// Unscaled inputs the dashboard figures were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawAggregates {
    pub total_real_generation_kw: f64,
    pub avg_demand_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub view: View,
    pub hour: u8,
    pub metrics: DashboardMetrics,
    pub raw: RawAggregates,
    pub generation: GenerationBreakdown,
    pub scaling: ScalingConfig,
}

/// Result of a dashboard query. Missing demand data is reported, not raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardData {
    Available(DashboardSnapshot),
    Unavailable {
        view: View,
        hour: u8,
        generation_kw: f64,
        reason: String,
    },
}

impl DashboardData {
    pub fn metrics(&self) -> Option<&DashboardMetrics> {
        match self {
            DashboardData::Available(s) => Some(&s.metrics),
            DashboardData::Unavailable { .. } => None,
        }
    }
}

/// 24-hour energy history and the carbon figures derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySummary {
    pub view: View,
    pub history_24h: EnergyTotals,
    pub carbon: CarbonMetrics,
}

/// Aggregates for one hour, computed once and rendered into any view.
#[derive(Debug, Clone, PartialEq)]
pub struct HourAggregates {
    pub hour: u8,
    pub generation: GenerationBreakdown,
    pub avg_demand_mw: Result<f64, InsufficientDataError>,
}

impl HourAggregates {
    pub fn render(&self, view: View, cfg: &ScalingConfig) -> DashboardData {
        let total_real_generation_kw = self.generation.total_kw();
        let generation_kw = scale_generation(view, total_real_generation_kw, cfg);

        match self.avg_demand_mw {
            Ok(avg_demand_mw) => {
                let consumption_kw = scale_consumption(view, avg_demand_mw, cfg);
                DashboardData::Available(DashboardSnapshot {
                    view,
                    hour: self.hour,
                    metrics: assemble(generation_kw, consumption_kw),
                    raw: RawAggregates {
                        total_real_generation_kw,
                        avg_demand_mw,
                    },
                    generation: self.generation,
                    scaling: *cfg,
                })
            }
            Err(e) => DashboardData::Unavailable {
                view,
                hour: self.hour,
                generation_kw,
                reason: e.to_string(),
            },
        }
    }
}

/// Serves dashboard queries from an immutable record store.
///
/// The store is swapped wholesale on reload. Each computation takes its own
/// copy of the scaling config before touching the data.
pub struct DashboardPipeline {
    store: RwLock<Arc<RecordStore>>,
    scaling: RwLock<ScalingConfig>,
    clock: Arc<dyn Clock>,
    options: PipelineOptions,
}

impl DashboardPipeline {
    pub fn new(
        store: RecordStore,
        scaling: ScalingConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        scaling.validate()?;
        Ok(Self {
            store: RwLock::new(Arc::new(store)),
            scaling: RwLock::new(scaling),
            clock,
            options: PipelineOptions::default(),
        })
    }

    /// Load the dataset (one retry) and wire the wall clock and options from `cfg`.
    pub fn from_config(cfg: &AppConfig, source: &dyn DatasetSource) -> anyhow::Result<Self> {
        let store = load_with_retry(source)?;
        let clock = SystemClock::with_offset_hours(cfg.clock.utc_offset_hours)
            .map_err(|e| anyhow::anyhow!("invalid clock.utc_offset_hours: {e}"))?;
        let pipeline = Self::new(store, cfg.scaling, Arc::new(clock))?.with_options(PipelineOptions {
            demand_granularity: cfg.consumption.granularity,
            interpolate_missing_hours: cfg.consumption.interpolate_missing_hours,
            emission_factor_kg_per_kwh: cfg.carbon.emission_factor_kg_per_kwh,
        });

        tracing::info!(
            source = %source.describe(),
            solar_records = pipeline.store().solar_len(),
            demand_records = pipeline.store().demand_records().len(),
            self_sufficiency_factor = cfg.scaling.self_sufficiency_factor,
            "dashboard pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> Arc<RecordStore> {
        self.store.read().clone()
    }

    pub fn scaling(&self) -> ScalingConfig {
        *self.scaling.read()
    }

    /// Per-household view for the current hour.
    pub fn get_dashboard_data(&self) -> DashboardData {
        self.current(View::Household)
    }

    /// Community view for the current hour.
    pub fn get_community_dashboard_data(&self) -> DashboardData {
        self.current(View::Community)
    }

    /// Both views (household, community) from a single aggregation pass.
    pub fn current_views(&self) -> (DashboardData, DashboardData) {
        let cfg = self.scaling();
        let aggregates = self.current_aggregates();
        let household = aggregates.render(View::Household, &cfg);
        let community = aggregates.render(View::Community, &cfg);
        record_query(&household);
        record_query(&community);
        (household, community)
    }

    fn current(&self, view: View) -> DashboardData {
        let cfg = self.scaling();
        let data = self.current_aggregates().render(view, &cfg);
        record_query(&data);
        data
    }

    fn current_aggregates(&self) -> HourAggregates {
        let store = self.store();
        let now = self.clock.now();
        let hour = key_at(now, Granularity::Hourly).hour();
        let demand_key = key_at(now, self.options.demand_granularity);
        self.aggregates_at(&store, hour, demand_key)
    }

    fn aggregates_at(&self, store: &RecordStore, hour: u8, demand_key: TimeKey) -> HourAggregates {
        let generation = generation::breakdown(store, hour);
        let avg_demand_mw = match demand::aggregate(store, demand_key) {
            Err(e) if self.options.interpolate_missing_hours => {
                tracing::debug!(key = %demand_key, "no demand for key, interpolating");
                demand::interpolate(store, hour).map_err(|_| e)
            }
            other => other,
        };

        tracing::debug!(
            hour,
            plant_1_kw = generation.plant_1_kw,
            plant_2_kw = generation.plant_2_kw,
            avg_demand_mw = ?avg_demand_mw,
            "hour aggregated"
        );

        HourAggregates {
            hour,
            generation,
            avg_demand_mw,
        }
    }

    /// Hourly flow for the 24 hours preceding the current one, oldest first.
    /// Hours for which no demand can be derived report zero consumption.
    pub fn energy_flow_24h(&self, view: View) -> Vec<EnergyFlowPoint> {
        let cfg = self.scaling();
        let store = self.store();
        let current_hour = key_at(self.clock.now(), Granularity::Hourly).hour();

        (1..=24u8)
            .rev()
            .map(|hours_back| {
                let hour = (current_hour + 24 - hours_back) % 24;
                let aggregates = self.aggregates_at(&store, hour, TimeKey::Hour(hour));
                let generation_kw = scale_generation(view, aggregates.generation.total_kw(), &cfg);
                let consumption_kw = aggregates
                    .avg_demand_mw
                    .map(|mw| scale_consumption(view, mw, &cfg))
                    .unwrap_or(0.0);
                flow_point(hour, &assemble(generation_kw, consumption_kw))
            })
            .collect()
    }

    /// Energy totals over the 24-hour flow window and the CO2 offset they imply.
    pub fn energy_summary(&self, view: View) -> EnergySummary {
        let history_24h = history_totals(&self.energy_flow_24h(view));
        let carbon = carbon_metrics(&history_24h, self.options.emission_factor_kg_per_kwh);
        tracing::debug!(
            view = view.as_str(),
            produced_kwh = history_24h.produced_kwh,
            consumed_kwh = history_24h.consumed_kwh,
            total_offset_kg = carbon.total_offset_kg,
            "energy summary computed"
        );
        EnergySummary {
            view,
            history_24h,
            carbon,
        }
    }

    /// Set the self-sufficiency factor. Out-of-range values are rejected and
    /// the current config stays in place.
    pub fn set_self_sufficiency_factor(&self, value: f64) -> Result<ScalingConfig, ValidationError> {
        let mut guard = self.scaling.write();
        let updated = guard
            .with_self_sufficiency_factor(value)
            .inspect_err(reject_update)?;
        *guard = updated;
        tracing::info!(self_sufficiency_factor = value, "self-sufficiency factor updated");
        Ok(updated)
    }

    pub fn update_scaling(&self, cfg: ScalingConfig) -> Result<ScalingConfig, ValidationError> {
        cfg.validate().inspect_err(reject_update)?;
        *self.scaling.write() = cfg;
        tracing::info!(
            self_sufficiency_factor = cfg.self_sufficiency_factor,
            household_divisor = cfg.household_divisor,
            regional_fraction = cfg.regional_fraction,
            "scaling config replaced"
        );
        Ok(cfg)
    }

    /// Replace the store with a fresh load. On failure the current store keeps serving.
    pub fn reload(&self, source: &dyn DatasetSource) -> Result<(), DataLoadError> {
        let store = load_with_retry(source)?;
        tracing::info!(
            source = %source.describe(),
            solar_records = store.solar_len(),
            demand_records = store.demand_records().len(),
            "dataset reloaded"
        );
        *self.store.write() = Arc::new(store);
        Ok(())
    }
}

fn record_query(data: &DashboardData) {
    match data {
        DashboardData::Available(s) => {
            metrics::counter!("dashboard_requests_total", "view" => s.view.as_str()).increment(1);
            tracing::info!(
                view = s.view.as_str(),
                hour = s.hour,
                generation_kw = s.metrics.generation_kw,
                consumption_kw = s.metrics.consumption_kw,
                net_balance_kw = s.metrics.net_balance_kw,
                "dashboard computed"
            );
        }
        DashboardData::Unavailable {
            view, hour, reason, ..
        } => {
            metrics::counter!("dashboard_requests_total", "view" => view.as_str()).increment(1);
            metrics::counter!("dashboard_unavailable_total", "view" => view.as_str()).increment(1);
            tracing::warn!(view = view.as_str(), hour, %reason, "dashboard data unavailable");
        }
    }
}

fn reject_update(e: &ValidationError) {
    metrics::counter!("scaling_updates_rejected_total").increment(1);
    tracing::warn!(error = %e, "scaling update rejected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use community_domain::domain::{DemandPeriod, DemandRecord, PlantId, Region, SolarRecord};
    use time::macros::datetime;

    fn demand_period(hour: u8, quarter: u8, values: &[(Region, Option<f64>)]) -> Vec<DemandRecord> {
        let period = DemandPeriod::new(hour, quarter).unwrap();
        Region::ALL
            .into_iter()
            .map(|region| {
                let value = values
                    .iter()
                    .find(|(r, _)| *r == region)
                    .map(|(_, v)| *v)
                    .unwrap_or(Some(0.0));
                DemandRecord::new(period, region, value)
            })
            .collect()
    }

    /// Hour 10: plants at [100, 200] and [50] kW; demand 800 MW with one NaN zone.
    fn scenario_store() -> RecordStore {
        RecordStore::new(
            vec![
                SolarRecord::new(PlantId::Plant1, 10, 100.0),
                SolarRecord::new(PlantId::Plant1, 10, 200.0),
                SolarRecord::new(PlantId::Plant2, 10, 50.0),
            ],
            demand_period(
                10,
                0,
                &[
                    (Region::Calabria, Some(500.0)),
                    (Region::Sardegna, Some(300.0)),
                    (Region::Sicilia, Some(f64::NAN)),
                ],
            ),
        )
    }

    fn pipeline_at(store: RecordStore, at: time::OffsetDateTime) -> DashboardPipeline {
        DashboardPipeline::new(store, ScalingConfig::default(), Arc::new(FixedClock(at))).unwrap()
    }

    fn available(data: DashboardData) -> DashboardSnapshot {
        match data {
            DashboardData::Available(s) => s,
            other => panic!("expected available data, got {other:?}"),
        }
    }

    #[test]
    fn community_view_matches_scenario() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:20:00 UTC));
        let s = available(pipeline.get_community_dashboard_data());

        assert_eq!(s.view, View::Community);
        assert_eq!(s.hour, 10);
        assert_eq!(s.raw.total_real_generation_kw, 200.0);
        assert_eq!(s.raw.avg_demand_mw, 800.0);
        assert_eq!(s.metrics.generation_kw, 240.0);
        assert_eq!(s.metrics.consumption_kw, 800.0);
        assert_eq!(s.metrics.net_balance_kw, -560.0);
        assert_eq!(s.metrics.grid_export_kw, 0.0);
    }

    #[test]
    fn household_view_matches_scenario() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:20:00 UTC));
        let s = available(pipeline.get_dashboard_data());

        assert_eq!(s.view, View::Household);
        assert_eq!(s.metrics.generation_kw, 0.2);
        assert_eq!(s.metrics.consumption_kw, 0.4);
        assert_eq!(s.metrics.grid_export_kw, 0.0);
    }

    #[test]
    fn both_views_share_one_aggregation() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:00:00 UTC));
        let (household, community) = pipeline.current_views();
        let (household, community) = (available(household), available(community));

        assert_eq!(household.raw, community.raw);
        assert_eq!(household, available(pipeline.get_dashboard_data()));
        assert_eq!(community, available(pipeline.get_community_dashboard_data()));
    }

    #[test]
    fn queries_are_idempotent() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:59:59 UTC));
        assert_eq!(pipeline.get_dashboard_data(), pipeline.get_dashboard_data());
        assert_eq!(
            pipeline.get_community_dashboard_data(),
            pipeline.get_community_dashboard_data()
        );
    }

    #[test]
    fn hour_without_solar_generates_zero() {
        let store = RecordStore::new(Vec::new(), scenario_store().demand_records().to_vec());
        let pipeline = pipeline_at(store, datetime!(2025-10-27 10:00:00 UTC));
        let s = available(pipeline.get_community_dashboard_data());
        assert_eq!(s.metrics.generation_kw, 0.0);
        assert_eq!(s.raw.total_real_generation_kw, 0.0);
    }

    #[test]
    fn missing_demand_is_interpolated_by_default() {
        let mut demand = demand_period(8, 0, &[(Region::North, Some(1000.0))]);
        demand.extend(demand_period(12, 0, &[(Region::North, Some(2000.0))]));
        let store = RecordStore::new(Vec::new(), demand);

        let pipeline = pipeline_at(store, datetime!(2025-10-27 10:00:00 UTC));
        let s = available(pipeline.get_community_dashboard_data());
        assert_eq!(s.raw.avg_demand_mw, 1500.0);
    }

    #[test]
    fn missing_demand_without_interpolation_is_unavailable() {
        let store = RecordStore::new(
            vec![SolarRecord::new(PlantId::Plant1, 3, 10.0)],
            demand_period(8, 0, &[(Region::North, Some(1000.0))]),
        );
        let pipeline = pipeline_at(store, datetime!(2025-10-27 03:00:00 UTC)).with_options(
            PipelineOptions {
                interpolate_missing_hours: false,
                ..PipelineOptions::default()
            },
        );

        match pipeline.get_community_dashboard_data() {
            DashboardData::Unavailable {
                view,
                hour,
                generation_kw,
                ..
            } => {
                assert_eq!(view, View::Community);
                assert_eq!(hour, 3);
                assert_eq!(generation_kw, 12.0);
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_is_unavailable_even_with_interpolation() {
        let pipeline = pipeline_at(RecordStore::default(), datetime!(2025-10-27 03:00:00 UTC));
        let data = pipeline.get_dashboard_data();
        assert!(data.metrics().is_none());
    }

    #[test]
    fn quarter_hour_granularity_uses_current_period_only() {
        let mut demand = demand_period(10, 0, &[(Region::North, Some(1000.0))]);
        demand.extend(demand_period(10, 2, &[(Region::North, Some(3000.0))]));
        let store = RecordStore::new(Vec::new(), demand);
        let options = PipelineOptions {
            demand_granularity: Granularity::QuarterHour,
            ..PipelineOptions::default()
        };

        let at_half_past = pipeline_at(store.clone(), datetime!(2025-10-27 10:35:00 UTC))
            .with_options(options);
        assert_eq!(available(at_half_past.get_dashboard_data()).raw.avg_demand_mw, 3000.0);

        let hourly = pipeline_at(store, datetime!(2025-10-27 10:35:00 UTC));
        assert_eq!(available(hourly.get_dashboard_data()).raw.avg_demand_mw, 2000.0);
    }

    #[test]
    fn self_sufficiency_update_applies_to_next_computation() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:00:00 UTC));
        let before = available(pipeline.get_community_dashboard_data());

        let cfg = pipeline.set_self_sufficiency_factor(2.0).unwrap();
        assert_eq!(cfg.self_sufficiency_factor, 2.0);

        let after = available(pipeline.get_community_dashboard_data());
        assert_eq!(before.metrics.generation_kw, 240.0);
        assert_eq!(after.metrics.generation_kw, 400.0);
        assert_eq!(after.scaling.self_sufficiency_factor, 2.0);
    }

    #[test]
    fn rejected_update_leaves_config_untouched() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:00:00 UTC));
        assert!(matches!(
            pipeline.set_self_sufficiency_factor(2.5),
            Err(ValidationError::SelfSufficiencyOutOfRange { .. })
        ));
        assert!(pipeline
            .update_scaling(ScalingConfig {
                household_divisor: 0,
                ..ScalingConfig::default()
            })
            .is_err());
        assert_eq!(pipeline.scaling(), ScalingConfig::default());
    }

    #[test]
    fn invalid_initial_scaling_is_rejected() {
        let cfg = ScalingConfig {
            self_sufficiency_factor: 0.1,
            ..ScalingConfig::default()
        };
        let res = DashboardPipeline::new(
            RecordStore::default(),
            cfg,
            Arc::new(FixedClock(datetime!(2025-10-27 10:00:00 UTC))),
        );
        assert!(res.is_err());
    }

    #[test]
    fn energy_flow_covers_the_previous_24_hours() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 11:15:00 UTC));
        let flow = pipeline.energy_flow_24h(View::Community);

        assert_eq!(flow.len(), 24);
        assert_eq!(flow.first().unwrap().hour, 11);
        assert_eq!(flow.last().unwrap().hour, 10);

        let ten = flow.last().unwrap();
        assert_eq!(ten.produced_kw, 240.0);
        assert_eq!(ten.consumed_kw, 800.0);
        assert_eq!(ten.bought_kw, 560.0);
        assert_eq!(ten.sold_kw, 0.0);
    }

    #[test]
    fn energy_flow_reports_zero_consumption_without_demand() {
        let store = RecordStore::new(vec![SolarRecord::new(PlantId::Plant2, 5, 40.0)], Vec::new());
        let pipeline = pipeline_at(store, datetime!(2025-10-27 06:00:00 UTC));
        let flow = pipeline.energy_flow_24h(View::Household);

        let five = flow.iter().find(|p| p.hour == 5).unwrap();
        assert_eq!(five.produced_kw, 0.04);
        assert_eq!(five.consumed_kw, 0.0);
        assert_eq!(five.sold_kw, 0.04);
    }

    #[test]
    fn energy_summary_totals_the_24h_flow() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 11:15:00 UTC))
            .with_options(PipelineOptions {
                interpolate_missing_hours: false,
                emission_factor_kg_per_kwh: 0.5,
                ..PipelineOptions::default()
            });
        let summary = pipeline.energy_summary(View::Community);

        // Only hour 10 has data: 240 kWh produced, 800 kWh consumed.
        assert_eq!(summary.view, View::Community);
        assert_eq!(summary.history_24h.produced_kwh, 240.0);
        assert_eq!(summary.history_24h.consumed_kwh, 800.0);
        assert_eq!(summary.carbon.total_offset_kg, 120.0);
        assert_eq!(summary.carbon.baseline_comparison, 0.3);
    }

    #[test]
    fn energy_summary_without_consumption_has_no_baseline() {
        let store = RecordStore::new(vec![SolarRecord::new(PlantId::Plant1, 5, 100.0)], Vec::new());
        let pipeline = pipeline_at(store, datetime!(2025-10-27 06:00:00 UTC));
        let summary = pipeline.energy_summary(View::Community);

        assert_eq!(summary.history_24h.produced_kwh, 120.0);
        assert_eq!(summary.history_24h.consumed_kwh, 0.0);
        assert_eq!(summary.carbon.total_offset_kg, 120.0 * 0.35);
        assert_eq!(summary.carbon.baseline_comparison, 0.0);
    }

    struct StaticSource(Option<RecordStore>);

    impl DatasetSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn load(&self) -> Result<RecordStore, DataLoadError> {
            self.0
                .clone()
                .ok_or(DataLoadError::MissingSection("solar_data"))
        }
    }

    #[test]
    fn reload_swaps_the_store_wholesale() {
        let pipeline = pipeline_at(RecordStore::default(), datetime!(2025-10-27 10:00:00 UTC));
        assert!(pipeline.get_dashboard_data().metrics().is_none());

        pipeline.reload(&StaticSource(Some(scenario_store()))).unwrap();
        assert!(pipeline.get_dashboard_data().metrics().is_some());
    }

    #[test]
    fn failed_reload_keeps_the_previous_store() {
        let pipeline = pipeline_at(scenario_store(), datetime!(2025-10-27 10:00:00 UTC));
        assert!(pipeline.reload(&StaticSource(None)).is_err());
        assert_eq!(pipeline.store().solar_len(), 3);
        assert!(pipeline.get_community_dashboard_data().metrics().is_some());
    }
}
