use community_domain::domain::{PlantId, SolarRecord};
use serde::Serialize;

use crate::store::RecordStore;

/// Mean output of each plant for one hour, in kW.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GenerationBreakdown {
    pub plant_1_kw: f64,
    pub plant_2_kw: f64,
}

impl GenerationBreakdown {
    pub fn total_kw(&self) -> f64 {
        self.plant_1_kw + self.plant_2_kw
    }
}

/// Mean `ac_power` of the plant's usable readings for `hour`; 0 when there are none.
pub fn plant_mean(records: &[SolarRecord], hour: u8) -> f64 {
    let (sum, count) = records
        .iter()
        .filter(|r| r.hour == hour)
        .filter_map(SolarRecord::usable_power)
        .fold((0.0, 0usize), |(sum, count), kw| (sum + kw, count + 1));

    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

pub fn breakdown(store: &RecordStore, hour: u8) -> GenerationBreakdown {
    GenerationBreakdown {
        plant_1_kw: plant_mean(store.solar_records_for_plant(PlantId::Plant1), hour),
        plant_2_kw: plant_mean(store.solar_records_for_plant(PlantId::Plant2), hour),
    }
}

/// Total real generation for `hour`: the sum of both plant means, in kW.
pub fn aggregate(store: &RecordStore, hour: u8) -> f64 {
    breakdown(store, hour).total_kw()
}
