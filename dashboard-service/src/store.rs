use std::path::PathBuf;

use community_domain::domain::{DemandRecord, PlantId, SolarRecord};

#[derive(thiserror::Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset is missing required section '{0}'")]
    MissingSection(&'static str),
    #[error("invalid {section} entry #{index}: {reason}")]
    InvalidRecord {
        section: &'static str,
        index: usize,
        reason: String,
    },
}

/// Immutable, in-memory view of the static dataset.
///
/// Built once per load and shared by reference; a refresh replaces the whole
/// store rather than patching it.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    plant_1: Vec<SolarRecord>,
    plant_2: Vec<SolarRecord>,
    demand: Vec<DemandRecord>,
}

impl RecordStore {
    pub fn new<I>(solar: I, demand: Vec<DemandRecord>) -> Self
    where
        I: IntoIterator<Item = SolarRecord>,
    {
        let (plant_1, plant_2): (Vec<_>, Vec<_>) = solar
            .into_iter()
            .partition(|r| r.plant_id == PlantId::Plant1);
        Self {
            plant_1,
            plant_2,
            demand,
        }
    }

    pub fn solar_records_for_plant(&self, plant_id: PlantId) -> &[SolarRecord] {
        match plant_id {
            PlantId::Plant1 => &self.plant_1,
            PlantId::Plant2 => &self.plant_2,
        }
    }

    pub fn demand_records(&self) -> &[DemandRecord] {
        &self.demand
    }

    pub fn solar_len(&self) -> usize {
        self.plant_1.len() + self.plant_2.len()
    }
}
