use std::fmt;

/// The two solar plants the generation dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlantId {
    Plant1,
    Plant2,
}

impl PlantId {
    pub const ALL: [PlantId; 2] = [PlantId::Plant1, PlantId::Plant2];

    /// Key of the plant's section in the source dataset.
    pub fn section_key(self) -> &'static str {
        match self {
            PlantId::Plant1 => "plant_1",
            PlantId::Plant2 => "plant_2",
        }
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_key())
    }
}

/// One inverter reading, bucketed to its hour of day.
///
/// `ac_power` is kept exactly as loaded (kW); readings that are missing in the
/// source are stored as NaN and dropped by aggregation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolarRecord {
    pub plant_id: PlantId,
    pub hour: u8,
    pub ac_power: f64,
}

impl SolarRecord {
    pub fn new(plant_id: PlantId, hour: u8, ac_power: f64) -> Self {
        Self {
            plant_id,
            hour,
            ac_power,
        }
    }

    /// A reading contributes to averages only when it is a finite, non-negative power.
    pub fn usable_power(&self) -> Option<f64> {
        (self.ac_power.is_finite() && self.ac_power >= 0.0).then_some(self.ac_power)
    }
}
