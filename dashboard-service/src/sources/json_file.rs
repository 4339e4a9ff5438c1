use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fs,
    path::PathBuf,
};

use community_domain::domain::{DemandPeriod, DemandRecord, PlantId, Region, SolarRecord};
use serde::Deserialize;
use serde_json::Value;

use super::DatasetSource;
use crate::{
    config::DatasetConfig,
    store::{DataLoadError, RecordStore},
};

/// Dataset exported by the market/solar transformation job as a single JSON document.
///
/// Expected layout:
/// - `solar_data.plant_1.hourly[]` / `solar_data.plant_2.hourly[]` with `hour` (0-23) and
///   `AC_POWER` (kW)
/// - `market_data.demand_data[]` (or top-level `demand_data[]`) with `hour`, optional
///   `period` (quarter, 1-based) and one column per demand zone
///
/// The exporter writes `NaN` / `Infinity` for missing cells, which are read as nulls.
pub struct JsonFileSource {
    path: PathBuf,
    demand_hour_base: u8,
}

impl JsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            demand_hour_base: 1,
        }
    }

    pub fn from_config(cfg: &DatasetConfig) -> Self {
        Self::new(cfg.path.clone()).with_demand_hour_base(cfg.demand_hour_base)
    }

    pub fn with_demand_hour_base(mut self, base: u8) -> Self {
        self.demand_hour_base = base;
        self
    }
}

impl DatasetSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RecordStore, DataLoadError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| DataLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_dataset(&contents, self.demand_hour_base)
    }
}

#[derive(Deserialize)]
struct RawDataset {
    solar_data: Option<RawSolarSection>,
    demand_data: Option<Vec<RawDemandEntry>>,
    market_data: Option<RawMarketSection>,
}

#[derive(Deserialize)]
struct RawSolarSection {
    plant_1: Option<RawPlant>,
    plant_2: Option<RawPlant>,
}

#[derive(Deserialize)]
struct RawPlant {
    hourly: Option<Vec<RawSolarEntry>>,
}

#[derive(Deserialize)]
struct RawSolarEntry {
    #[serde(default)]
    hour: Value,
    #[serde(default, rename = "AC_POWER", alias = "ac_power")]
    ac_power: Option<f64>,
}

#[derive(Deserialize)]
struct RawMarketSection {
    demand_data: Option<Vec<RawDemandEntry>>,
}

#[derive(Deserialize)]
struct RawDemandEntry {
    #[serde(default)]
    hour: Value,
    #[serde(default)]
    period: Value,
    #[serde(flatten)]
    columns: HashMap<String, Value>,
}

/// Parse a dataset document into a [`RecordStore`].
///
/// `demand_hour_base` is the number of the first hour in the demand section (1 for MGP).
pub fn parse_dataset(contents: &str, demand_hour_base: u8) -> Result<RecordStore, DataLoadError> {
    let sanitized = replace_non_standard_numbers(contents);
    let raw: RawDataset = serde_json::from_str(&sanitized)?;

    let solar = raw
        .solar_data
        .ok_or(DataLoadError::MissingSection("solar_data"))?;
    let plant_1 = solar
        .plant_1
        .and_then(|p| p.hourly)
        .ok_or(DataLoadError::MissingSection("solar_data.plant_1.hourly"))?;
    let plant_2 = solar
        .plant_2
        .and_then(|p| p.hourly)
        .ok_or(DataLoadError::MissingSection("solar_data.plant_2.hourly"))?;

    let demand = raw
        .demand_data
        .or_else(|| raw.market_data.and_then(|m| m.demand_data))
        .ok_or(DataLoadError::MissingSection("demand_data"))?;

    let mut solar_records = Vec::with_capacity(plant_1.len() + plant_2.len());
    for (plant_id, entries) in [(PlantId::Plant1, plant_1), (PlantId::Plant2, plant_2)] {
        for (index, entry) in entries.into_iter().enumerate() {
            solar_records.push(solar_record(plant_id, index, entry)?);
        }
    }

    let mut demand_records = Vec::with_capacity(demand.len() * Region::ALL.len());
    for (index, entry) in demand.into_iter().enumerate() {
        push_demand_records(&mut demand_records, index, entry, demand_hour_base)?;
    }

    let store = RecordStore::new(solar_records, demand_records);
    tracing::info!(
        plant_1_records = store.solar_records_for_plant(PlantId::Plant1).len(),
        plant_2_records = store.solar_records_for_plant(PlantId::Plant2).len(),
        demand_records = store.demand_records().len(),
        "dataset parsed"
    );
    Ok(store)
}

fn solar_record(
    plant_id: PlantId,
    index: usize,
    entry: RawSolarEntry,
) -> Result<SolarRecord, DataLoadError> {
    let invalid = |reason: String| DataLoadError::InvalidRecord {
        section: plant_id.section_key(),
        index,
        reason,
    };

    let hour = whole_number(&entry.hour)
        .filter(|h| (0..24).contains(h))
        .ok_or_else(|| invalid(format!("hour {} is not in 0..=23", entry.hour)))?;

    Ok(SolarRecord::new(
        plant_id,
        hour as u8,
        entry.ac_power.unwrap_or(f64::NAN),
    ))
}

/// Expand one market row into a record per demand zone.
///
/// Rows whose hour falls outside the 24-hour day (hour 25 on the day clocks go
/// back) are skipped rather than failing the whole document.
fn push_demand_records(
    out: &mut Vec<DemandRecord>,
    index: usize,
    entry: RawDemandEntry,
    demand_hour_base: u8,
) -> Result<(), DataLoadError> {
    let invalid = |reason: String| DataLoadError::InvalidRecord {
        section: "demand_data",
        index,
        reason,
    };

    let raw_hour = whole_number(&entry.hour)
        .ok_or_else(|| invalid(format!("hour {} is not a whole number", entry.hour)))?;
    let Some(hour) = raw_hour
        .checked_sub(i64::from(demand_hour_base))
        .filter(|h| (0..24).contains(h))
    else {
        metrics::counter!("demand_rows_skipped_total").increment(1);
        tracing::warn!(index, hour = raw_hour, "demand row outside the 24-hour day, skipping");
        return Ok(());
    };

    let quarter = match &entry.period {
        Value::Null => 0,
        other => whole_number(other)
            .and_then(|p| p.checked_sub(1))
            .filter(|q| (0..i64::from(DemandPeriod::PER_HOUR)).contains(q))
            .ok_or_else(|| invalid(format!("period {other} is not in 1..=4")))?,
    };

    let period = DemandPeriod::new(hour as u8, quarter as u8)
        .ok_or_else(|| invalid(format!("hour {hour} / quarter {quarter} is not a valid period")))?;

    let mut values: BTreeMap<Region, Option<f64>> =
        Region::ALL.into_iter().map(|region| (region, None)).collect();
    for (column, value) in entry.columns {
        let Some(region) = Region::from_column(&column) else {
            continue;
        };
        let demand_mw = match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(
                s.trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(format!("{region} value '{s}': {e}")))?,
            ),
            other => return Err(invalid(format!("{region} value {other} is not numeric"))),
        };
        values.insert(region, demand_mw);
    }

    out.extend(values.into_iter().map(|(region, demand_mw)| {
        DemandRecord::new(period, region, demand_mw).with_source_row(index)
    }));

    Ok(())
}

/// Integers may come through as `10.0` when the exporter's column held NaNs.
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

const NON_STANDARD_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Rewrite bare `NaN`, `Infinity` and `-Infinity` tokens to `null`, leaving string
/// literals untouched.
fn replace_non_standard_numbers(input: &str) -> Cow<'_, str> {
    if !NON_STANDARD_TOKENS.iter().any(|t| input.contains(t)) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_STANDARD_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}
