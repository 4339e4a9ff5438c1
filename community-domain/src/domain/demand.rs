use std::fmt;

/// MGP demand zones that make up the community's regional demand.
///
/// The set is closed: columns such as `Total Italy` are never summed, even
/// when present in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    Calabria,
    Sardegna,
    Sicilia,
    North,
    CentralNorthern,
    CentralSouthern,
    Southern,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::Calabria,
        Region::Sardegna,
        Region::Sicilia,
        Region::North,
        Region::CentralNorthern,
        Region::CentralSouthern,
        Region::Southern,
    ];

    /// Column header used by the market export. The misspelling of the
    /// central-southern zone is part of the upstream format.
    pub fn column_name(self) -> &'static str {
        match self {
            Region::Calabria => "Calabria",
            Region::Sardegna => "Sardegna",
            Region::Sicilia => "Sicilia",
            Region::North => "North",
            Region::CentralNorthern => "Central-northern Italy",
            Region::CentralSouthern => "Centeral-southern Italy",
            Region::Southern => "Southern-Italy",
        }
    }

    pub fn from_column(name: &str) -> Option<Region> {
        Region::ALL.into_iter().find(|r| r.column_name() == name)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A 15-minute market period: hour of day (0-23) and quarter within the hour (0-3).
///
/// Only [`DemandPeriod::new`] builds one, so the range always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DemandPeriod {
    hour: u8,
    quarter: u8,
}

impl DemandPeriod {
    pub const PER_HOUR: u8 = 4;

    pub fn new(hour: u8, quarter: u8) -> Option<Self> {
        (hour < 24 && quarter < Self::PER_HOUR).then_some(Self { hour, quarter })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn quarter(self) -> u8 {
        self.quarter
    }
}

impl fmt::Display for DemandPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.quarter * 15)
    }
}

/// Demand of one region for one period, in MW. `None` when the source left
/// the cell empty.
///
/// `source_row` identifies the market row the value came from. Exports spanning
/// several days repeat the same time of day, so records only belong to the same
/// period when both `period` and `source_row` match.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DemandRecord {
    pub period: DemandPeriod,
    pub source_row: usize,
    pub region: Region,
    pub demand_mw: Option<f64>,
}

impl DemandRecord {
    pub fn new(period: DemandPeriod, region: Region, demand_mw: Option<f64>) -> Self {
        Self {
            period,
            source_row: 0,
            region,
            demand_mw,
        }
    }

    pub fn with_source_row(mut self, source_row: usize) -> Self {
        self.source_row = source_row;
        self
    }

    pub fn usable_demand(&self) -> Option<f64> {
        self.demand_mw.filter(|v| v.is_finite())
    }
}
