pub mod api;
pub mod clock;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod transform;

pub use pipeline::{DashboardData, DashboardPipeline, EnergySummary, PipelineOptions};
pub use store::{DataLoadError, RecordStore};
