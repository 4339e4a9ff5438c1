pub mod json_file;

pub use json_file::{parse_dataset, JsonFileSource};

use crate::store::{DataLoadError, RecordStore};

/// Anything that can produce a complete [`RecordStore`] in one go.
pub trait DatasetSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<RecordStore, DataLoadError>;
}

/// Load from `source`, retrying once. A second failure is returned as-is.
pub fn load_with_retry(source: &dyn DatasetSource) -> Result<RecordStore, DataLoadError> {
    match source.load() {
        Ok(store) => Ok(store),
        Err(e) => {
            metrics::counter!("dataset_load_failures_total").increment(1);
            tracing::warn!(
                error = %e,
                source = %source.describe(),
                "dataset load failed, retrying once"
            );
            source.load().map_err(|e| {
                metrics::counter!("dataset_load_failures_total").increment(1);
                tracing::error!(error = %e, source = %source.describe(), "dataset load failed again");
                e
            })
        }
    }
}
