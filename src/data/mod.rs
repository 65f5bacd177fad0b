/// Data layer: core types, loading, reshaping, projection and labeling.
///
/// Architecture:
/// ```text
///  .csv / .xls(x) / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRecord>   (long format)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ reshape   │  drop rejected, pivot channels → WideTable
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  filter   │   │  label    │  Pos/Neg by RowId, tallies
///   └──────────┘   └──────────┘
///   scatter / parallel views
/// ```

pub mod error;
pub mod filter;
pub mod label;
pub mod loader;
pub mod model;
pub mod reshape;

use std::path::Path;

use error::IngestError;
use model::{UploadSummary, WideTable};

/// Load and reshape an upload in one step.
pub fn ingest_file(path: &Path) -> Result<(WideTable, UploadSummary), IngestError> {
    let records = loader::load_file(path)?;
    let table = reshape::reshape(&records)?;

    // Runs are reported from the raw records, rejected rows included.
    let mut runs: Vec<String> = Vec::new();
    for record in &records {
        if !runs.contains(&record.run) {
            runs.push(record.run.clone());
        }
    }

    let summary = UploadSummary {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        records: records.len(),
        runs,
        rows: table.len(),
        columns: table.column_names().len(),
    };
    Ok((table, summary))
}
