use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::dataset::DatasetId;
use crate::infra::sqlite::queries::create_dataset_from_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub dataset_id: DatasetId,
    pub row_count: i64,
}

/// Seeds a dataset from a CSV file with a header row.
///
/// The dataset is named after the file stem unless `dataset_name` is given.
/// Short records are padded with empty cells.
pub fn import_csv_to_sqlite(
    db_path: &Path,
    csv_path: &Path,
    dataset_name: Option<&str>,
) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
                .context("failed to parse csv record")
        })
        .collect::<Result<Vec<_>>>()?;

    let source_path = csv_path.to_string_lossy().into_owned();
    let dataset_name = dataset_name
        .map(str::to_string)
        .or_else(|| {
            csv_path
                .file_stem()
                .and_then(|name| name.to_str())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "dataset".to_string());

    let dataset_id = create_dataset_from_rows(db_path, &dataset_name, &source_path, &headers, &rows)?;
    info!(dataset = %dataset_name, rows = rows.len(), "imported csv");

    Ok(ImportResult {
        dataset_id: DatasetId(dataset_id),
        row_count: rows.len() as i64,
    })
}
