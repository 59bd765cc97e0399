use std::path::Path;

use anyhow::{anyhow, Result};
use log::info;
use rustc_hash::FxHashSet;

/// Read the cell manifest: a tab-separated table whose `cell` column lists
/// the barcodes to retain. Duplicate entries are collapsed, order of first
/// appearance is kept.
pub fn read_cell_manifest(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .map_err(|e| anyhow!("failed to open manifest {}: {}", path.display(), e))?;

    let headers = reader
        .headers()
        .map_err(|e| anyhow!("failed to parse manifest {}: {}", path.display(), e))?
        .clone();
    let cell_column = headers
        .iter()
        .position(|h| h == "cell")
        .ok_or_else(|| anyhow!("manifest {} has no 'cell' column", path.display()))?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut cells: Vec<String> = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| anyhow!("failed to parse manifest {}: {}", path.display(), e))?;
        if let Some(cell) = record.get(cell_column) {
            if !cell.is_empty() && seen.insert(cell.to_string()) {
                cells.push(cell.to_string());
            }
        }
    }

    info!("Manifest lists {} distinct cells", cells.len());
    Ok(cells)
}
