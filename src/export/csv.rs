use crate::errors::AppResult;
use serde::Serialize;
use std::path::Path;

/// Write `rows` as CSV with a header row taken from the field names.
pub fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> AppResult<()> {
    let mut wtr = ::csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
