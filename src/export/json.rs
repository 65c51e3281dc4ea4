use crate::errors::AppResult;
use serde::Serialize;
use std::path::Path;

pub fn write_json<T: Serialize>(rows: &[T], path: &Path) -> AppResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json)?;
    Ok(())
}
