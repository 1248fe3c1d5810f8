use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::refine::FlatRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Writes records as CSV with the uniform twelve-column header. Absent
/// values render as empty cells.
pub fn write_records<W: Write>(writer: W, records: &[FlatRecord]) -> ExportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: &Path, records: &[FlatRecord]) -> ExportResult<()> {
    let mut csv_writer = csv::Writer::from_path(path)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
