//! Flat-file store for the raw and processed record sets.
//!
//! Writes are staged to a temp file in the target directory and renamed into
//! place, so a crash mid-write never leaves a truncated file at the output
//! path. Each write fully replaces prior content.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::{ProcessedRecord, RawRow, RepoRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Raw rows read back for transformation, plus the count of rows the reader
/// could not decode at all (these count as excluded in the run summary).
#[derive(Debug, Default)]
pub struct RawReadOutcome {
    pub rows: Vec<RawRow>,
    pub malformed: usize,
}

/// Write the raw record set, replacing any previous file.
pub fn write_raw(path: &Path, records: &[RepoRecord]) -> Result<(), StoreError> {
    write_atomic(path, |writer| {
        for record in records {
            writer.serialize(record)?;
        }
        Ok(())
    })
}

/// Read the raw file leniently.
///
/// Rows that fail to decode are counted rather than aborting the run; shape
/// validation proper happens in the transform.
pub fn read_raw(path: &Path) -> Result<RawReadOutcome, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut outcome = RawReadOutcome::default();
    for result in reader.deserialize::<RawRow>() {
        match result {
            Ok(row) => outcome.rows.push(row),
            Err(err) => {
                outcome.malformed += 1;
                tracing::warn!(path = %path.display(), error = %err, "skipping undecodable row");
            }
        }
    }

    Ok(outcome)
}

/// Write the processed record set, replacing any previous file.
pub fn write_processed(path: &Path, records: &[ProcessedRecord]) -> Result<(), StoreError> {
    write_atomic(path, |writer| {
        for record in records {
            writer.serialize(record)?;
        }
        Ok(())
    })
}

/// Read a processed file back.
pub fn read_processed(path: &Path) -> Result<Vec<ProcessedRecord>, StoreError> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);

    reader
        .deserialize::<ProcessedRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Stage a CSV write to `<name>.tmp` in the target directory, then rename.
fn write_atomic<F>(path: &Path, write_rows: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut csv::Writer<fs::File>) -> Result<(), csv::Error>,
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.csv".to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
    let mut writer = csv::Writer::from_writer(file);

    write_rows(&mut writer).map_err(|e| StoreError::csv(&tmp_path, e))?;

    writer
        .into_inner()
        .map_err(|e| StoreError::io(&tmp_path, e.into_error()))?
        .sync_all()
        .map_err(|e| StoreError::io(&tmp_path, e))?;

    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
