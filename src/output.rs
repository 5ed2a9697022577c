//! Writing collected tables to disk.

use crate::error::CollectorError;
use log::info;
use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Timestamp format used for datetime columns in the CSV output.
pub const CSV_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub async fn ensure_output_dir_exists(path: &Path) -> Result<(), CollectorError> {
    match fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(CollectorError::OutputNotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", path.display());
            fs::create_dir_all(path)
                .await
                .map_err(|e| CollectorError::OutputDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(CollectorError::OutputMetadataRead(path.to_path_buf(), e)),
    }
}

/// Writes a DataFrame as CSV (with header) using a blocking task.
/// The parent directory is created if needed.
pub async fn write_csv(mut df: DataFrame, path: &Path) -> Result<PathBuf, CollectorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_output_dir_exists(parent).await?;
    }

    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut file = std::fs::File::create(&path_buf)
            .map_err(|e| CollectorError::CsvWriteIo(path_buf.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_datetime_format(Some(CSV_DATETIME_FORMAT.to_string()))
            .finish(&mut df)
            .map_err(|e| CollectorError::CsvWritePolars(path_buf.clone(), e))?;
        info!("Wrote {} rows to {}", df.height(), path_buf.display());
        Ok(path_buf)
    })
    .await?
}

/// Lowercases a name and replaces whitespace and path separators with `_`, for use in file names.
///
/// # Examples
///
/// ```
/// use aq_collector::slugify;
///
/// assert_eq!(slugify("Los Angeles"), "los_angeles");
/// assert_eq!(slugify("N. Main St/Hwy 1"), "n._main_st_hwy_1");
/// ```
pub fn slugify(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .to_lowercase()
}
