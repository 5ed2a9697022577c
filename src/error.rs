use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("API key not found. Please set {0} in the environment")]
    MissingApiKey(&'static str),

    #[error("No OpenAQ locations found for {0}")]
    NoLocations(String),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Output path exists but is not a directory: '{0}'")]
    OutputNotADirectory(PathBuf),

    #[error("Failed to read metadata for output path '{0}'")]
    OutputMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing CSV file '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
