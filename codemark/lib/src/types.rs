//! Error types shared across the crate.

use thiserror::Error;

/// Errors that can occur at the I/O and configuration edges of the pipeline.
///
/// The decoration and overlay passes themselves never return these; a block
/// that cannot be processed is skipped and logged instead.
#[derive(Error, Debug)]
pub enum CodemarkError {
    /// Failed to read a document or settings file.
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to decode JSON settings.
    #[error("Failed to parse settings JSON: {0}")]
    SettingsJson(#[from] serde_json::Error),

    /// Failed to decode YAML settings.
    #[error("Failed to parse settings YAML: {0}")]
    SettingsYaml(#[from] serde_yaml::Error),

    /// Settings file extension is not one we know how to decode.
    #[error("Unsupported settings format: {0}")]
    SettingsFormat(String),

    /// A background reconciliation task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for codemark operations.
pub type CodemarkResult<T> = Result<T, CodemarkError>;
