use std::path::PathBuf;

use thiserror::Error;

/// Application-level error carrying the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures that abort an ingest call. Row-level problems never surface here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no valid data rows found")]
    NoData,
    #[error("failed to read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while reading a parameter file.
#[derive(Debug, Error)]
pub enum ParamsFileError {
    #[error("failed to read parameter file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parameter file '{0}' contains no method sections")]
    Empty(PathBuf),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoData => AppError::new(3, "No valid data found."),
            IngestError::Unreadable { .. } => AppError::new(2, err.to_string()),
        }
    }
}

impl From<ParamsFileError> for AppError {
    fn from(err: ParamsFileError) -> Self {
        AppError::new(2, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_errors_map_to_exit_codes() {
        let no_data: AppError = IngestError::NoData.into();
        assert_eq!(no_data.exit_code(), 3);

        let unreadable: AppError = IngestError::Unreadable {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }
        .into();
        assert_eq!(unreadable.exit_code(), 2);
        assert!(unreadable.to_string().contains("missing.txt"));
    }
}
