use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A fact that cannot be built without leaving whole non-negative numbers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactError {
    #[error("subtraction {top} - {bottom} would be negative")]
    NegativeDifference { top: u32, bottom: u32 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{top} is not evenly divisible by {bottom}")]
    InexactQuotient { top: u32, bottom: u32 },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    #[error("problem has no start time")]
    NotStarted,

    #[error("problem already has an end time")]
    AlreadyEnded,

    #[error("end time is before start time")]
    EndBeforeStart,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("no problem category is enabled for this choice")]
    NoCategoryEnabled,

    #[error("practice has already started")]
    AlreadyStarted,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write to report directory: '{}' already exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot write to report directory: '{}' could not be created: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write to report file: '{}' could not be written: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fact(#[from] FactError),
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
