use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to reset the output tree. Aborts the run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to create '{path}': {source}")]
    Create { path: PathBuf, source: io::Error },
}

/// Failure to list the input directory. Aborts the run.
#[derive(Debug, Error)]
#[error("failed to read input directory '{path}': {source}")]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub source: walkdir::Error,
}

/// Errors produced while obtaining a score for one file.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to start scorer '{program}': {source}")]
    Spawn { program: PathBuf, source: io::Error },

    #[error("scorer i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("scorer did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("scorer output has no score line")]
    MissingLine,

    #[error("scorer output '{0}' is not a number")]
    InvalidNumber(String),
}

/// Errors that fail a single file without touching the rest of the batch.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("failed to append to stats log: {0}")]
    Log(#[source] io::Error),

    #[error("failed to copy into '{destination}': {source}")]
    Copy { destination: PathBuf, source: io::Error },

    #[error("input path has no file name")]
    InvalidInputName,
}

/// Failures that stop the batch before any file is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("failed to open stats log '{path}': {source}")]
    StatsLog { path: PathBuf, source: io::Error },

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
