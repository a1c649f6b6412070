use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::error::ProcessError;
use crate::layout::OutputLayout;
use crate::scorer::Scorer;

/// Scores at or above this value are clean.
pub const DEFAULT_CLEAN_THRESHOLD: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Clean,
    Dirty,
}

impl Classification {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Classification::Clean
        } else {
            Classification::Dirty
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Clean => f.write_str("clean"),
            Classification::Dirty => f.write_str("dirty"),
        }
    }
}

/// Result of a file that made it all the way through.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub path: PathBuf,
    pub score: f64,
    pub classification: Classification,
    pub destination: PathBuf,
}

/// Append-only log shared by every worker.
///
/// Each entry is written with a single `write_all` under the lock, so
/// entries from different workers never interleave.
pub struct StatsLog {
    file: Mutex<File>,
}

impl StatsLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn append(&self, path: &Path, score: &str) -> io::Result<()> {
        let entry = format_entry(path, score);
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("stats log lock poisoned"))?;
        file.write_all(entry.as_bytes())
    }
}

pub fn format_entry(path: &Path, score: &str) -> String {
    format!("File Name: {}\nSNR: {} \n\n", path.display(), score)
}

/// Runs the per-file pipeline: score, log, route.
pub struct Processor<'a> {
    scorer: &'a dyn Scorer,
    layout: &'a OutputLayout,
    log: &'a StatsLog,
    threshold: f64,
}

impl<'a> Processor<'a> {
    pub fn new(
        scorer: &'a dyn Scorer,
        layout: &'a OutputLayout,
        log: &'a StatsLog,
        threshold: f64,
    ) -> Self {
        Self {
            scorer,
            layout,
            log,
            threshold,
        }
    }

    pub fn process(&self, path: &Path) -> Result<Outcome, ProcessError> {
        let file_name = path.file_name().ok_or(ProcessError::InvalidInputName)?;

        let score = self.scorer.score(path)?;

        self.log
            .append(path, &score.text)
            .map_err(ProcessError::Log)?;

        let classification = Classification::from_score(score.value, self.threshold);
        let dir = match classification {
            Classification::Clean => &self.layout.clean_dir,
            Classification::Dirty => &self.layout.dirty_dir,
        };
        let destination = dir.join(file_name);

        fs::copy(path, &destination).map_err(|source| ProcessError::Copy {
            destination: destination.clone(),
            source,
        })?;

        debug!(
            "{} -> {} ({})",
            path.display(),
            classification,
            score.value
        );

        Ok(Outcome {
            path: path.to_path_buf(),
            score: score.value,
            classification,
            destination,
        })
    }
}
