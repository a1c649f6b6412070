use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::SetupError;

pub const STATS_LOG: &str = "stats.log";
pub const ERRORS_LOG: &str = "errors.log";
pub const CLEAN_DIR: &str = "clean_audios";
pub const DIRTY_DIR: &str = "dirty_audios";

/// Paths making up one run's output tree.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub stats_log: PathBuf,
    pub errors_log: PathBuf,
    pub clean_dir: PathBuf,
    pub dirty_dir: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            stats_log: root.join(STATS_LOG),
            errors_log: root.join(ERRORS_LOG),
            clean_dir: root.join(CLEAN_DIR),
            dirty_dir: root.join(DIRTY_DIR),
            root,
        }
    }

    /// Wipe the previous run's results and recreate empty directories.
    ///
    /// Anything else living under the root is left alone.
    pub fn prepare(&self) -> Result<(), SetupError> {
        for log_file in [&self.stats_log, &self.errors_log] {
            if log_file.exists() {
                debug!("removing {}", log_file.display());
                fs::remove_file(log_file).map_err(|source| SetupError::Remove {
                    path: log_file.clone(),
                    source,
                })?;
            }
        }

        for dir in [&self.clean_dir, &self.dirty_dir] {
            if dir.exists() {
                debug!("removing {}", dir.display());
                fs::remove_dir_all(dir).map_err(|source| SetupError::Remove {
                    path: dir.clone(),
                    source,
                })?;
            }
            fs::create_dir_all(dir).map_err(|source| SetupError::Create {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }
}
