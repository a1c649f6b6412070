use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::default_jobs;
use crate::processor::DEFAULT_CLEAN_THRESHOLD;
use crate::scorer::CommandScorer;

/// Settings for one classification run.
#[derive(Clone, Debug)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Worker threads. Defaults to available cores minus one.
    pub jobs: usize,
    /// Scores at or above this are clean.
    pub threshold: f64,
    /// Scorer script; `None` means `calculate_SNR.sh` next to the binary.
    pub scorer: Option<PathBuf>,
    pub scorer_timeout: Option<Duration>,
}

impl Config {
    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>>(input_dir: P, output_dir: Q) -> ConfigBuilder {
        ConfigBuilder {
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            jobs: None,
            threshold: DEFAULT_CLEAN_THRESHOLD,
            scorer: None,
            scorer_timeout: None,
        }
    }

    pub fn command_scorer(&self) -> CommandScorer {
        let scorer = match &self.scorer {
            Some(script) => CommandScorer::script(script),
            None => CommandScorer::default_script(),
        };
        scorer.with_timeout(self.scorer_timeout)
    }
}

pub struct ConfigBuilder {
    input_dir: PathBuf,
    output_dir: PathBuf,
    jobs: Option<usize>,
    threshold: f64,
    scorer: Option<PathBuf>,
    scorer_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Zero is treated as one.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn scorer<P: Into<PathBuf>>(mut self, script: P) -> Self {
        self.scorer = Some(script.into());
        self
    }

    pub fn scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Config {
        Config {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            jobs: self.jobs.unwrap_or_else(default_jobs),
            threshold: self.threshold,
            scorer: self.scorer,
            scorer_timeout: self.scorer_timeout,
        }
    }
}
