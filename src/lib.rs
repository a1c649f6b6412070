//! Sort audio files into clean and dirty sets by SNR.
//!
//! Every eligible file in the input directory is scored by an external
//! program, logged to `stats.log` and copied to `clean_audios/` or
//! `dirty_audios/` under the output directory.

pub mod batch;
pub mod config;
pub mod error;
pub mod layout;
pub mod processor;
pub mod scorer;

pub use batch::{default_jobs, discover_audio_files, run_batch, BatchSummary};
pub use config::{Config, ConfigBuilder};
pub use error::{BatchError, ProcessError, ScoreError, SetupError};
pub use layout::OutputLayout;
pub use processor::{Classification, Outcome, DEFAULT_CLEAN_THRESHOLD};
pub use scorer::{parse_score, CommandScorer, Score, Scorer};
