use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{BatchError, DiscoveryError, ProcessError};
use crate::layout::OutputLayout;
use crate::processor::{Classification, Outcome, Processor, StatsLog};
use crate::scorer::Scorer;

pub const AUDIO_EXTENSIONS: [&str; 3] = [".wav", ".flac", ".mp3"];

pub fn is_audio_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| {
            let name = n.as_encoded_bytes();
            AUDIO_EXTENSIONS
                .iter()
                .any(|ext| name.ends_with(ext.as_bytes()))
        })
        .unwrap_or(false)
}

/// Eligible files directly inside `input_dir`, sorted by path.
pub fn discover_audio_files(input_dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| DiscoveryError {
            path: input_dir.to_path_buf(),
            source,
        })?;
        // Links to regular files count; `Path::is_file` follows them.
        if entry.path().is_file() && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// One worker per core, keeping one core free. Never below one.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub clean: Vec<Outcome>,
    pub dirty: Vec<Outcome>,
    pub failed: Vec<(PathBuf, ProcessError)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.clean.len() + self.dirty.len() + self.failed.len()
    }

    fn record(&mut self, path: PathBuf, result: Result<Outcome, ProcessError>) {
        match result {
            Ok(outcome) => match outcome.classification {
                Classification::Clean => self.clean.push(outcome),
                Classification::Dirty => self.dirty.push(outcome),
            },
            Err(e) => self.failed.push((path, e)),
        }
    }
}

/// Reset the output tree, then score and route every eligible input file.
///
/// Per-file failures end up in the summary (and `errors.log`) instead of
/// aborting the batch.
pub fn run_batch(config: &Config, scorer: &dyn Scorer) -> Result<BatchSummary, BatchError> {
    let layout = OutputLayout::new(&config.output_dir);
    layout.prepare()?;

    let files = discover_audio_files(&config.input_dir)?;
    info!(
        "found {} audio files in {}",
        files.len(),
        config.input_dir.display()
    );

    let log = StatsLog::open(&layout.stats_log).map_err(|source| BatchError::StatsLog {
        path: layout.stats_log.clone(),
        source,
    })?;
    let errors = Mutex::new(None);
    let processor = Processor::new(scorer, &layout, &log, config.threshold);

    info!("processing with {} workers", config.jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;

    let results: Vec<_> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = processor.process(path);
                if let Err(e) = &result {
                    warn!("failed: {} - {}", path.display(), e);
                    if let Err(log_err) = append_error(&layout, &errors, path, e) {
                        warn!("could not record failure for {}: {}", path.display(), log_err);
                    }
                }
                (path.clone(), result)
            })
            .collect()
    });
    drop(pool);

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        summary.record(path, result);
    }

    info!(
        "done: {} clean, {} dirty, {} failed",
        summary.clean.len(),
        summary.dirty.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// `errors.log` is only created once something actually fails.
fn append_error(
    layout: &OutputLayout,
    errors: &Mutex<Option<std::fs::File>>,
    path: &Path,
    error: &ProcessError,
) -> io::Result<()> {
    let mut guard = errors
        .lock()
        .map_err(|_| io::Error::other("error log lock poisoned"))?;
    if guard.is_none() {
        *guard = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&layout.errors_log)?,
        );
    }
    match guard.as_mut() {
        Some(file) => file.write_all(format!("{}: {}\n", path.display(), error).as_bytes()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn audio_extension_check() {
        assert!(is_audio_file(Path::new("dir/a.wav")));
        assert!(is_audio_file(Path::new("b.flac")));
        assert!(is_audio_file(Path::new("c.mp3")));
        assert!(!is_audio_file(Path::new("notes.txt")));
        assert!(!is_audio_file(Path::new("upper.WAV")));
        assert!(!is_audio_file(Path::new("wav")));
    }

    #[test]
    fn discovery_is_flat_filtered_and_sorted() {
        let dir = tempdir().unwrap();
        for name in ["c.mp3", "a.wav", "notes.txt", "b.flac"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.wav"), b"x").unwrap();
        fs::create_dir(dir.path().join("folder.wav")).unwrap();

        let files = discover_audio_files(dir.path()).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.flac", "c.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn discovery_includes_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let name = OsStr::from_bytes(b"caf\xe9.wav");
        let path = dir.path().join(name);
        if fs::write(&path, b"x").is_err() {
            // Some filesystems refuse non-UTF-8 names outright.
            return;
        }

        assert!(is_audio_file(&path));
        assert_eq!(discover_audio_files(dir.path()).unwrap(), vec![path]);
    }

    #[cfg(unix)]
    #[test]
    fn discovery_follows_links_to_files() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let target_dir = tempdir().unwrap();
        let target = target_dir.path().join("real.bin");
        fs::write(&target, b"x").unwrap();
        symlink(&target, dir.path().join("link.wav")).unwrap();
        symlink(target_dir.path(), dir.path().join("dir_link.wav")).unwrap();
        symlink(dir.path().join("gone"), dir.path().join("broken.wav")).unwrap();

        let files = discover_audio_files(dir.path()).unwrap();

        assert_eq!(files, vec![dir.path().join("link.wav")]);
    }

    #[test]
    fn discovery_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(discover_audio_files(&missing).is_err());
    }

    #[test]
    fn default_jobs_is_at_least_one() {
        assert!(default_jobs() >= 1);
    }
}
