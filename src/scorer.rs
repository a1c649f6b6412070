//! SNR scoring.
//!
//! The classifier only sees the [`Scorer`] trait. [`CommandScorer`] fulfils it
//! by running an external program and reading the score off its stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::ScoreError;

/// Name of the scoring script looked up next to the executable.
pub const DEFAULT_SCRIPT: &str = "calculate_SNR.sh";

/// A parsed score together with the text it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Score {
    pub value: f64,
    pub text: String,
}

pub trait Scorer: Send + Sync {
    fn score(&self, path: &Path) -> Result<Score, ScoreError>;
}

impl<F> Scorer for F
where
    F: Fn(&Path) -> Result<Score, ScoreError> + Send + Sync,
{
    fn score(&self, path: &Path) -> Result<Score, ScoreError> {
        self(path)
    }
}

/// Extract the score from scorer output. The score sits on the second line.
pub fn parse_score(output: &str) -> Result<Score, ScoreError> {
    let line = output.split('\n').nth(1).ok_or(ScoreError::MissingLine)?;
    let text = line.trim();
    let value = text
        .parse::<f64>()
        .map_err(|_| ScoreError::InvalidNumber(text.to_string()))?;

    Ok(Score {
        value,
        text: text.to_string(),
    })
}

/// Runs `<program> [args..] <audio file>` and parses its stdout.
///
/// Exit status and stderr are ignored; only the output is judged.
#[derive(Clone, Debug)]
pub struct CommandScorer {
    program: PathBuf,
    args: Vec<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandScorer {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Shell scripts (`*.sh`) go through `bash`, anything else runs directly.
    pub fn script<P: Into<PathBuf>>(script: P) -> Self {
        let script = script.into();
        let is_shell = script
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "sh")
            .unwrap_or(false);

        if is_shell {
            let mut scorer = Self::new("bash");
            scorer.args.push(script);
            scorer
        } else {
            Self::new(script)
        }
    }

    /// `bash calculate_SNR.sh` from the directory holding the running binary.
    pub fn default_script() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        Self::script(dir.join(DEFAULT_SCRIPT))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self, path: &Path) -> Result<Child, ScoreError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| ScoreError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    fn run(&self, path: &Path) -> Result<Vec<u8>, ScoreError> {
        let mut child = self.spawn(path)?;

        let Some(timeout) = self.timeout else {
            return Ok(child.wait_with_output()?.stdout);
        };

        // Drain stdout off-thread so a chatty scorer can't fill the pipe
        // while we poll for exit.
        let mut stdout = child.stdout.take().ok_or_else(|| {
            ScoreError::Io(std::io::Error::other("scorer stdout not captured"))
        })?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        match wait_timeout(&mut child, timeout) {
            Ok(Some(_)) => {}
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                // The reader is not joined. It exits once every holder of the
                // pipe is gone, which may be later than the killed child if
                // the scorer spawned processes of its own.
                return Err(ScoreError::TimedOut(timeout));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }

        reader
            .join()
            .map_err(|_| ScoreError::Io(std::io::Error::other("stdout reader panicked")))?
            .map_err(ScoreError::from)
    }
}

impl Scorer for CommandScorer {
    fn score(&self, path: &Path) -> Result<Score, ScoreError> {
        let stdout = self.run(path)?;
        let output = String::from_utf8_lossy(&stdout);
        debug!("scorer output for {}: {:?}", path.display(), output);
        parse_score(&output)
    }
}

fn wait_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(20);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_score_reads_second_line() {
        let score = parse_score("Estimating SNR\n45.25\ndone\n").unwrap();
        assert_eq!(score.value, 45.25);
        assert_eq!(score.text, "45.25");
    }

    #[test]
    fn parse_score_trims_whitespace() {
        let score = parse_score("header\r\n  12.5 \r\n").unwrap();
        assert_eq!(score.value, 12.5);
        assert_eq!(score.text, "12.5");
    }

    #[test]
    fn parse_score_accepts_negative_and_integer_values() {
        assert_eq!(parse_score("x\n-3.5\n").unwrap().value, -3.5);
        assert_eq!(parse_score("x\n40").unwrap().value, 40.0);
    }

    #[test]
    fn parse_score_rejects_single_line() {
        assert!(matches!(parse_score("45.0"), Err(ScoreError::MissingLine)));
        assert!(matches!(parse_score(""), Err(ScoreError::MissingLine)));
    }

    #[test]
    fn parse_score_rejects_non_numeric() {
        match parse_score("header\nnot a number\n") {
            Err(ScoreError::InvalidNumber(text)) => assert_eq!(text, "not a number"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            parse_score("header\n\n"),
            Err(ScoreError::InvalidNumber(_))
        ));
    }

    #[test]
    fn script_runs_shell_files_through_bash() {
        let scorer = CommandScorer::script("/opt/calculate_SNR.sh");
        assert_eq!(scorer.program, PathBuf::from("bash"));
        assert_eq!(scorer.args, vec![PathBuf::from("/opt/calculate_SNR.sh")]);

        let scorer = CommandScorer::script("/opt/snr");
        assert_eq!(scorer.program, PathBuf::from("/opt/snr"));
        assert!(scorer.args.is_empty());
    }

    #[test]
    fn default_script_points_next_to_executable() {
        let scorer = CommandScorer::default_script();
        assert_eq!(scorer.program, PathBuf::from("bash"));
        assert!(scorer.args[0].ends_with(DEFAULT_SCRIPT));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let scorer = CommandScorer::new("/definitely/not/a/scorer");
        let err = scorer.score(Path::new("a.wav")).unwrap_err();
        assert!(matches!(err, ScoreError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn command_scorer_reads_stdout() {
        let scorer = CommandScorer::new("printf").with_timeout(Some(Duration::from_secs(10)));
        // printf treats the path as its format string.
        let score = scorer.score(Path::new("snr\n41.5\n")).unwrap();
        assert_eq!(score.value, 41.5);
    }

    #[cfg(unix)]
    #[test]
    fn command_scorer_times_out() {
        let scorer = CommandScorer::new("sleep").with_timeout(Some(Duration::from_millis(100)));
        let err = scorer.score(Path::new("5")).unwrap_err();
        assert!(matches!(err, ScoreError::TimedOut(_)));
    }
}
