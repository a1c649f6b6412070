use std::path::PathBuf;
use std::time::Duration;

use clap::{builder::ValueParser, value_parser, Arg, Command};

/// Parse a scorer timeout given in (possibly fractional) seconds.
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid timeout '{value}'"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("timeout must be a positive number of seconds".into());
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| "timeout is too large".to_owned())
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about("Process audio files and calculate SNR.")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("input_dir")
                .short('i')
                .long("input_dir")
                .value_name("INPUT_DIR")
                .help("the path to the input directory")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output_dir")
                .value_name("OUTPUT_DIR")
                .help("the path to the output directory")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Number of worker threads (default: available cores - 1)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("scorer")
                .long("scorer")
                .value_name("SCRIPT")
                .help("SNR script to run per file (default: calculate_SNR.sh next to the binary)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Kill the scorer if it runs longer than this")
                .value_parser(ValueParser::new(parse_timeout)),
        )
}
