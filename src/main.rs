mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use snr_sorter::{run_batch, Config};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_dir = matches
        .get_one::<PathBuf>("input_dir")
        .expect("required argument");
    let output_dir = matches
        .get_one::<PathBuf>("output_dir")
        .expect("required argument");
    if !input_dir.is_dir() {
        return Err(anyhow!(
            "input directory does not exist: {}",
            input_dir.display()
        ));
    }

    let mut builder = Config::builder(input_dir, output_dir);
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        builder = builder.jobs(*jobs);
    }
    if let Some(script) = matches.get_one::<PathBuf>("scorer") {
        builder = builder.scorer(script);
    }
    if let Some(timeout) = matches.get_one::<Duration>("timeout") {
        builder = builder.scorer_timeout(*timeout);
    }
    let config = builder.build();

    println!("Input:  {}", config.input_dir.display());
    println!("Output: {}", config.output_dir.display());
    println!("Processing with {} threads...", config.jobs);

    let scorer = config.command_scorer();
    let summary = run_batch(&config, &scorer)
        .with_context(|| format!("failed to classify '{}'", config.input_dir.display()))?;

    println!("Found {} audio files", summary.total());
    for (path, err) in &summary.failed {
        eprintln!("Failed: {} - {}", path.display(), err);
    }

    println!(
        "Processing complete! {} files: {} clean, {} dirty, {} failed",
        summary.total(),
        summary.clean.len(),
        summary.dirty.len(),
        summary.failed.len()
    );

    Ok(())
}
