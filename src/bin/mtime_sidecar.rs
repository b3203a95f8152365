use anyhow::{Context, Result};
use clap::Parser;
use lib::config::Config;
use lib::models::{Action, ActionError};
use lib::{sidecar, timestamps};
use music_timestamp_tools as lib;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mtime-sidecar",
    version,
    about = "Read or write MP3 file timestamps using a JSON file."
)]
struct Cli {
    /// Path of the JSON sidecar file
    json_path: PathBuf,

    /// Read timestamps from the current directory and save them to JSON
    #[arg(short, long)]
    read: bool,

    /// Write timestamps from JSON back onto the files
    #[arg(short, long)]
    write: bool,

    /// Recreate files oldest-first, sleeping SECONDS between files (default 0)
    #[arg(short, long, value_name = "SECONDS", num_args = 0..=1, default_missing_value = "0")]
    sequence: Option<f64>,

    /// Optional config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let action = match Action::from_flags(cli.read, cli.write, cli.sequence) {
        Ok(a) => a,
        Err(ActionError::Missing) => {
            println!("{}", ActionError::Missing);
            return Ok(());
        }
        Err(e) => {
            println!("{}", e);
            std::process::exit(1);
        }
    };

    let cfg = Config::load(cli.config.as_deref()).context("loading config")?;
    let _guard = lib::logging::init(&cfg, "mtime-sidecar.log")?;

    let dir = std::env::current_dir().context("resolving current directory")?;

    match action {
        Action::Record => {
            let records = timestamps::collect_records(&dir, &cfg.media_extension)?;
            sidecar::save(&cli.json_path, &records)?;
            println!("Data saved to {}", cli.json_path.display());
        }
        Action::Restore => {
            let records = sidecar::load(&cli.json_path)?;
            timestamps::apply_timestamps(&dir, &records)
                .with_context(|| format!("restoring timestamps in {}", dir.display()))?;
        }
        Action::Sequence { pause } => {
            let records = sidecar::load(&cli.json_path)?;
            timestamps::recreate_files_sequentially(&dir, &records, pause, &cfg.temp_suffix)
                .with_context(|| format!("sequencing files in {}", dir.display()))?;
        }
    }

    Ok(())
}
