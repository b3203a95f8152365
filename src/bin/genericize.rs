use anyhow::{Context, Result};
use clap::Parser;
use lib::config::Config;
use lib::genericize::{genericize_files, Rules};
use music_timestamp_tools as lib;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "genericize",
    version,
    about = "Replace the absolute music folder path in .m3u playlists with a relative one."
)]
struct Cli {
    /// Playlist files to rewrite in place
    paths: Vec<PathBuf>,

    /// Optional config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.paths.is_empty() {
        println!("Usage: genericize <file_path1> [<file_path2> ...]");
        return Ok(());
    }

    let cfg = Config::load(cli.config.as_deref()).context("loading config")?;
    let _guard = lib::logging::init(&cfg, "genericize.log")?;

    genericize_files(&cli.paths, &Rules::from(&cfg));
    Ok(())
}
