use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to replace, and in which files.
#[derive(Debug, Clone)]
pub struct Rules {
    pub playlist_extension: String,
    pub from: String,
    pub to: String,
}

impl From<&crate::config::Config> for Rules {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            playlist_extension: cfg.playlist_extension.clone(),
            from: cfg.source_prefix.clone(),
            to: cfg.replacement.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericizeOutcome {
    Replaced { occurrences: usize },
    Skipped,
    NotFound,
    Failed(String),
}

/// Replace every literal occurrence of `from` with `to` in the file at
/// `path`, rewriting it in place. Returns the number of occurrences.
pub fn replace_in_file(path: &Path, from: &str, to: &str) -> std::io::Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let occurrences = if from.is_empty() { 0 } else { content.matches(from).count() };
    let updated = if occurrences == 0 { content } else { content.replace(from, to) };
    std::fs::write(path, updated)?;
    Ok(occurrences)
}

/// Process one path: skip it unless it has the playlist extension, then
/// rewrite it. Per-file problems are reported and returned, never raised.
pub fn genericize_file(path: &Path, rules: &Rules) -> GenericizeOutcome {
    let matches = path
        .to_str()
        .map(|s| s.ends_with(&rules.playlist_extension))
        .unwrap_or(false);
    if !matches {
        println!("Skipping file {}", path.display());
        return GenericizeOutcome::Skipped;
    }

    match replace_in_file(path, &rules.from, &rules.to) {
        Ok(occurrences) => {
            println!("Replacement successful in {}", path.display());
            debug!("{}: replaced {} occurrence(s)", path.display(), occurrences);
            GenericizeOutcome::Replaced { occurrences }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            println!("File not found: {}", path.display());
            GenericizeOutcome::NotFound
        }
        Err(e) => {
            println!("An error occurred: {}", e);
            GenericizeOutcome::Failed(e.to_string())
        }
    }
}

/// Genericize every path in order; one bad file does not stop the batch.
pub fn genericize_files(paths: &[PathBuf], rules: &Rules) -> Vec<GenericizeOutcome> {
    let outcomes: Vec<GenericizeOutcome> =
        paths.iter().map(|p| genericize_file(p, rules)).collect();
    let replaced = outcomes
        .iter()
        .filter(|o| matches!(o, GenericizeOutcome::Replaced { .. }))
        .count();
    info!("genericized {} of {} file(s)", replaced, paths.len());
    outcomes
}
