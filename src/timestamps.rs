use crate::models::{system_time_to_seconds, RestoreReport, SequenceReport, TimestampRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs::{File, FileTimes, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Normalize an extension pattern ("*.mp3", ".mp3", "mp3") to a lowercase
/// dotted suffix.
fn normalize_suffix(pattern: &str) -> String {
    let p = pattern.trim();
    let p = p.strip_prefix('*').unwrap_or(p);
    let p = p.to_lowercase();
    if p.starts_with('.') {
        p
    } else {
        format!(".{}", p)
    }
}

/// True if `name` ends with the extension pattern, ignoring case.
pub fn name_matches_extension(name: &str, pattern: &str) -> bool {
    name.to_lowercase().ends_with(&normalize_suffix(pattern))
}

fn display_time(t: SystemTime) -> String {
    let secs = system_time_to_seconds(t);
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{}s", secs))
}

/// Names of the immediate entries of `dir`.
fn list_dir_names(dir: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(raw) => debug!("ignoring non UTF-8 entry {:?}", raw),
        }
    }
    Ok(names)
}

/// Set both access and modification time of `path`.
pub fn set_file_times(path: &Path, time: SystemTime) -> Result<()> {
    // read-only files can only be opened for reading
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .or_else(|_| File::open(path))
        .with_context(|| format!("opening {}", path.display()))?;
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
        .with_context(|| format!("setting timestamps on {}", path.display()))?;
    Ok(())
}

/// Capture the modification time of every regular file directly inside
/// `dir` whose name ends with `extension` (case-insensitive). Records are
/// ordered by file name.
pub fn collect_records(dir: &Path, extension: &str) -> Result<Vec<TimestampRecord>> {
    let meta =
        std::fs::metadata(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    let mut records = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = match entry.file_name().to_str() {
            Some(n) => n.to_string(),
            None => {
                debug!("ignoring non UTF-8 entry {:?}", entry.file_name());
                continue;
            }
        };
        if !name_matches_extension(&name, extension) {
            continue;
        }
        let modified = entry
            .metadata()
            .with_context(|| format!("reading metadata of {}", entry.path().display()))?
            .modified()
            .with_context(|| format!("reading mtime of {}", entry.path().display()))?;
        debug!("{} modified at {}", name, display_time(modified));
        records.push(TimestampRecord::new(name, system_time_to_seconds(modified)));
    }

    info!("collected {} record(s) from {}", records.len(), dir.display());
    Ok(records)
}

/// Apply stored timestamps to same-named files in `dir`. Missing files are
/// reported and skipped; nothing already applied is rolled back.
pub fn apply_timestamps(dir: &Path, records: &[TimestampRecord]) -> Result<RestoreReport> {
    let present = list_dir_names(dir)?;
    let mut report = RestoreReport::default();

    for record in records {
        if !present.contains(&record.name) {
            println!("Warning: {} not found.", record.name);
            report.missing.push(record.name.clone());
            continue;
        }
        let time = record
            .modified_time()
            .with_context(|| format!("stored timestamp for {}", record.name))?;
        set_file_times(&dir.join(&record.name), time)?;
        debug!("restored {} to {}", record.name, display_time(time));
        report.applied += 1;
    }

    info!("restored {} file(s), {} missing", report.applied, report.missing.len());
    Ok(report)
}

/// Create and remove a scratch file to confirm this process may add and
/// delete entries in `dir`.
fn check_dir_writable(dir: &Path, temp_suffix: &str) -> Result<()> {
    let scratch = dir.join(format!(".mtime-sidecar-{}{}", std::process::id(), temp_suffix));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)
        .with_context(|| format!("{} is not writable", dir.display()))?;
    std::fs::remove_file(&scratch)
        .with_context(|| format!("removing write check file {}", scratch.display()))?;
    Ok(())
}

/// Checks run before any file is recreated. Fails if `dir` is read-only or
/// cannot hold one extra copy of the largest file. A leftover temporary
/// sibling of any record is also an error since it would be overwritten.
pub fn check_sequence_preconditions(
    dir: &Path,
    records: &[TimestampRecord],
    temp_suffix: &str,
) -> Result<()> {
    let meta =
        std::fs::metadata(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    // mode bits first: the scratch file alone would succeed for root
    if meta.permissions().readonly() {
        anyhow::bail!("{} is not writable", dir.display());
    }
    check_dir_writable(dir, temp_suffix)?;

    let present = list_dir_names(dir)?;
    let mut largest: u64 = 0;
    for record in records.iter().filter(|r| present.contains(&r.name)) {
        let temp_name = format!("{}{}", record.name, temp_suffix);
        if present.contains(&temp_name) {
            anyhow::bail!(
                "temporary file {} already exists; remove it before sequencing",
                dir.join(temp_name).display()
            );
        }
        let len = std::fs::metadata(dir.join(&record.name))
            .with_context(|| format!("reading metadata of {}", record.name))?
            .len();
        largest = largest.max(len);
    }

    match fs4::available_space(dir) {
        Ok(free) if free < largest => {
            anyhow::bail!(
                "not enough free space in {}: need {} bytes, {} available",
                dir.display(),
                largest,
                free
            );
        }
        Ok(_) => {}
        Err(e) => warn!("could not query free space for {}: {}", dir.display(), e),
    }
    Ok(())
}

/// Destructively recreate files oldest-first so that their on-disk creation
/// order follows the stored timestamps. Each file is copied to a temporary
/// sibling, the original removed, and the copy moved back; its timestamps
/// are then set to the moment of recreation. `pause` is slept after every
/// recreated file.
pub fn recreate_files_sequentially(
    dir: &Path,
    records: &[TimestampRecord],
    pause: Duration,
    temp_suffix: &str,
) -> Result<SequenceReport> {
    check_sequence_preconditions(dir, records, temp_suffix)?;

    let present = list_dir_names(dir)?;
    let mut ordered: Vec<&TimestampRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.modified.total_cmp(&b.modified));

    let total = ordered.len();
    let mut report = SequenceReport::default();

    for (i, record) in ordered.into_iter().enumerate() {
        if !present.contains(&record.name) {
            println!("Warning: {} not found.", record.name);
            report.missing.push(record.name.clone());
            continue;
        }

        let path = dir.join(&record.name);
        let temp_path = dir.join(format!("{}{}", record.name, temp_suffix));

        std::fs::copy(&path, &temp_path)
            .with_context(|| format!("copying {} to {}", path.display(), temp_path.display()))?;
        std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("moving {} to {}", temp_path.display(), path.display()))?;

        let now = SystemTime::now();
        set_file_times(&path, now)?;
        debug!("recreated {} (stored {}s) at {}", record.name, record.modified, display_time(now));

        println!("({}/{}) {}", i + 1, total, record.name);
        report.recreated.push(record.name.clone());

        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    info!("recreated {} file(s), {} missing", report.recreated.len(), report.missing.len());
    Ok(report)
}
