use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tempfile::tempdir;

use music_timestamp_tools::models::{
    seconds_to_system_time, system_time_to_seconds, TimestampRecord,
};
use music_timestamp_tools::{sidecar, timestamps};

fn mtime(path: &Path) -> f64 {
    system_time_to_seconds(fs::metadata(path).unwrap().modified().unwrap())
}

fn touch_at(path: &Path, secs: f64) {
    fs::write(path, b"data").unwrap();
    timestamps::set_file_times(path, seconds_to_system_time(secs).unwrap()).unwrap();
}

#[test]
fn collect_records_filters_by_extension() {
    let td = tempdir().unwrap();
    let root = td.path();
    touch_at(&root.join("b.mp3"), 2000.0);
    touch_at(&root.join("A.MP3"), 1000.0);
    touch_at(&root.join("cover.jpg"), 3000.0);
    touch_at(&root.join("list.m3u"), 3000.0);
    fs::create_dir(root.join("folder.mp3")).unwrap();

    let records = timestamps::collect_records(root, ".mp3").unwrap();
    assert_eq!(
        records,
        vec![TimestampRecord::new("A.MP3", 1000.0), TimestampRecord::new("b.mp3", 2000.0)]
    );
}

#[test]
fn record_then_restore_round_trips() {
    let td = tempdir().unwrap();
    let root = td.path();
    touch_at(&root.join("one.mp3"), 1_600_000_000.5);
    touch_at(&root.join("two.mp3"), 1_500_000_000.25);

    let records = timestamps::collect_records(root, ".mp3").unwrap();
    let json_path = td.path().join("times.json");
    sidecar::save(&json_path, &records).unwrap();

    // disturb the timestamps
    touch_at(&root.join("one.mp3"), 42.0);
    touch_at(&root.join("two.mp3"), 43.0);

    let loaded = sidecar::load(&json_path).unwrap();
    let report = timestamps::apply_timestamps(root, &loaded).unwrap();
    assert_eq!(report.applied, 2);
    assert!(report.missing.is_empty());

    assert!((mtime(&root.join("one.mp3")) - 1_600_000_000.5).abs() < 1e-3);
    assert!((mtime(&root.join("two.mp3")) - 1_500_000_000.25).abs() < 1e-3);
}

#[test]
fn restore_example_sidecar_sets_each_file() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("a.mp3"), b"").unwrap();
    fs::write(root.join("b.mp3"), b"").unwrap();
    let json_path = root.join("times.json");
    fs::write(&json_path, r#"[["a.mp3", 1000.0], ["b.mp3", 2000.0]]"#).unwrap();

    let records = sidecar::load(&json_path).unwrap();
    timestamps::apply_timestamps(root, &records).unwrap();

    assert_eq!(mtime(&root.join("a.mp3")), 1000.0);
    assert_eq!(mtime(&root.join("b.mp3")), 2000.0);
    let atime = fs::metadata(root.join("a.mp3")).unwrap().accessed().unwrap();
    assert_eq!(system_time_to_seconds(atime), 1000.0);
}

#[test]
fn restore_twice_is_idempotent() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("a.mp3"), b"x").unwrap();
    let records = vec![TimestampRecord::new("a.mp3", 123_456.0)];

    timestamps::apply_timestamps(root, &records).unwrap();
    let first = mtime(&root.join("a.mp3"));
    timestamps::apply_timestamps(root, &records).unwrap();
    assert_eq!(first, mtime(&root.join("a.mp3")));
    assert_eq!(first, 123_456.0);
}

#[test]
fn restore_skips_missing_files_and_continues() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("here.mp3"), b"x").unwrap();
    let records = vec![
        TimestampRecord::new("gone.mp3", 10.0),
        TimestampRecord::new("here.mp3", 20.0),
    ];

    let report = timestamps::apply_timestamps(root, &records).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.missing, vec!["gone.mp3".to_string()]);
    assert_eq!(mtime(&root.join("here.mp3")), 20.0);
}

#[test]
fn load_missing_or_malformed_sidecar_fails() {
    let td = tempdir().unwrap();
    assert!(sidecar::load(&td.path().join("nope.json")).is_err());

    let bad = td.path().join("bad.json");
    fs::write(&bad, "[[\"a.mp3\"").unwrap();
    let err = sidecar::load(&bad).unwrap_err();
    assert!(format!("{:#}", err).contains("parsing sidecar"));
}

#[test]
fn sequence_recreates_oldest_first() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("a.mp3"), b"aaa").unwrap();
    fs::write(root.join("b.mp3"), b"bbbb").unwrap();
    fs::write(root.join("c.mp3"), b"cc").unwrap();
    let records = vec![
        TimestampRecord::new("a.mp3", 3000.0),
        TimestampRecord::new("gone.mp3", 1500.0),
        TimestampRecord::new("b.mp3", 1000.0),
        TimestampRecord::new("c.mp3", 2000.0),
    ];

    let pause = Duration::from_millis(50);
    let before = system_time_to_seconds(SystemTime::now());
    let started = Instant::now();
    let report = timestamps::recreate_files_sequentially(root, &records, pause, ".temp").unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.recreated, vec!["b.mp3", "c.mp3", "a.mp3"]);
    assert_eq!(report.missing, vec!["gone.mp3"]);
    // one pause per recreated file
    assert!(elapsed >= pause * 3, "only slept {:?}", elapsed);

    let b = mtime(&root.join("b.mp3"));
    let c = mtime(&root.join("c.mp3"));
    let a = mtime(&root.join("a.mp3"));
    assert!(b <= c && c <= a, "expected b <= c <= a, got {} {} {}", b, c, a);
    // stamped with the recreation time, not the stored one
    assert!(b >= before, "{} recreated before the run started at {}", b, before);

    assert_eq!(fs::read(root.join("a.mp3")).unwrap(), b"aaa");
    assert_eq!(fs::read(root.join("b.mp3")).unwrap(), b"bbbb");
    assert_eq!(fs::read(root.join("c.mp3")).unwrap(), b"cc");

    // nothing left behind: no temporaries, no write check file
    let mut names: Vec<String> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.mp3", "b.mp3", "c.mp3"]);
}

#[test]
fn sequence_does_not_pause_for_missing_files() {
    let td = tempdir().unwrap();
    let root = td.path();
    let records = vec![
        TimestampRecord::new("gone.mp3", 1.0),
        TimestampRecord::new("also_gone.mp3", 2.0),
    ];

    let started = Instant::now();
    let report =
        timestamps::recreate_files_sequentially(root, &records, Duration::from_secs(2), ".temp")
            .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1), "slept for missing files");
    assert!(report.recreated.is_empty());
    assert_eq!(report.missing, vec!["gone.mp3", "also_gone.mp3"]);
}

#[cfg(unix)]
#[test]
fn sequence_refuses_read_only_directory() {
    use std::os::unix::fs::PermissionsExt;

    let td = tempdir().unwrap();
    let root = td.path();
    touch_at(&root.join("a.mp3"), 700.0);
    touch_at(&root.join("b.mp3"), 800.0);
    let records = vec![
        TimestampRecord::new("a.mp3", 700.0),
        TimestampRecord::new("b.mp3", 800.0),
    ];

    fs::set_permissions(root, fs::Permissions::from_mode(0o555)).unwrap();
    let res = timestamps::recreate_files_sequentially(root, &records, Duration::ZERO, ".temp");
    fs::set_permissions(root, fs::Permissions::from_mode(0o755)).unwrap();

    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("not writable"));
    assert_eq!(mtime(&root.join("a.mp3")), 700.0);
    assert_eq!(mtime(&root.join("b.mp3")), 800.0);
}

#[test]
fn sequence_refuses_to_clobber_leftover_temp_file() {
    let td = tempdir().unwrap();
    let root = td.path();
    touch_at(&root.join("a.mp3"), 500.0);
    fs::write(root.join("a.mp3.temp"), b"old").unwrap();
    let records = vec![TimestampRecord::new("a.mp3", 500.0)];

    let res = timestamps::recreate_files_sequentially(root, &records, Duration::ZERO, ".temp");
    assert!(res.is_err());
    assert!(!root.join(format!(".mtime-sidecar-{}.temp", std::process::id())).exists());
    assert_eq!(mtime(&root.join("a.mp3")), 500.0);
    assert_eq!(fs::read(root.join("a.mp3.temp")).unwrap(), b"old");
}

#[test]
fn restore_out_of_range_timestamp_is_an_error() {
    let td = tempdir().unwrap();
    let root = td.path();
    touch_at(&root.join("a.mp3"), 100.0);
    let json_path = root.join("times.json");
    fs::write(&json_path, r#"[["a.mp3", 1e20]]"#).unwrap();

    let records = sidecar::load(&json_path).unwrap();
    let err = timestamps::apply_timestamps(root, &records).unwrap_err();
    assert!(format!("{:#}", err).contains("out of range"));
    assert_eq!(mtime(&root.join("a.mp3")), 100.0);
}

#[test]
fn sequence_with_out_of_range_timestamps_still_orders() {
    let td = tempdir().unwrap();
    let root = td.path();
    fs::write(root.join("far.mp3"), b"f").unwrap();
    fs::write(root.join("near.mp3"), b"n").unwrap();
    let records = vec![
        TimestampRecord::new("far.mp3", 1e20),
        TimestampRecord::new("near.mp3", 5.0),
    ];

    let report =
        timestamps::recreate_files_sequentially(root, &records, Duration::ZERO, ".temp").unwrap();
    assert_eq!(report.recreated, vec!["near.mp3", "far.mp3"]);
}
