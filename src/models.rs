use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One sidecar entry: a file name and its modification time in seconds
/// since the Unix epoch. Serialized as `[name, seconds]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct TimestampRecord {
    pub name: String,
    pub modified: f64,
}

impl TimestampRecord {
    pub fn new(name: impl Into<String>, modified: f64) -> Self {
        Self { name: name.into(), modified }
    }

    /// The stored time, or an error if it cannot be represented.
    pub fn modified_time(&self) -> anyhow::Result<SystemTime> {
        seconds_to_system_time(self.modified)
    }
}

impl From<(String, f64)> for TimestampRecord {
    fn from((name, modified): (String, f64)) -> Self {
        Self { name, modified }
    }
}

impl From<TimestampRecord> for (String, f64) {
    fn from(r: TimestampRecord) -> Self {
        (r.name, r.modified)
    }
}

/// The single action requested of the timestamp tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Record,
    Restore,
    Sequence { pause: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionError {
    Conflicting,
    Missing,
    InvalidPause(f64),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::Conflicting => write!(
                f,
                "Error: Only one action can be specified at a time. \
                 Please choose -r, -w, or -s."
            ),
            ActionError::Missing => write!(
                f,
                "Error: No action specified. Use -r to read timestamps, \
                 -w to write them, or -s to sequence files."
            ),
            ActionError::InvalidPause(secs) => {
                write!(f, "Error: Invalid sleep time {} for -s.", secs)
            }
        }
    }
}

impl std::error::Error for ActionError {}

impl Action {
    /// Resolve the `-r` / `-w` / `-s [SECONDS]` switches into one action.
    /// A zero or negative pause means no pause; NaN or a value too large
    /// for a `Duration` is rejected.
    pub fn from_flags(
        read: bool,
        write: bool,
        sequence: Option<f64>,
    ) -> Result<Action, ActionError> {
        let requested = [read, write, sequence.is_some()].iter().filter(|b| **b).count();
        if requested > 1 {
            return Err(ActionError::Conflicting);
        }
        if read {
            Ok(Action::Record)
        } else if write {
            Ok(Action::Restore)
        } else if let Some(secs) = sequence {
            let pause = if secs <= 0.0 {
                Duration::ZERO
            } else {
                Duration::try_from_secs_f64(secs).map_err(|_| ActionError::InvalidPause(secs))?
            };
            Ok(Action::Sequence { pause })
        } else {
            Err(ActionError::Missing)
        }
    }
}

/// Outcome of applying stored timestamps to a directory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RestoreReport {
    pub applied: usize,
    pub missing: Vec<String>,
}

/// Outcome of recreating files in timestamp order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SequenceReport {
    pub recreated: Vec<String>,
    pub missing: Vec<String>,
}

pub fn system_time_to_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

pub fn seconds_to_system_time(secs: f64) -> anyhow::Result<SystemTime> {
    let out_of_range = || anyhow::anyhow!("timestamp {} is out of range", secs);
    let offset = Duration::try_from_secs_f64(secs.abs()).map_err(|_| out_of_range())?;
    let time = if secs >= 0.0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    };
    time.ok_or_else(out_of_range)
}
