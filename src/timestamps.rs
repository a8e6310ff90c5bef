//! Per-document creation and modification instants.
//!
//! A [`TimestampSource`] supplies the instants a document's metadata falls
//! back to when its comment block does not declare them. When a source has
//! nothing for a file, the build instant is used instead.
//!
//! | Source                  | created                 | modified               |
//! |-------------------------|-------------------------|------------------------|
//! | [`BuildTime`]           | none (build instant)    | none (build instant)   |
//! | [`FilesystemTimestamps`]| file creation time      | file modification time |
//! | [`GitTimestamps`]       | first commit of file    | last commit of file    |
//! | [`FixedTimestamps`]     | fixed                   | fixed                  |

use crate::config::TimestampMode;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::path::Path;
use std::process::Command;

/// Creation and modification instants of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl FileTimes {
    /// Both fields set to the same instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            created: instant,
            modified: instant,
        }
    }
}

/// Supplies per-file timestamps. Shared across render threads.
pub trait TimestampSource: Send + Sync {
    /// Timestamps for the file at `path`, or `None` if unknown.
    fn file_times(&self, path: &Path) -> Option<FileTimes>;
}

/// Knows nothing; every document gets the build instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildTime;

impl TimestampSource for BuildTime {
    fn file_times(&self, _path: &Path) -> Option<FileTimes> {
        None
    }
}

/// Same instants for every file. Makes rebuilds byte-identical.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimestamps(pub FileTimes);

impl TimestampSource for FixedTimestamps {
    fn file_times(&self, _path: &Path) -> Option<FileTimes> {
        Some(self.0)
    }
}

/// Reads file metadata. Platforms without a creation time use the
/// modification time for both fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemTimestamps;

impl TimestampSource for FilesystemTimestamps {
    fn file_times(&self, path: &Path) -> Option<FileTimes> {
        let meta = std::fs::metadata(path).ok()?;
        let modified: DateTime<Utc> = meta.modified().ok()?.into();
        let created = meta.created().map(DateTime::<Utc>::from).unwrap_or(modified);
        Some(FileTimes { created, modified })
    }
}

/// Asks git for the first and last commit touching each file.
///
/// Files outside a repository, untracked files, or a missing `git`
/// binary all yield `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitTimestamps;

impl TimestampSource for GitTimestamps {
    fn file_times(&self, path: &Path) -> Option<FileTimes> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
        let file = path.file_name()?;
        let output = Command::new("git")
            .args(["log", "--follow", "--format=%ct", "--"])
            .arg(file)
            .current_dir(dir)
            .output()
            .ok()?;

        if !output.status.success() {
            tracing::debug!(path = %path.display(), "git log failed, no timestamps");
            return None;
        }

        parse_commit_times(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `git log --format=%ct` output (newest first) into file times.
fn parse_commit_times(log: &str) -> Option<FileTimes> {
    let stamps: Vec<DateTime<Utc>> = log
        .lines()
        .filter_map(|line| line.trim().parse::<i64>().ok())
        .filter_map(|secs| Utc.timestamp_opt(secs, 0).single())
        .collect();
    let modified = *stamps.first()?;
    let created = *stamps.last()?;
    Some(FileTimes { created, modified })
}

/// Build the source selected in config.
pub fn source_for(mode: TimestampMode) -> Box<dyn TimestampSource> {
    match mode {
        TimestampMode::None => Box::new(BuildTime),
        TimestampMode::Filesystem => Box::new(FilesystemTimestamps),
        TimestampMode::Git => Box::new(GitTimestamps),
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-03-01T12:00:00.000Z`.
pub fn iso8601(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn iso8601_format() {
        assert_eq!(iso8601(instant(0)), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso8601(instant(1_709_294_400)), "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn parse_commit_times_newest_first() {
        let times = parse_commit_times("300\n200\n100\n").unwrap();
        assert_eq!(times.modified, instant(300));
        assert_eq!(times.created, instant(100));
    }

    #[test]
    fn parse_commit_times_single_commit() {
        let times = parse_commit_times("42\n").unwrap();
        assert_eq!(times.created, times.modified);
    }

    #[test]
    fn parse_commit_times_empty_is_none() {
        assert_eq!(parse_commit_times(""), None);
        assert_eq!(parse_commit_times("not a number\n"), None);
    }

    #[test]
    fn build_time_knows_nothing() {
        assert_eq!(BuildTime.file_times(Path::new("x.md")), None);
    }

    #[test]
    fn fixed_timestamps_ignore_path() {
        let fixed = FixedTimestamps(FileTimes::at(instant(7)));
        assert_eq!(fixed.file_times(Path::new("a.md")), Some(FileTimes::at(instant(7))));
        assert_eq!(fixed.file_times(Path::new("b.md")), Some(FileTimes::at(instant(7))));
    }

    #[test]
    fn filesystem_timestamps_read_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1-intro.md");
        std::fs::write(&path, "# Intro").unwrap();

        let times = FilesystemTimestamps.file_times(&path).unwrap();
        assert!(times.modified <= Utc::now());
    }

    #[test]
    fn filesystem_timestamps_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            FilesystemTimestamps.file_times(&tmp.path().join("missing.md")),
            None
        );
    }

    #[test]
    fn git_timestamps_outside_repository() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1-intro.md");
        std::fs::write(&path, "# Intro").unwrap();
        // Not a repository (or git missing): no timestamps, no panic
        assert_eq!(GitTimestamps.file_times(&path), None);
    }
}
