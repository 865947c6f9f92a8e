//! Profile session uploading
//!
//! Profile traces never travel through the event files; the event stream
//! only announces that a session happened. The payload lives under
//! `<run>/plugins/profile/<YYYY_MM_DD_HH_MM_SS>/`. Each poll scans those
//! directories and hands files not seen in an earlier poll to the file
//! sender, giving at-most-once uploading per file.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use tokio::fs;
use tracing::warn;

use metadata::OnePlatformResourceManager;
use uploader_core::{Plugin, Result, WallTime};

use super::file::FileSender;
use crate::tracker::UploadTracker;

const PROFILE_DIR_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// True for directory names shaped like `2021_01_01_01_10_10`
fn is_profile_dir_name(name: &str) -> bool {
    let name = name.strip_suffix('/').unwrap_or(name);
    let bytes = name.as_bytes();
    if bytes.len() != 19 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 | 10 | 13 | 16 => *b == b'_',
        _ => b.is_ascii_digit(),
    })
}

/// Wall time encoded in the directory name, UTC
fn parse_wall_time(name: &str) -> Option<WallTime> {
    NaiveDateTime::parse_from_str(name, PROFILE_DIR_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp() as WallTime)
}

/// Scans per-run profile directories and drives the file sender
#[derive(Default)]
pub struct ProfileSender {
    /// run display name -> profile dir name -> files already handed off
    observed: HashMap<String, HashMap<String, BTreeSet<PathBuf>>>,
}

impl ProfileSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one run's profile directory and upload files new to this poll
    pub async fn poll_run(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        files: &mut FileSender,
        run_display_name: &str,
        run_dir: &Path,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        let profile_root = run_dir.join("plugins").join("profile");
        let mut entries = match fs::read_dir(&profile_root).await {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            if !is_profile_dir_name(&dir_name) {
                continue;
            }

            let mut current = BTreeSet::new();
            let mut dir_entries = fs::read_dir(entry.path()).await?;
            while let Some(file) = dir_entries.next_entry().await? {
                if file.file_type().await?.is_file() {
                    current.insert(file.path());
                }
            }

            let observed = self
                .observed
                .entry(run_display_name.to_string())
                .or_default()
                .entry(dir_name.clone())
                .or_default();
            let new_files: Vec<PathBuf> = current.difference(observed).cloned().collect();
            observed.extend(new_files.iter().cloned());
            if new_files.is_empty() {
                continue;
            }

            let wall_time = match parse_wall_time(&dir_name) {
                Some(wall_time) => wall_time,
                None => {
                    warn!(
                        dir = %dir_name,
                        "Profile directory name is not a valid timestamp; using current time"
                    );
                    Utc::now().timestamp() as WallTime
                }
            };

            files
                .add_files(
                    resources,
                    run_display_name,
                    &new_files,
                    &dir_name,
                    Plugin::Profile,
                    wall_time,
                    tracker,
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dir_name_pattern() {
        assert!(is_profile_dir_name("2021_01_01_01_10_10"));
        assert!(is_profile_dir_name("2021_01_01_01_10_10/"));
        assert!(!is_profile_dir_name("2021-01-01-01-10-10"));
        assert!(!is_profile_dir_name("2021_01_01_01_10"));
        assert!(!is_profile_dir_name("notadate"));
        assert!(!is_profile_dir_name("2021_01_01_01_10_1x"));
    }

    #[test]
    fn test_wall_time_parses_as_utc() {
        // 2021-01-01 01:10:10 UTC
        assert_eq!(parse_wall_time("2021_01_01_01_10_10"), Some(1_609_463_410.0));
        // Matches the shape but is not a real date
        assert_eq!(parse_wall_time("2021_13_01_01_10_10"), None);
    }
}
