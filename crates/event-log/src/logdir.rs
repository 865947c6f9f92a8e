//! Log-directory polling
//!
//! Walks the logdir, treats every directory holding event files as a run,
//! and drains newly-appended records from each run's files in
//! lexicographic order (which the `events.out.tfevents.<seconds>.<host>`
//! naming convention makes chronological).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uploader_core::types::ROOT_RUN_NAME;
use uploader_core::Result;

use crate::compat::{migrate_event, EventRecord, TagMetadata};
use crate::event_file::EventFileLoader;

/// File-name marker of the training-framework event writer
const EVENT_FILE_MARKER: &str = "tfevents";

/// Per-run loader state
#[derive(Debug)]
struct RunState {
    dir: PathBuf,
    /// Sorted by file name; iteration order is processing order
    loaders: BTreeMap<String, EventFileLoader>,
    /// Files that a later file's progress has closed for good
    closed: BTreeSet<String>,
    tag_metadata: HashMap<String, TagMetadata>,
}

/// Polls a log directory and yields per-run record batches
#[derive(Debug)]
pub struct LogdirLoader {
    root: PathBuf,
    runs: HashMap<String, RunState>,
}

impl LogdirLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            runs: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing a discovered run
    pub fn run_directory(&self, run_name: &str) -> Option<&Path> {
        self.runs.get(run_name).map(|state| state.dir.as_path())
    }

    /// Walk the logdir and register any new runs, without reading records.
    /// Returns all currently-known run names.
    pub async fn discover_runs(&mut self) -> Result<Vec<String>> {
        for (run_name, dir, files) in self.scan().await? {
            let state = self.runs.entry(run_name.clone()).or_insert_with(|| {
                debug!(run = %run_name, dir = %dir.display(), "Discovered run");
                RunState {
                    dir: dir.clone(),
                    loaders: BTreeMap::new(),
                    closed: BTreeSet::new(),
                    tag_metadata: HashMap::new(),
                }
            });
            for file_name in files {
                let path = dir.join(&file_name);
                state
                    .loaders
                    .entry(file_name)
                    .or_insert_with(|| EventFileLoader::new(path));
            }
        }
        Ok(self.runs.keys().cloned().collect())
    }

    /// Drain newly-produced records from every run
    ///
    /// Every known run appears in the result, possibly with an empty
    /// batch. Individual file errors are logged and retried next poll;
    /// a directory-listing failure aborts the whole poll.
    pub async fn get_run_events(&mut self) -> Result<BTreeMap<String, Vec<EventRecord>>> {
        self.discover_runs().await?;

        let mut result = BTreeMap::new();
        for (run_name, state) in &mut self.runs {
            let mut records = Vec::new();
            let mut last_active: Option<String> = None;

            for (file_name, loader) in &mut state.loaders {
                if state.closed.contains(file_name) {
                    continue;
                }
                let events = match loader.poll().await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!(
                            run = %run_name,
                            file = %file_name,
                            error = %e,
                            "Failed to read event file; will retry next poll"
                        );
                        continue;
                    }
                };
                if loader.offset() > 0 {
                    last_active = Some(file_name.clone());
                }
                for event in &events {
                    records.extend(migrate_event(event, &mut state.tag_metadata));
                }
            }

            // Once a later file has made progress, earlier files are done;
            // appends to them are ignored from now on.
            if let Some(active) = last_active {
                for file_name in state.loaders.keys() {
                    if *file_name < active {
                        state.closed.insert(file_name.clone());
                    }
                }
            }

            result.insert(run_name.clone(), records);
        }
        Ok(result)
    }

    /// Recursively list run directories and their event files
    async fn scan(&self) -> Result<Vec<(String, PathBuf, Vec<String>)>> {
        let mut found = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            let mut event_files = Vec::new();

            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let name = entry.file_name().to_string_lossy().to_string();
                if file_type.is_dir() {
                    stack.push(entry.path());
                } else if file_type.is_file() && name.contains(EVENT_FILE_MARKER) {
                    event_files.push(name);
                }
            }

            if !event_files.is_empty() {
                found.push((self.run_name_for(&dir), dir, event_files));
            }
        }
        Ok(found)
    }

    fn run_name_for(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ROOT_RUN_NAME.to_string(),
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => ROOT_RUN_NAME.to_string(),
        }
    }
}
