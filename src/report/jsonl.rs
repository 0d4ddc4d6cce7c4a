//! # Telemetry Recorder
//!
//! Writes every monitor event to JSON Lines files with rotation.
//!
//! - One JSON object per line, with an added `ts` field (RFC 3339, UTC)
//! - A new file after `max_records_per_file` records
//! - Only the newest `max_files_to_keep` files are retained
//!
//! Files are named `telemetry_<YYYYmmdd_HHMMSS>_<n>.jsonl`, so name order is
//! creation order.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{EventSink, MonitorEvent};
use crate::config::TelemetryConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = ".jsonl";

/// Rotating JSON Lines event log
#[derive(Debug)]
pub struct JsonlRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    file_index: u32,
}

impl JsonlRecorder {
    /// Create the recorder, making the log directory if needed
    ///
    /// No file is opened until the first event arrives.
    ///
    /// # Errors
    ///
    /// Returns error if the log directory cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Telemetry log directory: {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            file_index: 0,
        })
    }

    /// File currently being written, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn record(&mut self, event: &MonitorEvent) -> io::Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let mut value = serde_json::to_value(event)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "ts".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let (path, file) = self.create_next_file()?;
        debug!("Opened telemetry log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        // The new file is open; a failed cleanup must not drop the pending record
        if let Err(e) = self.prune() {
            warn!("Failed to prune old telemetry logs in {}: {}", self.dir.display(), e);
        }

        Ok(())
    }

    /// Create a fresh log file, never reusing a name already on disk
    ///
    /// A restart within the same second produces the same timestamp, so the
    /// index is bumped until the name is free.
    fn create_next_file(&mut self) -> io::Result<(PathBuf, File)> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        loop {
            let name = format!("{}{}_{:04}{}", FILE_PREFIX, stamp, self.file_index, FILE_EXTENSION);
            self.file_index = self.file_index.wrapping_add(1);

            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Telemetry log {} already exists, trying next index", path.display());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> io::Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_log_file(path))
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry log {}", path.display());
            fs::remove_file(&path)?;
        }

        Ok(())
    }
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
        .unwrap_or(false)
}

impl EventSink for JsonlRecorder {
    fn emit(&mut self, event: &MonitorEvent) {
        if let Err(e) = self.record(event) {
            warn!("Failed to write telemetry log ({}): {}", event.name(), e);
        }
    }
}
