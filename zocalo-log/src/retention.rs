// Log file retention

use crate::LogError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const SECONDS_PER_DAY: u64 = 86_400;

/// Deletes daily log files older than a retention window.
#[derive(Debug, Clone)]
pub struct LogRetention {
    directory: PathBuf,
    prefix: String,
    max_age_days: u64,
}

impl LogRetention {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            max_age_days: 7,
        }
    }

    pub fn max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn is_log_file(&self, name: &str) -> bool {
        name.starts_with(&format!("{}.", self.prefix)) && name.ends_with(".log")
    }

    /// Remove every `<prefix>.*.log` whose modification time falls outside
    /// the window. Returns how many files were deleted.
    pub fn clean_old_logs(&self) -> Result<usize, LogError> {
        if !self.directory.is_dir() {
            return Ok(0);
        }

        let window = Duration::from_secs(self.max_age_days * SECONDS_PER_DAY);
        let cutoff = SystemTime::now()
            .checked_sub(window)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut removed = 0;
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !self.is_log_file(name) {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            if modified < cutoff {
                match fs::remove_file(entry.path()) {
                    Ok(()) => {
                        debug!(file = name, "Removed expired log file");
                        removed += 1;
                    }
                    Err(e) => warn!(file = name, error = %e, "Could not remove log file"),
                }
            }
        }

        if removed > 0 {
            info!(removed, days = self.max_age_days, "Cleaned old log files");
        }
        Ok(removed)
    }

    /// Run the cleanup on roughly one call in a hundred.
    pub fn maybe_clean(&self) -> Result<usize, LogError> {
        if rand::random_range(1..=100u32) == 1 {
            self.clean_old_logs()
        } else {
            Ok(0)
        }
    }
}
