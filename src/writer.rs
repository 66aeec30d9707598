/*!
 * File writer.
 *
 * Persists the parsed records that belong to the output language of the run.
 * Anything else the engine echoed back is dropped. Writes overwrite existing
 * files and are not rolled back when a later write in the batch fails.
 *
 * Record paths come from the engine, so they must stay below the base
 * directory: `..` components are refused, and absolute paths are accepted
 * only when they point inside an absolute base directory.
 */

use log::{debug, error, info};
use std::path::{Component, Path, PathBuf};

use crate::errors::WriteError;
use crate::file_utils::FileManager;
use crate::language_utils::extension_of;
use crate::response_parser::ResponseRecord;

/// Outcome of writing one batch of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    /// Files written, in record order
    pub written: Vec<PathBuf>,
    /// Records discarded because of their extension
    pub skipped: Vec<PathBuf>,
    /// Individual write failures
    pub failures: Vec<WriteError>,
}

impl WriteReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Writes records below a base directory
#[derive(Debug, Clone)]
pub struct FileWriter {
    base_dir: PathBuf,
}

impl FileWriter {
    /// Relative record paths are resolved against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Location of a record path on disk, or why it may not be written
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, String> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err("path leaves the output directory".to_string());
        }
        if path.is_absolute() {
            if self.base_dir.is_absolute() && path.starts_with(&self.base_dir) {
                return Ok(path.to_path_buf());
            }
            return Err(format!("absolute path outside {:?}", self.base_dir));
        }
        Ok(self.base_dir.join(path))
    }

    /// Write every record whose extension equals `expected_extension`
    pub async fn write_records(&self, records: &[ResponseRecord], expected_extension: &str) -> WriteReport {
        let mut report = WriteReport::default();

        for record in records {
            if extension_of(&record.path).as_deref() != Some(expected_extension) {
                debug!("Discarding {:?}: not a .{} file", record.path, expected_extension);
                report.skipped.push(record.path.clone());
                continue;
            }

            let target = match self.resolve(&record.path) {
                Ok(target) => target,
                Err(message) => {
                    let failure = WriteError {
                        path: record.path.clone(),
                        message,
                    };
                    error!("{}", failure);
                    report.failures.push(failure);
                    continue;
                }
            };

            match FileManager::write_to_file(&target, &record.content).await {
                Ok(()) => {
                    info!("Saved {:?}", target);
                    report.written.push(target);
                }
                Err(e) => {
                    let failure = WriteError {
                        path: target,
                        message: format!("{:#}", e),
                    };
                    error!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        report
    }
}
