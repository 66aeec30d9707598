use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub async fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file that may legitimately be absent
    ///
    /// Returns `None` when the file does not exist or cannot be read as text.
    pub async fn read_optional<P: AsRef<Path>>(path: P) -> Option<String> {
        let path = path.as_ref();
        match fs::read_to_string(path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Treating {:?} as missing: {}", path, e);
                None
            }
        }
    }

    /// Write a string to a file, replacing any previous content
    pub async fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent).await?;
        }

        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    // @generates: Timestamped transcript path for one run
    pub fn transcript_path<P: AsRef<Path>>(log_dir: P, focal_file: &Path) -> PathBuf {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let stem = focal_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "prompt".to_string());
        log_dir.as_ref().join(format!("{}_{}.txt", timestamp, stem))
    }

    /// Persist the final prompt of a run for later audit
    pub async fn write_transcript<P: AsRef<Path>>(
        log_dir: P,
        focal_file: &Path,
        system: &str,
        prompt: &str,
    ) -> Result<PathBuf> {
        let path = Self::transcript_path(log_dir, focal_file);
        let content = format!("SYSTEM:\n{}\n\nUSER:\n{}\n", system, prompt);
        Self::write_to_file(&path, &content).await?;
        Ok(path)
    }
}
