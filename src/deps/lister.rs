/*!
 * Dependency listing.
 *
 * Each language has its own lister. The subprocess variant shells out to an
 * external tool that prints one dependency path per line; a failing tool is
 * treated as "no dependencies" so a broken lister degrades the context instead
 * of aborting the run.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::language_utils::{LanguagePair, LanguageSide, ListerConfig};

/// Capability that returns the transitive dependencies of a file
///
/// Implementations return same-language paths. Errors are absorbed: a lister
/// that cannot answer returns an empty list.
#[async_trait]
pub trait DependencyLister: Send + Sync + Debug {
    async fn list(&self, file: &Path) -> Vec<PathBuf>;
}

/// Lister backed by an external command
#[derive(Debug, Clone)]
pub struct CommandLister {
    config: ListerConfig,
}

impl CommandLister {
    pub fn new(config: ListerConfig) -> Self {
        Self { config }
    }

    /// Split lister output into paths, one per non-blank line
    pub fn parse_output(stdout: &str) -> Vec<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}

#[async_trait]
impl DependencyLister for CommandLister {
    async fn list(&self, file: &Path) -> Vec<PathBuf> {
        let lister_future = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(file)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::select! {
            result = lister_future => match result {
                Ok(output) => output,
                Err(e) => {
                    warn!("Failed to run {}: {}; assuming no dependencies", self.config.command, e);
                    return Vec::new();
                }
            },
            _ = tokio::time::sleep(timeout_duration) => {
                warn!("{} timed out after {}s; assuming no dependencies",
                    self.config.command, self.config.timeout_secs);
                return Vec::new();
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed for {:?}: {}; assuming no dependencies",
                self.config.command, file, stderr.trim());
            return Vec::new();
        }

        let deps = Self::parse_output(&String::from_utf8_lossy(&output.stdout));
        debug!("{} listed {} dependencies for {:?}", self.config.command, deps.len(), file);
        deps
    }
}

/// In-process lister answering from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticLister {
    table: HashMap<PathBuf, Vec<PathBuf>>,
}

impl StaticLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dependencies of `file`
    pub fn with(mut self, file: impl Into<PathBuf>, deps: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.table.insert(file.into(), deps.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl DependencyLister for StaticLister {
    async fn list(&self, file: &Path) -> Vec<PathBuf> {
        self.table.get(file).cloned().unwrap_or_default()
    }
}

/// One lister per language
#[derive(Debug)]
pub struct Listers {
    source: Box<dyn DependencyLister>,
    target: Box<dyn DependencyLister>,
}

impl Listers {
    pub fn new(source: Box<dyn DependencyLister>, target: Box<dyn DependencyLister>) -> Self {
        Self { source, target }
    }

    /// Subprocess listers as configured for each language
    pub fn from_languages(languages: &LanguagePair) -> Self {
        Self::new(
            Box::new(CommandLister::new(languages.source.lister.clone())),
            Box::new(CommandLister::new(languages.target.lister.clone())),
        )
    }

    pub fn for_side(&self, side: LanguageSide) -> &dyn DependencyLister {
        match side {
            LanguageSide::Source => self.source.as_ref(),
            LanguageSide::Target => self.target.as_ref(),
        }
    }
}
