/*!
 * Dependency closure and pairing.
 *
 * - `lister`: the `DependencyLister` capability and its subprocess variant
 * - `resolver`: closure computation and counterpart validation
 */

use std::path::{Path, PathBuf};

use crate::language_utils::LanguageSide;

pub mod lister;
pub mod resolver;

pub use lister::{CommandLister, DependencyLister, Listers, StaticLister};
pub use resolver::{DependencyResolver, Resolution, ResolvedPair};

/// Whether a file was found on disk when it was probed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Present,
    Missing,
}

/// A file in one of the two languages, probed during the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub language: LanguageSide,
    pub existence: Existence,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>, language: LanguageSide, existence: Existence) -> Self {
        Self {
            path: path.into(),
            language,
            existence,
        }
    }

    pub fn is_present(&self) -> bool {
        self.existence == Existence::Present
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One logical module seen in both languages
///
/// `source` is the file on the focal file's side, `target` its counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub source: FileRef,
    pub target: FileRef,
}

impl PairRecord {
    /// Both halves exist
    pub fn is_complete(&self) -> bool {
        self.source.is_present() && self.target.is_present()
    }

    /// Paths of the halves that are absent, source first
    pub fn missing_paths(&self) -> Vec<PathBuf> {
        [&self.source, &self.target]
            .into_iter()
            .filter(|r| !r.is_present())
            .map(|r| r.path.clone())
            .collect()
    }
}
