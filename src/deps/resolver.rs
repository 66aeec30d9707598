/*!
 * Pairing resolver.
 *
 * Computes the focal file's dependency closure in its own language, probes
 * every dependency and its counterpart on disk, and refuses to continue unless
 * every pair is complete. The check is exhaustive: all absent paths are
 * reported together.
 */

use log::{debug, info};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{Existence, FileRef, Listers, PairRecord};
use crate::errors::ResolveError;
use crate::file_utils::FileManager;
use crate::language_utils::{swap_extension, LanguagePair, LanguageSide};

/// A complete pair with both contents loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPair {
    pub record: PairRecord,
    pub source_content: String,
    pub target_content: String,
}

/// Everything the context assembler needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The focal file
    pub focal: FileRef,
    pub focal_content: String,
    /// The focal file's counterpart, present when a draft exists
    pub counterpart: FileRef,
    pub counterpart_content: Option<String>,
    /// Dependency pairs in closure order
    pub pairs: Vec<ResolvedPair>,
}

impl Resolution {
    /// Side the run translates into
    pub fn output_side(&self) -> LanguageSide {
        self.counterpart.language
    }
}

pub struct DependencyResolver {
    languages: LanguagePair,
    shared_namespace: String,
    listers: Listers,
}

impl DependencyResolver {
    pub fn new(languages: LanguagePair, shared_namespace: impl Into<String>, listers: Listers) -> Self {
        Self {
            languages,
            shared_namespace: shared_namespace.into(),
            listers,
        }
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// Whether `path` lives in the always-available shared namespace
    pub fn is_shared(&self, path: &Path) -> bool {
        if self.shared_namespace.is_empty() {
            return false;
        }
        let raw = path.to_string_lossy();
        let text = raw.strip_prefix("./").unwrap_or(raw.as_ref());
        text.starts_with(self.shared_namespace.as_str())
    }

    /// Transitive dependencies of `focal`, minus the shared namespace and the
    /// focal file itself, sorted by path
    pub async fn closure(&self, focal: &Path, side: LanguageSide) -> Vec<PathBuf> {
        let listed = self.listers.for_side(side).list(focal).await;
        let closure: BTreeSet<PathBuf> = listed
            .into_iter()
            .filter(|dep| dep.as_path() != focal)
            .filter(|dep| !self.is_shared(dep))
            .collect();
        closure.into_iter().collect()
    }

    /// Resolve the focal file into a complete set of dependency pairs
    pub async fn resolve(&self, focal: &Path) -> Result<Resolution, ResolveError> {
        let side = self.languages.require_side(focal)?;
        let counterpart_ext = &self.languages.profile(side.counterpart()).extension;

        let focal_content = FileManager::read_optional(focal)
            .await
            .ok_or_else(|| ResolveError::FocalUnreadable {
                path: focal.to_path_buf(),
                message: "file is missing or unreadable".to_string(),
            })?;

        let closure = self.closure(focal, side).await;
        debug!("Closure of {:?} has {} entries", focal, closure.len());

        let mut pairs = Vec::with_capacity(closure.len());
        let mut missing = Vec::new();

        for dep in closure {
            let counterpart = swap_extension(&dep, counterpart_ext);
            let source_content = FileManager::read_optional(&dep).await;
            let target_content = FileManager::read_optional(&counterpart).await;

            let record = PairRecord {
                source: FileRef::new(dep, side, existence_of(&source_content)),
                target: FileRef::new(counterpart, side.counterpart(), existence_of(&target_content)),
            };

            match (source_content, target_content) {
                (Some(source_content), Some(target_content)) => pairs.push(ResolvedPair {
                    record,
                    source_content,
                    target_content,
                }),
                _ => missing.extend(record.missing_paths()),
            }
        }

        if !missing.is_empty() {
            return Err(ResolveError::MissingDependencies { missing });
        }

        let counterpart_path = swap_extension(focal, counterpart_ext);
        let counterpart_content = FileManager::read_optional(&counterpart_path).await;
        let counterpart = FileRef::new(
            counterpart_path,
            side.counterpart(),
            existence_of(&counterpart_content),
        );

        info!(
            "Resolved {} dependency pair(s) for {:?}; counterpart {}",
            pairs.len(),
            focal,
            if counterpart.is_present() { "exists as draft" } else { "is missing" }
        );

        Ok(Resolution {
            focal: FileRef::new(focal, side, Existence::Present),
            focal_content,
            counterpart,
            counterpart_content,
            pairs,
        })
    }
}

fn existence_of(content: &Option<String>) -> Existence {
    if content.is_some() {
        Existence::Present
    } else {
        Existence::Missing
    }
}
