use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ResolveError;

/// Language utilities for the two paired program representations
///
/// A run always involves exactly two languages: the verbose source form and
/// the compact target form. A file's extension decides which side it is on,
/// and its counterpart lives at the same path with the other side's extension.
/// Which side of the pair a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSide {
    /// The verbose source form (Lang1)
    Source,
    /// The compact target form (Lang2)
    Target,
}

impl LanguageSide {
    /// The other side of the pair
    pub fn counterpart(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

impl std::fmt::Display for LanguageSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// External command that prints the recursive dependencies of a file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListerConfig {
    /// Executable name or path
    pub command: String,

    /// Extra arguments placed before the file path
    #[serde(default)]
    pub args: Vec<String>,

    /// Timeout for a single listing run
    #[serde(default = "default_lister_timeout_secs")]
    pub timeout_secs: u64,
}

/// Everything the pipeline needs to know about one language
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguageProfile {
    /// Human readable name used in prompts
    pub name: String,

    /// File extension without the leading dot
    pub extension: String,

    /// Tag used on fenced code blocks for this language
    pub fence_tag: String,

    /// Dependency lister for files of this language
    pub lister: ListerConfig,
}

impl LanguageProfile {
    /// Whether `path` carries this language's extension
    pub fn matches(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| ext == self.extension)
    }
}

/// The configured source/target language pair
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguagePair {
    pub source: LanguageProfile,
    pub target: LanguageProfile,
}

impl LanguagePair {
    pub fn profile(&self, side: LanguageSide) -> &LanguageProfile {
        match side {
            LanguageSide::Source => &self.source,
            LanguageSide::Target => &self.target,
        }
    }

    /// Side selected by a path's extension, if any
    pub fn side_of(&self, path: &Path) -> Option<LanguageSide> {
        if self.source.matches(path) {
            Some(LanguageSide::Source)
        } else if self.target.matches(path) {
            Some(LanguageSide::Target)
        } else {
            None
        }
    }

    /// Side selected by a fence tag, if any
    pub fn side_of_fence_tag(&self, tag: &str) -> Option<LanguageSide> {
        if tag == self.source.fence_tag {
            Some(LanguageSide::Source)
        } else if tag == self.target.fence_tag {
            Some(LanguageSide::Target)
        } else {
            None
        }
    }

    /// Side of a path, failing for unrecognized extensions
    pub fn require_side(&self, path: &Path) -> Result<LanguageSide, ResolveError> {
        self.side_of(path)
            .ok_or_else(|| ResolveError::UnsupportedExtension(path.to_path_buf()))
    }

    /// Path of the same module in the other language
    pub fn counterpart_path(&self, path: &Path) -> Result<PathBuf, ResolveError> {
        let side = self.require_side(path)?;
        Ok(swap_extension(path, &self.profile(side.counterpart()).extension))
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            source: LanguageProfile {
                name: "Agda".to_string(),
                extension: "agda".to_string(),
                fence_tag: "agda".to_string(),
                lister: ListerConfig {
                    command: "agda-deps".to_string(),
                    args: vec!["--recursive".to_string()],
                    timeout_secs: default_lister_timeout_secs(),
                },
            },
            target: LanguageProfile {
                name: "Kind".to_string(),
                extension: "kind".to_string(),
                fence_tag: "kind".to_string(),
                lister: ListerConfig {
                    command: "kind-deps".to_string(),
                    args: vec!["--recursive".to_string()],
                    timeout_secs: default_lister_timeout_secs(),
                },
            },
        }
    }
}

/// Extension of a path without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_string())
}

/// Replace the extension of `path`, keeping directory and stem
pub fn swap_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

fn default_lister_timeout_secs() -> u64 {
    60
}
