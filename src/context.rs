/*!
 * Context assembly.
 *
 * Turns a `Resolution` into the ordered document sent to the engine:
 * dependency pairs in closure order, then the focal file, then exactly one
 * trailing block for the focal counterpart (a draft to review or a missing
 * placeholder). Rendering is a pure function of its inputs so identical
 * closures produce byte-identical prompts, which keeps the provider's prompt
 * cache warm across runs.
 */

use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::deps::Resolution;
use crate::language_utils::{LanguagePair, LanguageSide};

/// Role of a block inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A file of an already translated dependency pair
    Dependency,
    /// The file being translated
    Focal,
    /// Existing counterpart of the focal file, to be reviewed
    Draft,
    /// Counterpart of the focal file that does not exist yet
    Missing,
}

/// One labeled `(path, language, content)` entry
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub path: PathBuf,
    pub language: LanguageSide,
    pub kind: BlockKind,
    pub content: String,
}

/// Ordered prompt context for one engine call
#[derive(Debug, Clone, PartialEq)]
pub struct ContextDocument {
    blocks: Vec<ContextBlock>,
}

impl ContextDocument {
    /// Build the document from a resolved closure
    pub fn assemble(resolution: &Resolution) -> Self {
        let mut blocks = Vec::with_capacity(resolution.pairs.len() * 2 + 2);

        for pair in &resolution.pairs {
            blocks.push(ContextBlock {
                path: pair.record.source.path.clone(),
                language: pair.record.source.language,
                kind: BlockKind::Dependency,
                content: pair.source_content.clone(),
            });
            blocks.push(ContextBlock {
                path: pair.record.target.path.clone(),
                language: pair.record.target.language,
                kind: BlockKind::Dependency,
                content: pair.target_content.clone(),
            });
        }

        blocks.push(ContextBlock {
            path: resolution.focal.path.clone(),
            language: resolution.focal.language,
            kind: BlockKind::Focal,
            content: resolution.focal_content.clone(),
        });

        let (kind, content) = match &resolution.counterpart_content {
            Some(draft) => (BlockKind::Draft, draft.clone()),
            None => (BlockKind::Missing, String::new()),
        };
        blocks.push(ContextBlock {
            path: resolution.counterpart.path.clone(),
            language: resolution.counterpart.language,
            kind,
            content,
        });

        Self { blocks }
    }

    pub fn blocks(&self) -> &[ContextBlock] {
        &self.blocks
    }

    /// The trailing draft/missing block
    pub fn requested(&self) -> Option<&ContextBlock> {
        self.blocks
            .last()
            .filter(|b| matches!(b.kind, BlockKind::Draft | BlockKind::Missing))
    }

    /// Render the document as the user message
    pub fn render(&self, languages: &LanguagePair) -> String {
        let mut out = String::new();

        for block in &self.blocks {
            let fence = &languages.profile(block.language).fence_tag;
            let path = display_path(&block.path);
            match block.kind {
                BlockKind::Dependency | BlockKind::Focal => {
                    let _ = write!(out, "# {}\n\n```{}\n{}\n```\n\n", path, fence, block.content.trim_end());
                }
                BlockKind::Draft => {
                    let _ = write!(
                        out,
                        "# {} (draft: review and correct this file)\n\n```{}\n{}\n```\n\n",
                        path,
                        fence,
                        block.content.trim_end()
                    );
                }
                BlockKind::Missing => {
                    let _ = write!(out, "# {} (missing: write this file)\n\n```{}\n```\n\n", path, fence);
                }
            }
        }

        if let Some(requested) = self.requested() {
            let _ = writeln!(
                out,
                "Now output the complete {} file `{}`.",
                languages.profile(requested.language).name,
                display_path(&requested.path)
            );
        }

        out
    }

    /// SHA-256 of the rendered document, for comparing prompts across runs
    pub fn digest(rendered: &str) -> String {
        format!("{:x}", Sha256::digest(rendered.as_bytes()))
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
