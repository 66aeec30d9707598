/*!
 * Tests for prompt context assembly
 */

use std::path::PathBuf;

use crate::common;
use pairport::context::{BlockKind, ContextDocument};
use pairport::deps::{Existence, FileRef, PairRecord, Resolution, ResolvedPair};
use pairport::language_utils::LanguageSide;

fn pair(name: &str) -> ResolvedPair {
    ResolvedPair {
        record: PairRecord {
            source: FileRef::new(format!("{name}.src"), LanguageSide::Source, Existence::Present),
            target: FileRef::new(format!("{name}.tgt"), LanguageSide::Target, Existence::Present),
        },
        source_content: format!("{name} source\n"),
        target_content: format!("{name} target\n"),
    }
}

fn resolution(draft: Option<&str>) -> Resolution {
    Resolution {
        focal: FileRef::new("A.src", LanguageSide::Source, Existence::Present),
        focal_content: "A source".to_string(),
        counterpart: FileRef::new(
            "A.tgt",
            LanguageSide::Target,
            if draft.is_some() { Existence::Present } else { Existence::Missing },
        ),
        counterpart_content: draft.map(str::to_string),
        pairs: vec![pair("B"), pair("C")],
    }
}

#[test]
fn test_assemble_shouldOrderPairsThenFocalThenMarker() {
    let document = ContextDocument::assemble(&resolution(None));
    let order: Vec<(PathBuf, BlockKind)> = document
        .blocks()
        .iter()
        .map(|b| (b.path.clone(), b.kind))
        .collect();

    assert_eq!(
        order,
        vec![
            (PathBuf::from("B.src"), BlockKind::Dependency),
            (PathBuf::from("B.tgt"), BlockKind::Dependency),
            (PathBuf::from("C.src"), BlockKind::Dependency),
            (PathBuf::from("C.tgt"), BlockKind::Dependency),
            (PathBuf::from("A.src"), BlockKind::Focal),
            (PathBuf::from("A.tgt"), BlockKind::Missing),
        ]
    );
}

#[test]
fn test_assemble_withDraft_shouldEndWithSingleDraftBlock() {
    let document = ContextDocument::assemble(&resolution(Some("old A")));
    let markers = document
        .blocks()
        .iter()
        .filter(|b| matches!(b.kind, BlockKind::Draft | BlockKind::Missing))
        .count();

    assert_eq!(markers, 1);
    let requested = document.requested().expect("trailing marker");
    assert_eq!(requested.kind, BlockKind::Draft);
    assert_eq!(requested.content, "old A");
}

#[test]
fn test_render_shouldLabelBlocksWithFenceTags() {
    let languages = common::test_languages();
    let rendered = ContextDocument::assemble(&resolution(None)).render(&languages);

    assert!(rendered.starts_with("# B.src\n\n```lang1\nB source\n```\n\n# B.tgt\n\n```lang2\nB target\n```\n\n"));
    assert!(rendered.contains("# A.src\n\n```lang1\nA source\n```\n\n"));
    assert!(rendered.contains("# A.tgt (missing: write this file)\n\n```lang2\n```\n\n"));
    assert!(rendered.ends_with("Now output the complete Lang2 file `A.tgt`.\n"));
}

#[test]
fn test_render_withDraft_shouldIncludeDraftContent() {
    let languages = common::test_languages();
    let rendered = ContextDocument::assemble(&resolution(Some("old A\n\n"))).render(&languages);
    assert!(rendered.contains("# A.tgt (draft: review and correct this file)\n\n```lang2\nold A\n```\n\n"));
}

#[test]
fn test_render_withIdenticalInputs_shouldBeByteIdentical() {
    let languages = common::test_languages();
    let first = ContextDocument::assemble(&resolution(Some("d"))).render(&languages);
    let second = ContextDocument::assemble(&resolution(Some("d"))).render(&languages);

    assert_eq!(first, second);
    assert_eq!(ContextDocument::digest(&first), ContextDocument::digest(&second));
    assert_eq!(ContextDocument::digest(&first).len(), 64);
}
