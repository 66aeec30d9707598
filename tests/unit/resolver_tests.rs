/*!
 * Tests for dependency closure and pairing
 */

use anyhow::Result;
use std::path::PathBuf;

use crate::common;
use pairport::deps::{DependencyResolver, Existence, Listers, StaticLister};
use pairport::errors::ResolveError;
use pairport::language_utils::LanguageSide;

fn resolver(source: StaticLister, target: StaticLister) -> DependencyResolver {
    DependencyResolver::new(
        common::test_languages(),
        "Base/",
        Listers::new(Box::new(source), Box::new(target)),
    )
}

/// A dependency with only its source half present must block the run
#[tokio::test]
async fn test_resolve_withMissingTargetCounterpart_shouldReportExactlyThatPath() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.src", "a")?;
    let b = common::create_test_file(root, "B.src", "b")?;
    common::create_test_file(root, "B.tgt", "b'")?;
    let c = common::create_test_file(root, "C.src", "c")?;

    let resolver = resolver(StaticLister::new().with(&a, [&b, &c]), StaticLister::new());
    let err = resolver.resolve(&a).await.unwrap_err();

    match err {
        ResolveError::MissingDependencies { missing } => {
            assert_eq!(missing, vec![root.join("C.tgt")]);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

/// Every missing half is listed, not just the first one
#[tokio::test]
async fn test_resolve_withSeveralMissing_shouldListAllOfThem() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.src", "a")?;
    common::create_test_file(root, "B.src", "b")?;
    common::create_test_file(root, "C.tgt", "c'")?;

    let deps = [root.join("B.src"), root.join("C.src"), root.join("D.src")];
    let resolver = resolver(StaticLister::new().with(&a, deps.clone()), StaticLister::new());
    let err = resolver.resolve(&a).await.unwrap_err();

    let ResolveError::MissingDependencies { missing } = err else {
        panic!("expected missing dependencies");
    };
    assert_eq!(
        missing,
        vec![
            root.join("B.tgt"),
            root.join("C.src"),
            root.join("D.src"),
            root.join("D.tgt"),
        ]
    );
    Ok(())
}

/// A complete closure yields one pair per dependency, sorted by path
#[tokio::test]
async fn test_resolve_withCompleteClosure_shouldReturnSortedPairs() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.src", "a")?;
    for name in ["Z", "M"] {
        common::create_test_file(root, &format!("{name}.src"), name)?;
        common::create_test_file(root, &format!("{name}.tgt"), &name.to_lowercase())?;
    }

    let lister = StaticLister::new().with(&a, [root.join("Z.src"), root.join("M.src"), root.join("Z.src")]);
    let resolution = resolver(lister, StaticLister::new()).resolve(&a).await?;

    let paths: Vec<PathBuf> = resolution.pairs.iter().map(|p| p.record.source.path.clone()).collect();
    assert_eq!(paths, vec![root.join("M.src"), root.join("Z.src")]);
    assert!(resolution.pairs.iter().all(|p| p.record.is_complete()));
    assert_eq!(resolution.pairs[0].target_content, "m");
    assert_eq!(resolution.pairs[0].record.target.language, LanguageSide::Target);
    Ok(())
}

/// Entries under the shared namespace and the focal file itself are skipped
#[tokio::test]
async fn test_resolve_withSharedNamespaceEntries_shouldIgnoreThem() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.src", "a")?;

    let lister = StaticLister::new().with(
        &a,
        [PathBuf::from("Base/Nat.src"), PathBuf::from("./Base/List/map.src"), a.clone()],
    );
    let resolution = resolver(lister, StaticLister::new()).resolve(&a).await?;

    assert!(resolution.pairs.is_empty());
    Ok(())
}

/// The focal counterpart is reported as present or missing
#[tokio::test]
async fn test_resolve_withDraftCounterpart_shouldLoadIt() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.src", "a")?;
    common::create_test_file(root, "A.tgt", "draft")?;

    let resolution = resolver(StaticLister::new(), StaticLister::new()).resolve(&a).await?;

    assert_eq!(resolution.counterpart.existence, Existence::Present);
    assert_eq!(resolution.counterpart_content.as_deref(), Some("draft"));
    assert_eq!(resolution.output_side(), LanguageSide::Target);
    Ok(())
}

/// A target-language focal file uses the target lister and points back to the source
#[tokio::test]
async fn test_resolve_withTargetFocal_shouldTranslateBackwards() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let root = dir.path();
    let a = common::create_test_file(root, "A.tgt", "a'")?;
    let b = common::create_test_file(root, "B.tgt", "b'")?;
    common::create_test_file(root, "B.src", "b")?;

    let resolver = resolver(StaticLister::new(), StaticLister::new().with(&a, [&b]));
    let resolution = resolver.resolve(&a).await?;

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].record.target.path, root.join("B.src"));
    assert_eq!(resolution.counterpart.path, root.join("A.src"));
    assert_eq!(resolution.counterpart.existence, Existence::Missing);
    Ok(())
}

#[tokio::test]
async fn test_resolve_withUnknownExtension_shouldFailBeforeListing() {
    let resolver = resolver(StaticLister::new(), StaticLister::new());
    let err = resolver.resolve(std::path::Path::new("notes.md")).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedExtension(_)));
}

#[tokio::test]
async fn test_resolve_withAbsentFocal_shouldFail() {
    let resolver = resolver(StaticLister::new(), StaticLister::new());
    let err = resolver.resolve(std::path::Path::new("/nonexistent/dir/A.src")).await.unwrap_err();
    assert!(matches!(err, ResolveError::FocalUnreadable { .. }));
}
