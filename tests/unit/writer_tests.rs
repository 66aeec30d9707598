/*!
 * Tests for output file writing
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::common;
use pairport::response_parser::ResponseRecord;
use pairport::writer::FileWriter;

fn record(path: &str, content: &str) -> ResponseRecord {
    ResponseRecord {
        path: PathBuf::from(path),
        language: Some("lang2".to_string()),
        content: content.to_string(),
    }
}

/// Only records with the output extension reach the disk
#[tokio::test]
async fn test_writeRecords_withMixedExtensions_shouldWriteOnlyMatching() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let writer = FileWriter::new(dir.path());
    let records = vec![
        record("A.tgt", "a"),
        record("A.src", "echo"),
        record("nested/B.tgt", "b"),
        record("notes.md", "prose"),
    ];

    let report = writer.write_records(&records, "tgt").await;

    assert_eq!(report.written, vec![dir.path().join("A.tgt"), dir.path().join("nested/B.tgt")]);
    assert_eq!(report.skipped, vec![PathBuf::from("A.src"), PathBuf::from("notes.md")]);
    assert!(!report.has_failures());
    assert!(!dir.path().join("A.src").exists());
    assert_eq!(fs::read_to_string(dir.path().join("nested/B.tgt"))?, "b");
    Ok(())
}

/// Writing the same records twice leaves the same bytes on disk
#[tokio::test]
async fn test_writeRecords_twice_shouldBeIdempotent() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "A.tgt", "stale draft")?;
    let writer = FileWriter::new(dir.path());
    let records = vec![record("A.tgt", "fresh\ncontent")];

    writer.write_records(&records, "tgt").await;
    let first = fs::read(dir.path().join("A.tgt"))?;
    writer.write_records(&records, "tgt").await;
    let second = fs::read(dir.path().join("A.tgt"))?;

    assert_eq!(first, b"fresh\ncontent");
    assert_eq!(first, second);
    Ok(())
}

/// A failed write is reported and the remaining records are still written
#[tokio::test]
async fn test_writeRecords_withUnwritablePath_shouldContinueWithOthers() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "blocker", "a plain file")?;
    let writer = FileWriter::new(dir.path());
    let records = vec![record("blocker/X.tgt", "x"), record("Y.tgt", "y")];

    let report = writer.write_records(&records, "tgt").await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, dir.path().join("blocker/X.tgt"));
    assert_eq!(report.written, vec![dir.path().join("Y.tgt")]);
    Ok(())
}

#[tokio::test]
async fn test_writeRecords_withNoMatches_shouldReportEmpty() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let writer = FileWriter::new(dir.path());

    let report = writer.write_records(&[record("A.src", "a")], "tgt").await;

    assert!(report.is_empty());
    assert_eq!(report.skipped.len(), 1);
    Ok(())
}

#[test]
fn test_resolve_withRelativePath_shouldJoinBaseDir() {
    let writer = FileWriter::new("/base");
    assert_eq!(writer.resolve(&PathBuf::from("rel/A.tgt")), Ok(PathBuf::from("/base/rel/A.tgt")));
    assert_eq!(writer.resolve(&PathBuf::from("/base/abs/A.tgt")), Ok(PathBuf::from("/base/abs/A.tgt")));
    assert!(writer.resolve(&PathBuf::from("/elsewhere/A.tgt")).is_err());
}

/// Record paths may not climb out of the output directory
#[tokio::test]
async fn test_writeRecords_withEscapingPaths_shouldReportFailures() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let project = dir.path().join("project");
    fs::create_dir_all(&project)?;
    let outside = dir.path().join("outside.tgt");
    let writer = FileWriter::new(&project);
    let records = vec![
        record("../outside.tgt", "escaped"),
        record(&outside.to_string_lossy(), "escaped"),
        record("sub/../A.tgt", "escaped"),
        record("A.tgt", "kept"),
    ];

    let report = writer.write_records(&records, "tgt").await;

    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.failures[0].path, PathBuf::from("../outside.tgt"));
    assert_eq!(report.written, vec![project.join("A.tgt")]);
    assert!(!outside.exists());
    assert_eq!(fs::read_to_string(project.join("A.tgt"))?, "kept");
    Ok(())
}
