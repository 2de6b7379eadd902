//! Extraction of real zip archives.

use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use update_helper::archive::ArchiveInstaller;
use update_helper::archive::extract::extract_archive;
use update_helper::config::HelperConfig;
use update_helper::core::UpdateError;
use update_helper::models::{PlatformTag, ProgressFn};
use update_helper::test_utils::{ArchiveFixture, init_test_logging};
use update_helper::utils::progress::StepProgress;

fn recorder() -> (ProgressFn, Arc<Mutex<Vec<(String, f64)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressFn =
        Arc::new(move |step, f| sink.lock().unwrap().push((step.to_string(), f)));
    (callback, seen)
}

fn sample_archive(dir: &Path) -> std::path::PathBuf {
    ArchiveFixture::new()
        .directory("share/")
        .file("bin/tool", "#!/bin/sh\necho tool\n", 0o750)
        .file("bin/readme.txt", "plain text", 0o640)
        .file("share/doc/notes.md", [0u8, 159, 146, 150], 0o644)
        .symlink("bin/current", "tool")
        .write_to(dir, "sample.zip")
        .unwrap()
}

#[test]
fn test_extracted_tree_matches_archive() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, _) = recorder();
    let report =
        extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap();

    assert_eq!(report.entries, 5);
    assert!(root.join("share").is_dir());
    assert!(root.join("share/doc").is_dir());
    assert_eq!(std::fs::read_to_string(root.join("bin/tool")).unwrap(), "#!/bin/sh\necho tool\n");
    // Binary payloads are written verbatim
    assert_eq!(std::fs::read(root.join("share/doc/notes.md")).unwrap(), vec![0u8, 159, 146, 150]);
}

#[test]
#[cfg(unix)]
fn test_modes_and_symlinks() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, _) = recorder();
    let report =
        extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap();

    let mode = |p: &str| std::fs::metadata(root.join(p)).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode("bin/tool"), 0o755);
    assert_eq!(mode("bin/readme.txt"), 0o644);

    let link = root.join("bin/current");
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("tool"));
    assert_eq!(report.symlink_modes.len(), 1);
}

#[test]
fn test_extraction_progress_is_per_entry() {
    let temp = TempDir::new().unwrap();
    let archive = ArchiveFixture::new()
        .file("a", "1", 0o644)
        .file("b", "2", 0o644)
        .file("c", "3", 0o644)
        .file("d", "4", 0o644)
        .write_to(temp.path(), "four.zip")
        .unwrap();
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, seen) = recorder();
    extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap();

    let fractions: Vec<f64> = seen.lock().unwrap().iter().map(|(_, f)| *f).collect();
    assert_eq!(fractions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn test_entry_escaping_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    let archive =
        ArchiveFixture::new().file("../escaped.txt", "x", 0o644).write_to(temp.path(), "evil.zip");
    let archive = archive.unwrap();
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, _) = recorder();
    let err =
        extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap_err();

    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Payload { .. })));
    assert!(!temp.path().join("escaped.txt").exists());
}

#[test]
#[cfg(unix)]
fn test_write_through_symlink_is_rejected() {
    let temp = TempDir::new().unwrap();
    let outside = temp.path().join("outside");
    std::fs::create_dir(&outside).unwrap();
    let archive = ArchiveFixture::new()
        .symlink("evil", outside.to_str().unwrap())
        .file("evil/pwned", "x", 0o644)
        .write_to(temp.path(), "link-escape.zip")
        .unwrap();
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, _) = recorder();
    let err =
        extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap_err();

    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Payload { .. })));
    assert!(!outside.join("pwned").exists());
}

#[test]
#[cfg(unix)]
fn test_relative_symlink_escape_is_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = ArchiveFixture::new()
        .symlink("bin/up", "../../")
        .file("bin/up/pwned", "x", 0o644)
        .write_to(temp.path(), "relative-escape.zip")
        .unwrap();
    let root = temp.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let (callback, _) = recorder();
    let err =
        extract_archive(&archive, &root, &mut StepProgress::new("extract", callback)).unwrap_err();

    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Payload { .. })));
    assert!(!temp.path().join("pwned").exists());
}

#[tokio::test]
async fn test_install_from_file_finds_helper() {
    let temp = TempDir::new().unwrap();
    let archive = ArchiveFixture::with_helper(PlatformTag::Linux)
        .file("LICENSE", "MIT", 0o644)
        .write_to(temp.path(), "helper.zip")
        .unwrap();

    let installer = ArchiveInstaller::new(PlatformTag::Linux, HelperConfig::default());
    let (callback, _) = recorder();
    let helper = installer.install_from_file(&archive, callback).await.unwrap();

    assert!(helper.binary.is_file());
    assert!(helper.binary.starts_with(helper.directory.path()));
    assert_eq!(helper.binary.file_name().unwrap(), "update-helper-cli-lnx-x64");

    // Dropping the directory handle removes the extraction directory
    let dir = helper.directory.path().to_path_buf();
    drop(helper);
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_install_from_file_without_helper_is_payload_error() {
    let temp = TempDir::new().unwrap();
    let archive = ArchiveFixture::with_helper(PlatformTag::Mac)
        .write_to(temp.path(), "wrong-platform.zip")
        .unwrap();

    let installer = ArchiveInstaller::new(PlatformTag::Windows, HelperConfig::default());
    let (callback, _) = recorder();
    let err = installer.install_from_file(&archive, callback).await.unwrap_err();

    match err.downcast_ref::<UpdateError>() {
        Some(UpdateError::Payload {
            reason,
        }) => assert!(reason.contains("update-helper-cli-win-x64.exe")),
        other => panic!("Expected Payload error, got {other:?}"),
    }
}
