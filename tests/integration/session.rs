//! Helper launch, self-kill barrier and post-restart cleanup.

#![cfg(unix)]

use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use update_helper::config::HelperConfig;
use update_helper::constants::steps;
use update_helper::models::{PlatformTag, UpdateRequest};
use update_helper::session::{CleanupOutcome, HandoffSlot, UpdateSession};
use update_helper::test_utils::{ArchiveFixture, init_test_logging};
use update_helper::utils::fs::ExtractionDirectory;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SLOT: HandoffSlot = HandoffSlot::new("UPDATE_HELPER_INTEGRATION_SLOT");

fn session() -> UpdateSession {
    let config = HelperConfig {
        park_interval_secs: 1,
        ..HelperConfig::default()
    };
    UpdateSession::with_config(PlatformTag::Linux, config).with_slot(SLOT)
}

/// Script that records the session's slot variable, the default slot variable
/// and its arguments into `marker`, one per line.
fn recording_script(marker: &Path) -> String {
    format!(
        "#!/bin/sh\nprintf '%s\\n' \"${}\" \"$UPDATE_HELPER_CLEANUP_DIR\" \"$@\" > '{}.tmp'\nmv '{}.tmp' '{}'\n",
        SLOT.name(),
        marker.display(),
        marker.display(),
        marker.display()
    )
}

fn install_script(dir: &Path, content: &str) -> PathBuf {
    let path = PlatformTag::Linux.helper_path(dir);
    std::fs::write(&path, content).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn wait_for(path: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        std::thread::sleep(Duration::from_millis(50));
    }
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
#[serial]
async fn test_launch_hands_off_directory_and_arguments() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("helper-ran.txt");
    let directory = ExtractionDirectory::new_in(temp.path(), "launch").unwrap();
    let helper = install_script(directory.path(), &recording_script(&marker));
    let expected_dir = directory.path().to_path_buf();

    let request = UpdateRequest::new("app.new", "app").rename(true).cleanup("app.new");
    let launched = session().launch(&helper, directory, &request).await.unwrap();

    assert!(launched.helper_pid > 0);
    assert_eq!(launched.extraction_dir, expected_dir);
    // The directory outlives the handle once the helper runs
    assert!(expected_dir.is_dir());

    let recorded = wait_for(&marker);
    let lines: Vec<&str> = recorded.lines().collect();
    // The directory travels in the session's own slot variable only
    assert_eq!(lines[0], expected_dir.to_str().unwrap());
    assert_eq!(lines[1], "");
    assert_eq!(
        &lines[2..],
        ["--rename", "--source", "app.new", "--target", "app", "--cleanup", "app.new"]
    );
}

#[tokio::test]
#[serial]
async fn test_failed_launch_removes_directory() {
    let temp = TempDir::new().unwrap();
    let directory = ExtractionDirectory::new_in(temp.path(), "broken").unwrap();
    let dir = directory.path().to_path_buf();

    let request = UpdateRequest::new("app.new", "app");
    let err = session()
        .launch(&dir.join("does-not-exist"), directory, &request)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Failed to launch update helper"));
    assert!(!dir.exists());
}

#[tokio::test]
#[serial]
async fn test_self_kill_request_parks_caller() {
    let temp = TempDir::new().unwrap();
    let directory = ExtractionDirectory::new_in(temp.path(), "park").unwrap();
    let helper = install_script(directory.path(), update_helper::test_utils::FAKE_HELPER_SCRIPT);
    let dir = directory.path().to_path_buf();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let request = UpdateRequest::new("app.new", "app")
        .kill(std::process::id())
        .progress(move |step, f| sink.lock().unwrap().push((step.to_string(), f)));

    let session = session();
    let parked = tokio::time::timeout(
        Duration::from_millis(2500),
        session.launch(&helper, directory, &request),
    )
    .await;

    assert!(parked.is_err(), "launch returned although the caller should be parked");
    // Dropping the parked future must not take the handed-off directory with it
    assert!(dir.is_dir());
    assert!(PlatformTag::Linux.helper_path(&dir).is_file());
    std::fs::remove_dir_all(&dir).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(steps::EXECUTE.to_string(), 0.0), (steps::EXECUTE.to_string(), 0.5)]
    );
}

#[tokio::test]
#[serial]
async fn test_update_then_cleanup_after_restart() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("helper-ran.txt");

    let server = MockServer::start().await;
    let body = ArchiveFixture::new()
        .file(&PlatformTag::Linux.helper_file_name(), recording_script(&marker), 0o755)
        .to_bytes()
        .unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let config = HelperConfig {
        release_url: format!("{}/{{version}}/{{platform}}.zip", server.uri()),
        ..HelperConfig::default()
    };
    let session = UpdateSession::with_config(PlatformTag::Linux, config).with_slot(SLOT);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let request = UpdateRequest::new("new.txt", "old.txt")
        .wait(500)
        .open("old.txt")
        .progress(move |step, _| sink.lock().unwrap().push(step.to_string()));
    let launched = session.update(request).await.unwrap();

    let recorded = wait_for(&marker);
    assert!(recorded.starts_with(launched.extraction_dir.to_str().unwrap()));
    assert!(recorded.contains("--wait\n500\n"));
    assert!(recorded.contains("--open\nold.txt\n"));

    let mut steps_seen = seen.lock().unwrap().clone();
    steps_seen.dedup();
    assert_eq!(steps_seen, [steps::DOWNLOAD, steps::EXTRACT, steps::EXECUTE]);

    // The restarted caller finds the directory in its environment
    unsafe {
        std::env::set_var(SLOT.name(), &launched.extraction_dir);
    }
    assert_eq!(
        session.cleanup().await.unwrap(),
        CleanupOutcome::Removed {
            directory: launched.extraction_dir.clone()
        }
    );
    assert!(!launched.extraction_dir.exists());
    assert_eq!(session.cleanup().await.unwrap(), CleanupOutcome::NotPending);
}

#[tokio::test]
#[serial]
async fn test_empty_handoff_is_not_pending() {
    unsafe {
        std::env::set_var(SLOT.name(), "");
    }
    assert_eq!(session().cleanup().await.unwrap(), CleanupOutcome::NotPending);
}
