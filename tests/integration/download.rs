//! Archive download and installation against a local HTTP server.

use std::sync::{Arc, Mutex};
use update_helper::archive::ArchiveInstaller;
use update_helper::config::HelperConfig;
use update_helper::constants::steps;
use update_helper::core::UpdateError;
use update_helper::models::{PlatformTag, ProgressFn};
use update_helper::test_utils::{ArchiveFixture, init_test_logging};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn recorder() -> (ProgressFn, Arc<Mutex<Vec<(String, f64)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressFn =
        Arc::new(move |step, f| sink.lock().unwrap().push((step.to_string(), f)));
    (callback, seen)
}

fn config_for(server: &MockServer) -> HelperConfig {
    HelperConfig {
        release_url: format!("{}/{{version}}/update-helper-cli-{{platform}}-x64.zip", server.uri()),
        version: "1.4.0".to_string(),
        user_agent: "test-agent/1.0".to_string(),
        ..HelperConfig::default()
    }
}

fn fractions(seen: &[(String, f64)], step: &str) -> Vec<f64> {
    seen.iter().filter(|(s, _)| s == step).map(|(_, f)| *f).collect()
}

#[tokio::test]
async fn test_install_downloads_and_extracts_helper() {
    init_test_logging(None);
    let server = MockServer::start().await;
    let body = ArchiveFixture::with_helper(PlatformTag::Linux)
        .file("README.md", "x".repeat(64 * 1024), 0o644)
        .to_bytes()
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/1.4.0/update-helper-cli-lnx-x64.zip"))
        .and(header("user-agent", "test-agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&server)
        .await;

    let installer = ArchiveInstaller::new(PlatformTag::Linux, config_for(&server));
    let (callback, seen) = recorder();
    let helper = installer.install(callback).await.unwrap();

    assert!(helper.binary.is_file());
    assert!(helper.directory.path().join("README.md").is_file());

    let seen = seen.lock().unwrap();
    for step in [steps::DOWNLOAD, steps::EXTRACT] {
        let reported = fractions(&seen, step);
        assert_eq!(reported.first(), Some(&0.0), "{step} did not start at 0");
        assert_eq!(reported.last(), Some(&1.0), "{step} did not finish at 1");
        assert!(reported.windows(2).all(|w| w[0] <= w[1]), "{step} went backwards: {reported:?}");
    }
    // Download completes before extraction starts
    let last_download = seen.iter().rposition(|(s, _)| s == steps::DOWNLOAD).unwrap();
    let first_extract = seen.iter().position(|(s, _)| s == steps::EXTRACT).unwrap();
    assert!(last_download < first_extract);
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

    let installer = ArchiveInstaller::new(PlatformTag::Mac, config_for(&server));
    let (callback, seen) = recorder();
    let err = installer.install(callback).await.unwrap_err();

    match err.downcast_ref::<UpdateError>() {
        Some(UpdateError::Transport {
            url,
            reason,
        }) => {
            assert!(url.ends_with("/1.4.0/update-helper-cli-mac-x64.zip"));
            assert!(reason.contains("404"));
        }
        other => panic!("Expected Transport error, got {other:?}"),
    }
    // Nothing was extracted
    assert!(fractions(&seen.lock().unwrap(), steps::EXTRACT).is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = HelperConfig {
        release_url: "http://127.0.0.1:9/{version}/{platform}.zip".to_string(),
        ..HelperConfig::default()
    };
    let installer = ArchiveInstaller::new(PlatformTag::Linux, config);
    let (callback, _) = recorder();

    let err = installer.install(callback).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Transport { .. })));
}

#[tokio::test]
async fn test_archive_without_helper_is_payload_error() {
    let server = MockServer::start().await;
    let body = ArchiveFixture::new().file("NOTES.txt", "no binary here", 0o644).to_bytes().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let installer = ArchiveInstaller::new(PlatformTag::Linux, config_for(&server));
    let (callback, _) = recorder();
    let err = installer.install(callback).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Payload { .. })));
}

#[tokio::test]
async fn test_unusable_user_agent_is_transport_error() {
    let server = MockServer::start().await;
    let config = HelperConfig {
        user_agent: "bad\nagent".to_string(),
        ..config_for(&server)
    };
    let installer = ArchiveInstaller::new(PlatformTag::Linux, config);
    let (callback, _) = recorder();

    let err = installer.install(callback).await.unwrap_err();
    match err.downcast_ref::<UpdateError>() {
        Some(UpdateError::Transport {
            url, ..
        }) => assert!(url.ends_with("/1.4.0/update-helper-cli-lnx-x64.zip")),
        other => panic!("Expected Transport error, got {other:?}"),
    }
    // The request never left the client
    assert!(server.received_requests().await.unwrap().is_empty());
}
