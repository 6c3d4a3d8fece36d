//! Full update runs against a mock GitHub server

use super::common::{archive_bytes, tree_json, write_bundle};
use archipel_installer::core::cancel::CancelToken;
use archipel_installer::core::path::ROOT_DIR_NAME;
use archipel_installer::core::InstallerExitCode;
use archipel_installer::di::mocks::{FixedDiskSpace, RecordingSink, RecordingSleeper, StaticRegistryProbe};
use archipel_installer::events::Reporter;
use archipel_installer::install::AtomicInstaller;
use archipel_installer::remote::{GitHubBundleSource, RemoteEndpoints};
use archipel_installer::resolver::PathResolver;
use archipel_installer::transport::RetryingClient;
use archipel_installer::updater::{InstallerOptions, Updater};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn updater(server: &MockServer, temp: &Path, sink: Arc<RecordingSink>) -> Updater {
    let reporter = Reporter::new(sink);
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let client = RetryingClient::with_parts(
        http,
        Arc::new(RecordingSleeper::default()),
        reporter.clone(),
    );
    let endpoints = RemoteEndpoints {
        tree_url: format!("{}/repos/tree", server.uri()),
        archive_url: format!("{}/archive/main.zip", server.uri()),
        prefix: "Patches/Archipel/".to_string(),
    };
    let source = GitHubBundleSource::with_parts(
        client,
        endpoints,
        Arc::new(FixedDiskSpace(u64::MAX)),
        reporter.clone(),
    );
    let resolver = PathResolver::with_parts(
        temp.join("home").join("config.json"),
        vec![],
        Arc::new(StaticRegistryProbe::default()),
        reporter.clone(),
    );

    Updater::new(
        Arc::new(source),
        resolver,
        AtomicInstaller::new(reporter.clone()),
        reporter,
    )
    .with_scratch_root(temp.join("scratch"))
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let published = temp.path().join("published");
    write_bundle(
        &published,
        &[
            ("patch.ini", b"[patch]\nversion=2\n"),
            ("maps/north.dat", b"north map data"),
            ("maps/south.dat", b"south map data"),
        ],
    );
    let root = temp.path().join("Games").join(ROOT_DIR_NAME);
    fs::create_dir_all(&root).unwrap();
    (temp, published, root)
}

#[tokio::test]
async fn test_install_then_up_to_date() {
    let (temp, published, root) = setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(&published)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/main.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive_bytes(&published)))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let updater = updater(&server, temp.path(), sink.clone());
    let options = InstallerOptions {
        forced_path: Some(root.clone()),
        ..Default::default()
    };

    let first = updater
        .run(&options, false, None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(first.exit_code, InstallerExitCode::Success);
    assert!(!first.already_up_to_date);

    let installed = root.join("Patches").join("Archipel");
    assert_eq!(
        fs::read(installed.join("maps").join("north.dat")).unwrap(),
        b"north map data"
    );
    assert!(!installed.join("README.md").exists());

    let second = updater
        .run(&options, false, None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(second.exit_code, InstallerExitCode::Success);
    assert!(second.already_up_to_date);

    // Only the live bundle is left next to it
    let siblings: Vec<_> = fs::read_dir(root.join("Patches"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(siblings.len(), 1);
    assert_eq!(fs::read_dir(temp.path().join("scratch")).unwrap().count(), 0);
    assert!(sink.percents().contains(&100));
}

#[tokio::test]
async fn test_changed_file_is_updated() {
    let (temp, published, root) = setup();
    let installed = root.join("Patches").join("Archipel");
    write_bundle(
        &installed,
        &[
            ("patch.ini", b"[patch]\nversion=1\n"),
            ("maps/north.dat", b"north map data"),
            ("maps/south.dat", b"south map data"),
            ("obsolete.dat", b"gone in version 2"),
        ],
    );

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(&published)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/main.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive_bytes(&published)))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let result = updater(&server, temp.path(), sink)
        .run(
            &InstallerOptions {
                forced_path: Some(root.clone()),
                ..Default::default()
            },
            false,
            None,
            &CancelToken::new(),
        )
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(
        fs::read(installed.join("patch.ini")).unwrap(),
        b"[patch]\nversion=2\n"
    );
    assert!(!installed.join("obsolete.dat").exists());
}

#[tokio::test]
async fn test_dry_run_downloads_nothing() {
    let (temp, published, root) = setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tree_json(&published)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/main.zip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let result = updater(&server, temp.path(), sink)
        .run(
            &InstallerOptions {
                dry_run: true,
                forced_path: Some(root.clone()),
                ..Default::default()
            },
            false,
            None,
            &CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.exit_code, InstallerExitCode::Success);
    assert!(!result.already_up_to_date);
    assert!(!root.join("Patches").join("Archipel").exists());
}

#[tokio::test]
async fn test_rate_limited_tree_then_network_error() {
    let (temp, _published, root) = setup();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/tree"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .expect(3)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let result = updater(&server, temp.path(), sink.clone())
        .run(
            &InstallerOptions {
                forced_path: Some(root),
                ..Default::default()
            },
            false,
            None,
            &CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.exit_code, InstallerExitCode::NetworkError);
    assert!(sink.contains("[ERROR]"));
}
