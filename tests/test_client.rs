//! Engine client behavior against a mock Engine.

mod support;

use std::sync::Arc;
use std::time::Duration;

use bulkhead::docker::models::Container;
use bulkhead::docker::{AutoRefresh, DockerClient, EnrichmentCache, LogFetcher, Snapshot};
use bulkhead::error::DockerError;
use bulkhead::stream::LogStream;
use support::{
    MockEngine, chunked_response, frame, json_response, no_content, ok_json, stream_response,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const CONTAINERS: &str = r#"[
    {"Id":"c1","Names":["/api"],"Image":"api:1","State":"running","Status":"Up 2 minutes"},
    {"Id":"c2","Names":["/db"],"Image":"postgres:16","State":"exited","Status":"Exited (0) 1 hour ago"}
]"#;

const IMAGES: &str = r#"[{"Id":"sha256:1","RepoTags":["api:1"],"Created":1700000000,"Size":1024}]"#;

const RUNNING: &str = r#"{"Id":"c1","Config":{"Tty":false},"State":{"Running":true}}"#;
const STOPPED: &str = r#"{"Id":"c2","Config":{"Tty":false},"State":{"Running":false}}"#;

fn client(engine: &MockEngine) -> DockerClient {
    DockerClient::new(engine.path()).with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_list_containers() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/containers/json?all=true",
        ok_json(CONTAINERS),
    )]);

    let containers = client(&engine).list_containers().await.unwrap();

    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0].title(), "api");
    assert_eq!(containers[1].image, "postgres:16");
    assert_eq!(engine.requests(), vec!["GET /v1.41/containers/json?all=true"]);
}

#[tokio::test]
async fn test_list_images_chunked() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/images/json",
        chunked_response(IMAGES.as_bytes(), 16),
    )]);

    let images = client(&engine).list_images().await.unwrap();

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].title(), "api:1");
}

#[tokio::test]
async fn test_start_container() {
    let engine = MockEngine::start(vec![("POST /v1.41/containers/c1/start", no_content())]);

    client(&engine).start_container("c1").await.unwrap();

    assert_eq!(engine.requests(), vec!["POST /v1.41/containers/c1/start"]);
    assert!(engine.bodies()[0].is_empty());
}

#[tokio::test]
async fn test_start_already_started_is_success() {
    let engine = MockEngine::start(vec![(
        "POST /v1.41/containers/c1/start",
        b"HTTP/1.1 304 Not Modified\r\n\r\n".to_vec(),
    )]);

    assert!(client(&engine).start_container("c1").await.is_ok());
}

#[tokio::test]
async fn test_stop_missing_container_is_api_error() {
    let engine = MockEngine::start(vec![(
        "POST /v1.41/containers/nope/stop",
        json_response(404, "Not Found", r#"{"message":"No such container: nope"}"#),
    )]);

    let err = client(&engine).stop_container("nope").await.unwrap_err();

    match err {
        DockerError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such container: nope");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_with_plain_text_body() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/images/json",
        b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\n\r\nboom".to_vec(),
    )]);

    let err = client(&engine).list_images().await.unwrap_err();

    assert!(matches!(err, DockerError::Api { status: 500, ref message } if message == "boom"));
    assert!(!err.is_connection_error());
}

#[tokio::test]
async fn test_undecodable_listing_is_json_error() {
    let engine = MockEngine::start(vec![("GET /v1.41/images/json", ok_json("{\"oops\":"))]);

    let err = client(&engine).list_images().await.unwrap_err();

    assert!(matches!(err, DockerError::Json(_)));
}

#[tokio::test]
async fn test_inspect_image() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/images/sha256:1/json",
        ok_json(
            r#"{"Id":"sha256:1","RepoTags":["api:1"],"Created":"2024-01-01T00:00:00Z","Size":1024,"Config":{"Cmd":["run"]}}"#,
        ),
    )]);

    let inspection = client(&engine).inspect_image("sha256:1").await.unwrap();

    assert_eq!(inspection.size, 1024);
    assert!(inspection.created_at().is_some());
}

#[tokio::test]
async fn test_exec_on_stopped_container() {
    let engine = MockEngine::start(vec![("GET /v1.41/containers/c2/json", ok_json(STOPPED))]);

    let err = client(&engine)
        .exec("c2", &["ls".to_string()], false)
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::ContainerNotRunning));
    assert_eq!(engine.requests(), vec!["GET /v1.41/containers/c2/json"]);
}

fn exec_engine(exit_code: i64, output: Vec<u8>) -> MockEngine {
    MockEngine::start(vec![
        ("GET /v1.41/containers/c1/json", ok_json(RUNNING)),
        (
            "POST /v1.41/containers/c1/exec",
            json_response(201, "Created", r#"{"Id":"e1"}"#),
        ),
        ("POST /v1.41/exec/e1/start", stream_response(&output)),
        (
            "GET /v1.41/exec/e1/json",
            ok_json(&format!(r#"{{"ExitCode":{exit_code},"Running":false}}"#)),
        ),
    ])
}

#[tokio::test]
async fn test_exec_returns_stdout_only() {
    let mut output = frame(1, b"file-a\nfile-");
    output.extend(frame(1, b"b\n"));
    output.extend(frame(2, b"warning\n"));
    let engine = exec_engine(0, output);

    let command = vec!["ls".to_string(), "-1".to_string()];
    let stdout = client(&engine).exec("c1", &command, false).await.unwrap();

    assert_eq!(stdout, b"file-a\nfile-b\n");
    assert_eq!(
        engine.requests(),
        vec![
            "GET /v1.41/containers/c1/json",
            "POST /v1.41/containers/c1/exec",
            "POST /v1.41/exec/e1/start",
            "GET /v1.41/exec/e1/json",
        ]
    );

    let create: serde_json::Value = serde_json::from_slice(&engine.bodies()[1]).unwrap();
    assert_eq!(
        create,
        serde_json::json!({
            "AttachStdout": true,
            "AttachStderr": true,
            "Tty": false,
            "Cmd": ["ls", "-1"]
        })
    );
    let start: serde_json::Value = serde_json::from_slice(&engine.bodies()[2]).unwrap();
    assert_eq!(start["Detach"], false);
}

#[tokio::test]
async fn test_exec_with_carriage_returns() {
    let engine = exec_engine(0, frame(1, b"a\nb"));

    let stdout = client(&engine)
        .exec("c1", &["echo".to_string()], true)
        .await
        .unwrap();

    assert_eq!(stdout, b"a\r\nb");
}

#[tokio::test]
async fn test_exec_nonzero_exit_code() {
    let engine = exec_engine(127, frame(1, b"partial output\n"));

    let err = client(&engine)
        .exec("c1", &["missing-binary".to_string()], false)
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::ExecFailed(127)));
    assert_eq!(engine.count("GET /v1.41/exec/e1/json"), 1);
}

#[tokio::test]
async fn test_exec_create_failure_propagates() {
    let engine = MockEngine::start(vec![
        ("GET /v1.41/containers/c1/json", ok_json(RUNNING)),
        (
            "POST /v1.41/containers/c1/exec",
            json_response(409, "Conflict", r#"{"message":"container is paused"}"#),
        ),
    ]);

    let err = client(&engine)
        .exec("c1", &["ls".to_string()], false)
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::Api { status: 409, .. }));
    assert_eq!(engine.count("POST /v1.41/exec/e1/start"), 0);
}

#[tokio::test]
async fn test_enrichment_is_cached() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/containers/c1/json",
        ok_json(
            r#"{"Id":"c1","Created":"2024-05-01T12:00:00Z","Config":{"Cmd":["serve"]},"State":{"Running":true}}"#,
        ),
    )]);
    let client = client(&engine);
    let base: Container = serde_json::from_str(
        r#"{"Id":"c1","Names":["/api"],"Image":"api:1","Status":"Up"}"#,
    )
    .unwrap();

    let first = client.enrich_container(&base).await.unwrap();
    let second = client.clone().enrich_container(&base).await.unwrap();

    assert_eq!(first.command.as_deref(), Some("serve"));
    assert_eq!(first, second);
    assert_eq!(engine.count("GET /v1.41/containers/c1/json"), 1);
    assert_eq!(client.cache().len().await, 1);
}

#[tokio::test]
async fn test_enrichment_refetches_after_ttl() {
    let engine = MockEngine::start(vec![(
        "GET /v1.41/containers/c1/json",
        ok_json(r#"{"Id":"c1","State":{"Running":true}}"#),
    )]);
    let cache = Arc::new(EnrichmentCache::new(Duration::from_millis(50)));
    let client = client(&engine).with_cache(cache);
    let base: Container =
        serde_json::from_str(r#"{"Id":"c1","Names":[],"Image":"api:1","Status":"Up"}"#).unwrap();

    client.enrich_container(&base).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.enrich_container(&base).await.unwrap();

    assert_eq!(engine.count("GET /v1.41/containers/c1/json"), 2);
}

#[tokio::test]
async fn test_fetch_logs_multiplexed_filters_stream() {
    let mut logs = frame(1, b"started\n");
    logs.extend(frame(2, b"deprecated flag\n"));
    logs.extend(frame(1, b"listening\n"));
    let engine = MockEngine::start(vec![
        ("GET /v1.41/containers/c1/json", ok_json(RUNNING)),
        (
            "GET /v1.41/containers/c1/logs?stdout=true&stderr=true&tail=50&follow=false",
            stream_response(&logs),
        ),
    ]);
    let fetcher = LogFetcher::new(client(&engine));

    let stdout = fetcher.fetch_logs("c1", 50, LogStream::Stdout).await.unwrap();
    let stderr = fetcher.fetch_logs("c1", 50, LogStream::Stderr).await.unwrap();

    assert_eq!(stdout, vec![b"started\r\n".to_vec(), b"listening\r\n".to_vec()]);
    assert_eq!(stderr, vec![b"deprecated flag\r\n".to_vec()]);
}

#[tokio::test]
async fn test_fetch_logs_tty_returns_all_lines() {
    let engine = MockEngine::start(vec![
        (
            "GET /v1.41/containers/t1/json",
            ok_json(r#"{"Id":"t1","Config":{"Tty":true},"State":{"Running":true}}"#),
        ),
        (
            "GET /v1.41/containers/t1/logs?stdout=true&stderr=true&tail=100&follow=false",
            stream_response(b"\x1b[32mok\x1b[0m\nprompt$ "),
        ),
    ]);
    let fetcher = LogFetcher::new(client(&engine));

    let lines = fetcher.fetch_logs("t1", 100, LogStream::Stderr).await.unwrap();

    assert_eq!(
        lines,
        vec![b"\x1b[32mok\x1b[0m\r\n".to_vec(), b"prompt$ ".to_vec()]
    );
}

#[tokio::test]
async fn test_no_socket_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = DockerClient::new(dir.path().join("docker.sock"));

    let err = client.list_containers().await.unwrap_err();

    assert!(matches!(err, DockerError::ConnectionFailed { .. }));
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_cancelled_client() {
    let engine = MockEngine::start(vec![]);
    let token = CancellationToken::new();
    token.cancel();

    let err = client(&engine)
        .with_cancellation(token)
        .list_containers()
        .await
        .unwrap_err();

    assert!(matches!(err, DockerError::Cancelled));
}

#[tokio::test]
async fn test_refresh_once_updates_snapshot() {
    let engine = MockEngine::start(vec![
        ("GET /v1.41/containers/json?all=true", ok_json(CONTAINERS)),
        ("GET /v1.41/images/json", ok_json(IMAGES)),
    ]);
    let refresher = AutoRefresh::new(client(&engine), Duration::from_secs(10));
    let mut snapshot = Snapshot::default();

    refresher.refresh_once(&mut snapshot).await;

    assert_eq!(snapshot.containers.len(), 2);
    assert_eq!(snapshot.images.len(), 1);
    assert!(snapshot.container_error.is_none());
    assert!(snapshot.refreshed_at.is_some());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_lists() {
    let dir = tempfile::tempdir().unwrap();
    let refresher = AutoRefresh::new(
        DockerClient::new(dir.path().join("gone.sock")),
        Duration::from_secs(10),
    );
    let mut snapshot = Snapshot {
        containers: serde_json::from_str(CONTAINERS).unwrap(),
        ..Snapshot::default()
    };

    refresher.refresh_once(&mut snapshot).await;

    assert_eq!(snapshot.containers.len(), 2);
    assert!(snapshot.container_error.is_some());
    assert!(snapshot.image_error.is_some());
    assert!(snapshot.has_connection_error());
}

#[tokio::test]
async fn test_auto_refresh_publishes_and_stops() {
    let engine = MockEngine::start(vec![
        ("GET /v1.41/containers/json?all=true", ok_json(CONTAINERS)),
        ("GET /v1.41/images/json", ok_json(IMAGES)),
    ]);
    let (tx, mut rx) = watch::channel(Snapshot::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(
        AutoRefresh::new(client(&engine), Duration::from_millis(20)).run(tx, cancel.clone()),
    );

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().containers.len(), 2);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}
