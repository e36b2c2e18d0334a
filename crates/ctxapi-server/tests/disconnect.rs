//! A client that hangs up mid-request cancels the work behind it.
//!
//! Lives in its own test binary: it installs the global metrics recorder
//! and reads the in-flight gauge, which other tests would disturb.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use ctxapi_cache::MemoryCache;
use ctxapi_server::{App, Server, ShutdownSignal};
use ctxapi_telemetry::MetricsRegistry;

fn in_flight(handle: &PrometheusHandle) -> Option<f64> {
    handle
        .render()
        .lines()
        .find_map(|line| line.strip_prefix("http_requests_in_flight "))
        .and_then(|value| value.trim().parse().ok())
}

async fn wait_for_in_flight(handle: &PrometheusHandle, expected: f64) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while in_flight(handle) != Some(expected) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(
        waited.is_ok(),
        "in-flight gauge stuck at {:?}, wanted {expected}",
        in_flight(handle)
    );
}

#[tokio::test]
async fn disconnect_cancels_pending_sleep() {
    let handle = PrometheusBuilder::new().install_recorder().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = App::new(
        Arc::new(MemoryCache::new()),
        MetricsRegistry::new(handle.clone()),
    );
    let shutdown = ShutdownSignal::new();
    let server = tokio::spawn(Server::new(app, addr).serve(listener, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/sleep/30 HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    wait_for_in_flight(&handle, 1.0).await;

    drop(stream);
    wait_for_in_flight(&handle, 0.0).await;

    // The request never completed, so it was never counted
    assert!(!handle.render().contains("/api/sleep/"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .expect("server task should not panic")
        .unwrap();
}
