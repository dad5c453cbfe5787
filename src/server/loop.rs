// Server loop module
// Accepts connections until the shutdown future resolves, then drains them

use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Pause after a failed `accept` before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Run the accept loop on `listener` until `shutdown` completes.
///
/// After shutdown no new connections are accepted; open connections finish
/// their in-flight request and close, bounded by the configured grace
/// period.
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(
                        stream,
                        peer_addr,
                        &state,
                        &active_connections,
                        &graceful,
                    ),
                    // EMFILE and friends persist until a descriptor frees up
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);

    let open = active_connections.load(Ordering::SeqCst);
    if open > 0 {
        logger::log_info(&format!("Draining {open} open connection(s)"));
    }

    let grace = state.config.performance.shutdown_grace();
    let drained = tokio::time::timeout(grace, graceful.shutdown()).await.is_ok();
    logger::log_shutdown_complete(drained, active_connections.load(Ordering::SeqCst));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use flate2::read::GzDecoder;
    use std::collections::HashMap;
    use std::io::Read;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    const INDEX: &str = "<!doctype html><title>app</title><div id=\"root\"></div>";

    fn state_for(root: &std::path::Path) -> Arc<AppState> {
        let env = HashMap::from([
            (
                "SPA_ASSETS__ROOT".to_string(),
                root.to_string_lossy().into_owned(),
            ),
            ("SPA_LOGGING__ACCESS_LOG".to_string(), "false".to_string()),
            ("SPA_PERFORMANCE__SHUTDOWN_GRACE".to_string(), "2".to_string()),
        ]);
        let missing = root.join("missing.toml").to_string_lossy().into_owned();
        let cfg = Config::load_from(&missing, Some("0".to_string()), Some(env)).unwrap();
        Arc::new(AppState::new(cfg))
    }

    async fn raw_request(addr: SocketAddr, request: &str) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
        let end = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        let head = String::from_utf8(raw[..end].to_vec()).unwrap();
        (head.to_ascii_lowercase(), raw[end + 4..].to_vec())
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
        let script = "export const plans = ['basic', 'pro', 'agency'];\n".repeat(64);
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.a1b2c3.js"), &script).unwrap();

        let state = state_for(dir.path());
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(run(listener, state, async {
            let _ = rx.await;
        }));

        // Client-side route falls back to the entry document
        let raw = raw_request(
            addr,
            "GET /about HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("http/1.1 200 ok"), "{head}");
        assert!(head.contains("cache-control: public, max-age=0"));
        assert_eq!(body, INDEX.as_bytes());

        // Built asset, compressed on request
        let raw = raw_request(
            addr,
            "GET /assets/app.a1b2c3.js HTTP/1.1\r\nHost: localhost\r\nAccept-Encoding: gzip\r\nConnection: close\r\n\r\n",
        )
        .await;
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("http/1.1 200 ok"), "{head}");
        assert!(head.contains("cache-control: public, max-age=31536000"));
        assert!(head.contains("content-encoding: gzip"));
        let mut decoded = String::new();
        GzDecoder::new(body.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, script);

        tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server stops after shutdown")
            .unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }
}
