// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforce the connection limit and serve it in a
/// spawned task.
///
/// The connection is registered with `graceful` so shutdown can wait for it.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    graceful: &GracefulShutdown,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= max_conn {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    let performance = &state.config.performance;
    let mut builder = http1::Builder::new();
    builder
        .keep_alive(performance.keep_alive)
        .timer(TokioTimer::new())
        .header_read_timeout(performance.idle_timeout());

    let service_state = Arc::clone(state);
    let service = service_fn(move |req| {
        handler::handle_request(req, Arc::clone(&service_state), peer_addr)
    });

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    let conn = graceful.watch(conn);
    let counter = Arc::clone(conn_counter);

    tokio::spawn(async move {
        match conn.await {
            Ok(()) => {}
            // Idle keep-alive connections and clients hanging up mid-request
            Err(err) if err.is_timeout() || err.is_incomplete_message() => {}
            Err(err) => logger::log_connection_error(&err),
        }
        counter.fetch_sub(1, Ordering::SeqCst);
    });
}
