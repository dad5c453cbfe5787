use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg.logging)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let bound = listener.local_addr()?;

    let state = Arc::new(config::AppState::new(cfg));
    logger::log_server_start(&bound, &state.config);

    server::run(listener, state, async {
        let signal = server::signal::shutdown_signal().await;
        logger::log_shutdown_signal(signal);
    })
    .await;

    Ok(())
}
