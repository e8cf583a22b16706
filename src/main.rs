use std::sync::Arc;

use chrono::Utc;

use static_responder::config::{AppState, Config};
use static_responder::handler::{router, FileTypeHandler};
use static_responder::http::SharedMimeTable;
use static_responder::{logger, server};

const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Create Tokio runtime, sizing the worker pool from configuration
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Kick off the extension table load before anything can ask for it
    let mime_types = SharedMimeTable::spawn(cfg.files.mime_source());
    let handler = FileTypeHandler::new(Arc::new(cfg.handler_config()?), mime_types);

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;
    let shutdown = server::signal::start_signal_handler();

    let favicon = Arc::new(router::embedded_favicon(Utc::now().timestamp_millis()));
    let state = Arc::new(AppState::new(cfg, handler, favicon, shutdown.clone()));

    logger::log_server_start(&addr, &state.config);
    server::start_server_loop(listener, state, shutdown).await
}
