// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Relog demo server
//
//  Config:  LOGGING_LOGLEVEL / LOGGING_ENVIRONMENT / LOGGING_ERROR_FIELD
//  Routes:  /              hello
//           /hello/{name}  logs through the request context
//           /panic         recovered panic → error record + 500
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::Context as _;
use axum::extract::{Extension, Path};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use relog_core::{LogContext, Logger, LoggingConfig};
use relog_http::RequestLogLayer;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "relog-server", version, about = "Relog demo server")]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging ──
    let config = LoggingConfig::from_env();
    let logger = Logger::new(&config);
    let ctx = LogContext::new().with_logger(logger.clone());

    logger
        .info()
        .field("version", env!("CARGO_PKG_VERSION"))
        .field("addr", cli.addr.to_string())
        .field("level", logger.level().as_str())
        .field("dev_mode", config.is_dev())
        .emit("server starting");

    // ── Routes ──
    let app = Router::new()
        .route("/", get(home))
        .route("/hello/{name}", get(hello))
        .route("/panic", get(boom))
        .layer(RequestLogLayer::from_context(&ctx));

    // ── Serve ──
    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    logger.info().emit("server stopped");
    Ok(())
}

async fn home() -> &'static str {
    "relog demo\n"
}

/// Greets by name and logs through a logger enriched from the request
/// context.
async fn hello(Path(name): Path<String>, Extension(ctx): Extension<LogContext>) -> String {
    let scoped = ctx.with_value("visitor", name.clone());
    let logger = ctx.merge_keys(&scoped, &["visitor"]);
    logger.info().emit("greeting served");
    format!("hello, {name}\n")
}

/// Panics on purpose so the recovery path can be exercised by hand.
async fn boom() -> &'static str {
    panic!("demo panic");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
