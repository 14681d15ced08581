use std::net::SocketAddr;

use rustytrack::build_app;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

fn listen_addr() -> SocketAddr {
    let configured = std::env::var("RUSTYTRACK_ADDR").ok();
    let fallback = || {
        DEFAULT_ADDR
            .parse()
            .expect("default socket address is valid")
    };
    match configured {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            tracing::warn!("ignoring RUSTYTRACK_ADDR '{}': {}", raw, err);
            fallback()
        }),
        None => fallback(),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rustytrack=debug,tower_http=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = build_app();
    let addr = listen_addr();
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server crashed");
}
