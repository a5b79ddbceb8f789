//! Rally Score Back binary entrypoint wiring REST, WebSocket, SSE and the history store.

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rally_score_back::{
    config::AppConfig,
    dao::history_store::{HistoryStore, JsonFileHistoryStore},
    routes,
    services::{sse_events, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let history_path = config.history.path.clone();
    let app_state = AppState::new(config);

    tokio::spawn(sse_events::forward_degraded_changes(app_state.clone()));
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        let path = history_path.clone();
        async move {
            JsonFileHistoryStore::open(path)
                .await
                .map(|store| Arc::new(store) as Arc<dyn HistoryStore>)
        }
    }));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let ip = match env::var("BIND_ADDR") {
        Ok(value) => value.parse::<IpAddr>().unwrap_or_else(|err| {
            warn!(%value, error = %err, "invalid BIND_ADDR; using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }),
        Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };

    let addr = SocketAddr::new(ip, port);
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
