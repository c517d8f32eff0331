use std::sync::Arc;

use detour::config::Config;
use detour::engine::{Engine, EngineOptions};
use detour::external::google_maps::GoogleMaps;
use detour::notify::{LogSurface, Notification, NotificationSurface};
use detour::server::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), detour::error::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let google_maps = Arc::new(GoogleMaps::new(&config)?);

    let (tx, rx) = async_channel::bounded::<Notification>(64);

    tokio::spawn(async move {
        while let Ok(notification) = rx.recv().await {
            LogSurface.notify(notification);
        }
    });

    let engine = Engine::new(
        google_maps.clone(),
        google_maps,
        Arc::new(tx),
        EngineOptions {
            poll_interval: config.poll_interval,
            ..EngineOptions::default()
        },
    );

    serve(engine, config.bind_addr).await
}
