use kv_watch::Error;
use kv_watch::Result;
use kv_watch::Subscription;
use kv_watch::WatchContext;
use kv_watch::WatchEngineConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let settings = WatchEngineConfig::new()?.validate()?;
    info!(?settings, "configuration loaded");

    let context = WatchContext::from_config(settings)?;
    let mut config_watch = context.watch_config()?;
    let mut control_watch = context.watch_control()?;

    info!(
        service = context.service_name(),
        service_id = context.service_id(),
        "watching {} and {}. Waiting for CTRL+C signal...",
        config_watch.key(),
        control_watch.key()
    );

    let result = tokio::select! {
        r = follow("config", &mut config_watch) => r,
        r = follow("control", &mut control_watch) => r,
        r = shutdown_signal() => r,
    };

    config_watch.shutdown().await;
    control_watch.shutdown().await;

    if let Err(e) = &result {
        error!("watch stopped: {}", e);
    }
    info!("Exiting program.");
    result
}

/// Logs every change of one key until its subscription ends.
async fn follow(
    name: &'static str,
    subscription: &mut Subscription,
) -> Result<()> {
    while let Some(item) = subscription.next().await {
        match item? {
            Some(value) => info!(watch = name, bytes = value.len(), "{}", value),
            None => warn!(watch = name, "key deleted"),
        }
    }
    Err(Error::Fatal(format!("{name} watch ended unexpectedly")))
}

async fn shutdown_signal() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }
    Ok(())
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();
}
