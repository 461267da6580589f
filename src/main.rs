use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::signal;
use tokio_stream::wrappers::WatchStream;

use toast_center::config::Settings;
use toast_center::{global, metrics, telemetry, Snapshot, ToastSpec, Toaster};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize tracing
    telemetry::init_tracing(&settings.logging)?;
    tracing::info!("Configuration loaded");

    let toaster = global::init(settings.toasts.clone())?;

    // Stand-in for the presentation layer: render every snapshot as a log line
    toaster
        .subscribe(|snapshot: &Snapshot| {
            let titles: Vec<&str> = snapshot.iter().map(|n| n.title()).collect();
            tracing::info!(
                version = snapshot.version(),
                active = snapshot.len(),
                titles = ?titles,
                "Snapshot"
            );
        })
        .detach();

    global::info("Brief saved", None)?;
    global::success("Matrix generated", Some("24 rows"))?;
    global::error("Export failed", Some("backend returned 502"))?;
    let retry = global::show(
        ToastSpec::warning("Upload paused")
            .detail("connection lost")
            .persistent()
            .action("Retry", || tracing::info!("Retry requested")),
    )?;

    // Simulate the user clicking the action button
    let clicker = toaster.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        if let Err(e) = clicker.invoke_action(retry) {
            tracing::warn!(error = %e, "Action could not be invoked");
        }
    });

    tokio::select! {
        _ = drained(&toaster) => {
            tracing::info!("All notifications dismissed");
        }
        _ = shutdown_signal() => {}
    }

    let cleared = global::shutdown()?;
    let stats = serde_json::to_string(&toaster.stats())?;
    tracing::info!(cleared = cleared, stats = %stats, "Shutdown complete");

    match metrics::encode_metrics() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    Ok(())
}

/// Resolves once the collection is empty
async fn drained(toaster: &Toaster) {
    let mut snapshots = WatchStream::new(toaster.watch());
    while let Some(snapshot) = snapshots.next().await {
        if snapshot.is_empty() {
            break;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        }
    }
}
