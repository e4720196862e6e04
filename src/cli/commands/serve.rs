//! Web server command.

use std::sync::Arc;

use console::style;
use tokio::sync::watch;

use crate::cli::helpers::Runtime;
use thumbsense::config::Settings;
use thumbsense::server::AppState;
use thumbsense::work_queue::SweepScheduler;

/// Start the web server with workers and the pending sweep.
pub async fn cmd_serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let workers = runtime.worker_pool().spawn(shutdown_rx.clone());
    let sweeper = SweepScheduler::new(
        Arc::new(runtime.pipeline.clone()),
        settings.sweep_interval(),
    )
    .spawn(shutdown_rx.clone());

    println!(
        "{} Starting thumbsense server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!(
        "  {} workers, sweeping every {} minute(s)",
        settings.worker_config().workers,
        settings.sweep_interval_minutes.max(1)
    );
    println!("  Press Ctrl+C to stop");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
        }
        let _ = shutdown_tx.send(true);
    });

    let state = AppState::new(runtime.pipeline.clone(), settings.app_name.clone());
    let served = thumbsense::server::serve(state, host, port, shutdown_rx).await;

    for handle in workers {
        let _ = handle.await;
    }
    let _ = sweeper.await;

    served
}
