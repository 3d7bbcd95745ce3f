use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::sync::watch;

use listing_monitor::api::{self, ApiState};
use listing_monitor::bootstrap::build_monitor;
use listing_monitor::cli::Cli;
use listing_monitor::config::Config;
use listing_monitor::error::AppError;
use listing_monitor::logging::init_logging;
use listing_monitor::metrics::AppMetrics;
use listing_monitor::scheduler::run_monitor_loop;
use listing_monitor::store::MonitorStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging("info");

    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()?.with_cli(&cli);
    tracing::info!("Service started with config: {:?}", config);

    let metrics = Arc::new(AppMetrics::new()?);
    let store = MonitorStore::shared(config.check_interval());
    let monitor = Arc::new(build_monitor(&config, store.clone(), metrics.clone()));

    if cli.once {
        let report = monitor.run_cycle().await;
        tracing::info!(?report, "Single check finished");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let monitor_handle = tokio::spawn(run_monitor_loop(
        monitor,
        store.clone(),
        config.check_interval(),
        shutdown_rx.clone(),
    ));

    let app = api::router(ApiState { store, metrics });
    let server_handle = tokio::spawn(async move {
        if let Err(err) = serve_status(app, config.port, shutdown_rx).await {
            tracing::error!(error = %err, "Status server stopped; monitoring continues");
        }
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl+C received, shutting down"),
        Err(err) => tracing::error!(error = %err, "Failed to listen for Ctrl+C, shutting down"),
    }
    let _ = shutdown_tx.send(true);

    if let Err(err) = server_handle.await {
        tracing::error!(error = %err, "Status server task failed");
    }
    if let Err(err) = monitor_handle.await {
        tracing::error!(error = %err, "Monitor task failed");
    }

    Ok(())
}

async fn serve_status(
    app: Router,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!("Status server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    Ok(())
}
