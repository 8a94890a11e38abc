use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quakesense_rust::feed::run_feed;
use quakesense_rust::history::shared_history;
use quakesense_rust::notify::PushManager;
use quakesense_rust::pipeline::{run_pipeline, PipelineManager};
use quakesense_rust::settings::Settings;
use quakesense_rust::web::{self, WebState};

#[derive(Parser, Debug)]
#[command(
    name = "quakesense-rust",
    about = "Headless monitor for the QuakeSense realtime earthquake feed"
)]
struct Cli {
    /// Path to a settings file (TOML or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print the effective settings in the given format (toml/yaml) and exit
    #[arg(long, value_name = "FORMAT")]
    dump_settings: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let settings = match Settings::new(cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(format) = cli.dump_settings {
        match settings.dump(&format) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                tracing::error!("Failed to dump settings: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let history = shared_history(settings.alert.history_capacity);
    let web_state = WebState::new(history.clone(), settings.settings.station.clone());

    // API server for the latest-reading and history views
    if settings.web.enabled {
        let app_state = web_state.clone();
        let bind = settings.web.bind.clone();
        tokio::spawn(async move {
            let router = web::routes::create_router(app_state).await;
            let listener = match tokio::net::TcpListener::bind(&bind).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Web server bind failed on {}: {}", bind, e);
                    return;
                }
            };
            tracing::info!("Web API listening on {}", listener.local_addr().unwrap());
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });
    }

    // Channel from feed subscription to pipeline (full snapshots)
    let (snap_tx, snap_rx) = mpsc::channel(100);
    let cancel = CancellationToken::new();

    tracing::info!(
        "Starting quakesense-rust, feed path '{}'",
        settings.feed.path
    );
    let feed_settings = settings.feed.clone();
    let feed_cancel = cancel.clone();
    tokio::spawn(async move {
        run_feed(feed_settings, snap_tx, feed_cancel).await;
    });

    let push = PushManager::from_settings(&settings);
    tracing::info!("Push providers configured: {}", push.provider_count());

    let manager = PipelineManager::new(history, push, settings.alert.enabled, web_state);
    let pipeline_handle = tokio::spawn(async move {
        run_pipeline(snap_rx, manager).await;
    });

    shutdown_signal().await;
    cancel.cancel();
    // Feed task exits on cancel and drops its sender, which ends the pipeline
    let _ = pipeline_handle.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
