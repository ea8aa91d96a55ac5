//! Startup and shutdown sequence.
//!
//! # Design
//! - Startup order: config, logging, metrics and event bus, download directory, engine
//!   worker, coordinator, front-end.
//! - In `stdio` mode logs go to stderr; stdout carries protocol lines only.
//! - The front-end stops first. Background registrations and deletions are then flushed so
//!   no scheduled deletion is lost on exit.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use torrpeddo_api::{ApiServer, TransferHandles, serve_stdio};
use torrpeddo_config::{AppConfig, FrontendMode, LogStyle};
use torrpeddo_engine::{EngineRuntimeConfig, SessionEngine};
use torrpeddo_events::EventBus;
use torrpeddo_fsops::{DesktopLauncher, ensure_directory};
use torrpeddo_telemetry::{LogFormat, LogTarget, LoggingConfig, Metrics, init_logging};

use crate::cli::Cli;
use crate::coordinator::{Coordinator, CoordinatorSettings};
use crate::error::{AppError, AppResult};

/// Services wired together for one process.
struct Services {
    coordinator: Arc<Coordinator<SessionEngine>>,
    handles: TransferHandles,
    metrics: Metrics,
}

/// Entry point for the Torrpeddo boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, telemetry or directory setup fails, or if the
/// selected front-end stops with an error.
pub async fn run_app() -> AppResult<()> {
    let cli = Cli::parse();
    let config = torrpeddo_config::load().map_err(|err| AppError::config("config.load", err))?;
    let config = match cli.frontend_override() {
        Some(frontend) => config.with_frontend(frontend),
        None => config,
    };
    run_app_with(config).await
}

/// Boot sequence over an already resolved configuration.
///
/// # Errors
///
/// Returns an error if telemetry or directory setup fails, or if the front-end stops with
/// an error.
pub async fn run_app_with(config: AppConfig) -> AppResult<()> {
    init_logging(&logging_config(&config))
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    info!(
        frontend = %config.frontend,
        download_dir = %config.download_dir.display(),
        "Torrpeddo bootstrap starting"
    );

    let services = assemble(&config)?;
    let served = run_frontend(&config, &services).await;

    services.coordinator.shutdown().await;
    served?;
    info!("Torrpeddo shutdown complete");
    Ok(())
}

fn assemble(config: &AppConfig) -> AppResult<Services> {
    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let events = EventBus::new();
    ensure_directory(&config.download_dir)
        .map_err(|err| AppError::fsops("fsops.ensure_directory", err))?;

    let engine = SessionEngine::start(
        events.clone(),
        EngineRuntimeConfig::with_listen_interfaces(&config.listen_interfaces),
    );
    let coordinator = Arc::new(Coordinator::new(
        Arc::new(engine),
        config.download_dir.clone(),
        events,
        metrics.clone(),
        CoordinatorSettings {
            deletion_grace: config.deletion_grace,
            launcher: DesktopLauncher::default(),
        },
    ));
    let handles = TransferHandles::new(coordinator.clone(), coordinator.clone());
    Ok(Services {
        coordinator,
        handles,
        metrics,
    })
}

async fn run_frontend(config: &AppConfig, services: &Services) -> AppResult<()> {
    match config.frontend {
        FrontendMode::Http => {
            info!(addr = %config.http_addr, "Launching API listener");
            ApiServer::new(services.handles.clone(), services.metrics.clone())
                .serve(config.http_addr, shutdown_signal())
                .await
                .map_err(|err| AppError::api_server("api_server.serve", err))
        }
        FrontendMode::Stdio => {
            info!("Serving commands on stdio");
            tokio::select! {
                served = serve_stdio(services.handles.clone()) => {
                    served.map_err(|err| AppError::api_server("bridge.serve", err))
                }
                () = shutdown_signal() => Ok(()),
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; waiting indefinitely");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn logging_config(config: &AppConfig) -> LoggingConfig<'_> {
    LoggingConfig {
        level: &config.log_level,
        format: log_format(config.log_style),
        target: log_target(config.frontend),
        build_sha: &config.build_sha,
    }
}

const fn log_format(style: Option<LogStyle>) -> LogFormat {
    match style {
        Some(LogStyle::Json) => LogFormat::Json,
        Some(LogStyle::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    }
}

const fn log_target(frontend: FrontendMode) -> LogTarget {
    match frontend {
        FrontendMode::Http => LogTarget::Stdout,
        FrontendMode::Stdio => LogTarget::Stderr,
    }
}
