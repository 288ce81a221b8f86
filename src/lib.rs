/// Creo Dashboard: a live web dashboard for the containers of one host.
///
/// The library talks to a Docker-Engine-compatible runtime over its Unix
/// socket, turns the container list into enriched, grouped snapshots and
/// serves them together with host metrics, container stats, log streams and
/// restart actions over REST and WebSocket endpoints.
use std::sync::Arc;

pub mod action;
pub mod api;
pub mod broadcast;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod fanout;
pub mod grouping;
pub mod hostinfo;
pub mod logs;
pub mod runtime;
pub mod snapshot;
pub mod stats;

use config::{Config, FeatureFlags};

/// Runs the dashboard server until it fails.
///
/// One runtime client is created for the whole process and shared by every
/// connection. Feature flags are read from the environment on each request.
///
/// # Errors
///
/// Returns an error if the listening socket cannot be bound or the server
/// stops with an I/O error.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("configuration: {config:?}");

    let runtime = runtime::RuntimeClient::shared(&config.docker_socket);
    let fanout = fanout::FanOut::new(config.enrich_workers);
    let state = api::AppState::new(
        runtime,
        discovery::Enricher::new(
            config.label_policy.clone(),
            config.commit_label.as_str(),
            fanout,
        ),
        stats::Sampler::new(fanout),
        Arc::new(hostinfo::SysinfoProvider::new()),
        FeatureFlags::Env,
    );

    let static_dir = if config.static_dir.is_dir() {
        Some(config.static_dir.as_path())
    } else {
        log::warn!(
            "static directory `{}` not found, serving the API only",
            config.static_dir.display()
        );
        None
    };

    api::APIServer::new(state, static_dir)
        .listen(("0.0.0.0", config.port))
        .await?;
    Ok(())
}
