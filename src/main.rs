/// Entry point for the Creo Dashboard.
///
/// Reads the configuration from the environment, sets up logging and serves
/// the dashboard for the containers of the configured runtime socket.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server cannot run.
///
/// # Examples
///
/// ```bash
/// PORT=8080 LOGS_SHOW=true CONTAINER_RESTART=false cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = creo_dashboard::config::Config::from_env()?;

    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    creo_dashboard::run(config).await
}
