use std::process::ExitCode;

use brent_backend::config::ChangePointConfig;
use brent_backend::jobs::changepoint_job::run_changepoint_job;
use brent_backend::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(LoggingConfig::from_env("brent-changepoint")) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match ChangePointConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // CPU-bound; keep it off the runtime threads the Loki exporter uses
    let result = tokio::task::spawn_blocking(move || run_changepoint_job(&config)).await;

    match result {
        Ok(Ok(summary)) => {
            tracing::info!(
                "Most likely change point: index={}, date={}, change={:.2}%",
                summary.tau_index,
                summary.tau_date,
                summary.pct_change
            );
            ExitCode::SUCCESS
        }
        // already logged by the job
        Ok(Err(_)) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("Change point job panicked: {}", e);
            ExitCode::FAILURE
        }
    }
}
