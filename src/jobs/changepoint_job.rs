use tracing::{error, info};

use crate::config::ChangePointConfig;
use crate::errors::ChangePointError;
use crate::models::{ChangePointRecord, ChangePointSummary};
use crate::services::changepoint_model::ChangePointModel;
use crate::services::returns_service::{rolling_volatility, ReturnSeries};
use crate::services::{impact_service, posterior_stats};
use crate::store::{change_point_store, event_store, price_store};

/// Load, fit, summarise and persist. Any error here aborts the run; sampler
/// warnings are logged and do not.
pub fn run_changepoint_job(config: &ChangePointConfig) -> Result<ChangePointSummary, ChangePointError> {
    info!("🧠 Starting change point job");
    let start_time = std::time::Instant::now();

    match fit_and_persist(config) {
        Ok(summary) => {
            info!(
                "✅ Change point job completed in {:.2}s",
                start_time.elapsed().as_secs_f64()
            );
            Ok(summary)
        }
        Err(e) => {
            error!("❌ Change point job failed: {}", e);
            Err(e)
        }
    }
}

fn fit_and_persist(config: &ChangePointConfig) -> Result<ChangePointSummary, ChangePointError> {
    let series = price_store::load_prices(&config.paths.prices_csv, &config.dates)?;
    let events = event_store::load_events(&config.paths.events_csv, &config.dates)?;

    let returns = ReturnSeries::from_prices(&series)?;
    log_volatility(&returns, config.volatility_window);

    let model = ChangePointModel::new(&returns.log_prices, config.priors)?;
    let sampler = config.sampler.build();
    info!(
        "Fitting single change point model on {} log-prices with the {} sampler",
        model.len(),
        sampler.name()
    );
    let posterior = sampler.sample(&model)?;
    if !posterior.warnings.is_empty() {
        info!(
            "Sampler raised {} warning(s); summarising the draws anyway",
            posterior.warnings.len()
        );
    }

    for s in posterior_stats::summarize(&posterior) {
        info!(
            "{:>7} mean={:.3} sd={:.3} hdi_3%={:.3} hdi_97%={:.3} r_hat={}",
            s.name,
            s.mean,
            s.sd,
            s.hdi_low,
            s.hdi_high,
            s.r_hat.map(|r| format!("{:.3}", r)).unwrap_or_else(|| "n/a".to_string())
        );
    }

    let summary =
        impact_service::summarize_impact(&posterior, &series, &events, config.event_window_days)?;
    change_point_store::write_summary(
        &config.paths.summary_csv,
        &[ChangePointRecord::from(&summary)],
    )?;

    Ok(summary)
}

fn log_volatility(returns: &ReturnSeries, window: usize) {
    let vol = rolling_volatility(&returns.log_returns, window);
    let defined: Vec<f64> = vol.iter().flatten().copied().collect();
    match (defined.last(), defined.iter().copied().reduce(f64::max)) {
        (Some(latest), Some(peak)) => info!(
            "{}-day rolling volatility of log returns: latest {:.4}, peak {:.4}",
            window, latest, peak
        ),
        _ => info!("Series too short for a {}-day rolling volatility", window),
    }
}
