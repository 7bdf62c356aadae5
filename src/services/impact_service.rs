use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::errors::ChangePointError;
use crate::models::{ChangePointPosterior, ChangePointSummary, EventRecord, PriceSeries};
use crate::services::posterior_stats::mean;

/// Most frequent value; ties go to the smallest index.
pub fn posterior_mode(taus: &[usize]) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &tau in taus {
        *counts.entry(tau).or_default() += 1;
    }
    // BTreeMap iterates in ascending key order, so keep the first maximum
    counts
        .into_iter()
        .fold(None, |best: Option<(usize, usize)>, (tau, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((tau, count)),
        })
        .map(|(tau, _)| tau)
}

pub fn percent_change(before: f64, after: f64) -> f64 {
    (after - before) / before * 100.0
}

/// Events dated within `window_days` (inclusive) of `center`.
pub fn events_near(events: &[EventRecord], center: NaiveDate, window_days: i64) -> Vec<EventRecord> {
    let window = Duration::days(window_days);
    events
        .iter()
        .filter(|e| e.date >= center - window && e.date <= center + window)
        .cloned()
        .collect()
}

/// Reduce posterior draws to the change point estimate and its impact.
pub fn summarize_impact(
    posterior: &ChangePointPosterior,
    series: &PriceSeries,
    events: &[EventRecord],
    window_days: i64,
) -> Result<ChangePointSummary, ChangePointError> {
    let tau_index = posterior_mode(&posterior.taus()).ok_or(ChangePointError::NoDraws)?;
    let tau_date = series
        .date_at(tau_index)
        .ok_or(ChangePointError::TauOutOfRange {
            tau: tau_index,
            len: series.len(),
        })?;

    let mu1: Vec<f64> = posterior.draws.iter().map(|d| d.mu1).collect();
    let mu2: Vec<f64> = posterior.draws.iter().map(|d| d.mu2).collect();
    let mu1_price = mean(&mu1).exp();
    let mu2_price = mean(&mu2).exp();
    let pct_change = percent_change(mu1_price, mu2_price);

    let nearby_events = events_near(events, tau_date, window_days);

    info!(
        "Change point at index {} ({}): mean before ${:.2}, after ${:.2}, change {:.2}%",
        tau_index, tau_date, mu1_price, mu2_price, pct_change
    );
    info!(
        "{} event(s) within ±{} days of {}",
        nearby_events.len(),
        window_days,
        tau_date
    );
    for event in &nearby_events {
        info!("  {} [{}] {}", event.date, event.category, event.title);
    }

    Ok(ChangePointSummary {
        tau_index,
        tau_date,
        mu1_price,
        mu2_price,
        pct_change,
        nearby_events,
    })
}
