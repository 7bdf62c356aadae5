use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::SamplerError;
use crate::models::EventRecord;

/// One joint draw of the five latent variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorDraw {
    pub tau: usize,
    pub mu1: f64,
    pub mu2: f64,
    pub sigma1: f64,
    pub sigma2: f64,
}

/// Draws produced by a sampler plus any convergence warnings it raised.
#[derive(Debug, Clone, Default)]
pub struct ChangePointPosterior {
    pub draws: Vec<PosteriorDraw>,
    /// Draws per chain; `draws` holds the chains back to back. Used for R-hat.
    pub chain_lengths: Vec<usize>,
    pub warnings: Vec<SamplerError>,
}

impl ChangePointPosterior {
    pub fn taus(&self) -> Vec<usize> {
        self.draws.iter().map(|d| d.tau).collect()
    }

    /// Named scalar traces in a fixed order.
    pub fn traces(&self) -> Vec<(&'static str, Vec<f64>)> {
        vec![
            ("mu1", self.draws.iter().map(|d| d.mu1).collect()),
            ("mu2", self.draws.iter().map(|d| d.mu2).collect()),
            ("sigma1", self.draws.iter().map(|d| d.sigma1).collect()),
            ("sigma2", self.draws.iter().map(|d| d.sigma2).collect()),
            ("tau", self.draws.iter().map(|d| d.tau as f64).collect()),
        ]
    }
}

/// Point estimates derived from the posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePointSummary {
    pub tau_index: usize,
    pub tau_date: NaiveDate,
    pub mu1_price: f64,
    pub mu2_price: f64,
    pub pct_change: f64,
    pub nearby_events: Vec<EventRecord>,
}

/// Row of the persisted summary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointRecord {
    pub tau_index: usize,
    pub tau_date: NaiveDate,
    pub mu1_price: f64,
    pub mu2_price: f64,
    pub pct_change: f64,
}

impl From<&ChangePointSummary> for ChangePointRecord {
    fn from(summary: &ChangePointSummary) -> Self {
        Self {
            tau_index: summary.tau_index,
            tau_date: summary.tau_date,
            mu1_price: summary.mu1_price,
            mu2_price: summary.mu2_price,
            pct_change: summary.pct_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointDate {
    pub date: NaiveDate,
}

/// Per-parameter posterior statistics (mean, sd, 94% HDI, split R-hat).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    pub hdi_low: f64,
    pub hdi_high: f64,
    pub r_hat: Option<f64>,
}
