//! Single change-point model over a log-price series.
//!
//! ```text
//! tau    ~ DiscreteUniform{0, ..., N-2}
//! mu_k   ~ Normal(mean(y), mu_prior_sd)
//! sigma_k ~ HalfNormal(sigma_prior_scale)
//! y_i    ~ Normal(mu_k, sigma_k),  k = 1 if i <= tau else 2
//! ```
//!
//! Capping tau at N-2 keeps the second regime non-empty.
//!
//! Sufficient statistics are kept as prefix sums over the series centred
//! on its mean, so any segment's likelihood is O(1) to evaluate.

use std::f64::consts::LN_2;

use rand::Rng;
use statrs::consts::LN_SQRT_2PI;
use statrs::distribution::{Continuous, Normal};

use crate::errors::ChangePointError;
use crate::models::ChangePointPosterior;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPriors {
    pub mu_prior_sd: f64,
    pub sigma_prior_scale: f64,
}

impl Default for ModelPriors {
    fn default() -> Self {
        Self {
            mu_prior_sd: 2.0,
            sigma_prior_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    Before,
    After,
}

/// Count, sum and sum of squares of one regime, in centred coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStats {
    pub n: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl SegmentStats {
    /// Sum of squared deviations from a centred mean `m`.
    fn sse_about(&self, m: f64) -> f64 {
        let n = self.n as f64;
        (self.sum_sq - 2.0 * m * self.sum + n * m * m).max(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct ChangePointModel {
    center: f64,
    priors: ModelPriors,
    // Normal(0, scale); folded at zero for the HalfNormal
    sigma_prior: Normal,
    prefix_sum: Vec<f64>,
    prefix_sq: Vec<f64>,
}

impl ChangePointModel {
    pub fn new(log_prices: &[f64], priors: ModelPriors) -> Result<Self, ChangePointError> {
        if log_prices.len() < 2 {
            return Err(ChangePointError::InsufficientData {
                needed: 2,
                got: log_prices.len(),
            });
        }
        if log_prices.iter().any(|y| !y.is_finite()) {
            return Err(ChangePointError::InvalidConfig(
                "log-price series contains non-finite values".to_string(),
            ));
        }
        if !(priors.mu_prior_sd > 0.0 && priors.sigma_prior_scale > 0.0) {
            return Err(ChangePointError::InvalidConfig(
                "prior scales must be positive".to_string(),
            ));
        }
        let sigma_prior = Normal::new(0.0, priors.sigma_prior_scale)
            .map_err(|e| ChangePointError::InvalidConfig(format!("sigma prior: {}", e)))?;

        let center = log_prices.iter().sum::<f64>() / log_prices.len() as f64;
        let mut prefix_sum = Vec::with_capacity(log_prices.len() + 1);
        let mut prefix_sq = Vec::with_capacity(log_prices.len() + 1);
        prefix_sum.push(0.0);
        prefix_sq.push(0.0);
        let (mut s, mut q) = (0.0, 0.0);
        for y in log_prices {
            let c = y - center;
            s += c;
            q += c * c;
            prefix_sum.push(s);
            prefix_sq.push(q);
        }

        Ok(Self {
            center,
            priors,
            sigma_prior,
            prefix_sum,
            prefix_sq,
        })
    }

    pub fn len(&self) -> usize {
        self.prefix_sum.len() - 1
    }

    /// Number of admissible break indices, `0..=N-2`.
    pub fn tau_count(&self) -> usize {
        self.len() - 1
    }

    /// Prior mean of both regime means, i.e. the sample mean of the series.
    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn priors(&self) -> ModelPriors {
        self.priors
    }

    /// Sample standard deviation of the whole series.
    pub fn overall_sd(&self) -> f64 {
        let n = self.len() as f64;
        (self.prefix_sq[self.len()] / (n - 1.0).max(1.0)).sqrt()
    }

    pub fn segment(&self, tau: usize, regime: Regime) -> SegmentStats {
        let (lo, hi) = match regime {
            Regime::Before => (0, tau + 1),
            Regime::After => (tau + 1, self.len()),
        };
        SegmentStats {
            n: hi - lo,
            sum: self.prefix_sum[hi] - self.prefix_sum[lo],
            sum_sq: self.prefix_sq[hi] - self.prefix_sq[lo],
        }
    }

    /// Gaussian log-likelihood of a segment for mean `mu` (original scale).
    pub fn log_likelihood(&self, stats: &SegmentStats, mu: f64, sigma: f64) -> f64 {
        let n = stats.n as f64;
        let sse = stats.sse_about(mu - self.center);
        -n * (sigma.ln() + LN_SQRT_2PI) - sse / (2.0 * sigma * sigma)
    }

    /// HalfNormal log-density of a regime standard deviation.
    pub fn log_sigma_prior(&self, sigma: f64) -> f64 {
        if sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        LN_2 + self.sigma_prior.ln_pdf(sigma)
    }

    /// Normal conditional of a regime mean given its sigma: `(mean, sd)` on
    /// the original scale.
    pub fn mu_conditional(&self, stats: &SegmentStats, sigma: f64) -> (f64, f64) {
        let prior_prec = 1.0 / self.priors.mu_prior_sd.powi(2);
        let data_prec = stats.n as f64 / (sigma * sigma);
        let post_prec = prior_prec + data_prec;
        // prior mean is zero in centred coordinates
        let post_mean = (stats.sum / (sigma * sigma)) / post_prec;
        (post_mean + self.center, post_prec.recip().sqrt())
    }

    /// Log marginal likelihood of a segment with its mean integrated out.
    pub fn log_marginal_given_sigma(&self, stats: &SegmentStats, sigma: f64) -> f64 {
        let n = stats.n as f64;
        let s2 = sigma * sigma;
        let t2 = self.priors.mu_prior_sd.powi(2);
        let log_det = n * s2.ln() + (1.0 + n * t2 / s2).ln();
        let quad = (stats.sum_sq - t2 * stats.sum * stats.sum / (s2 + n * t2)) / s2;
        -n * LN_SQRT_2PI - 0.5 * (log_det + quad)
    }

    /// Unnormalised log full conditional of tau for every admissible index.
    pub fn tau_log_conditional(&self, mu1: f64, mu2: f64, sigma1: f64, sigma2: f64) -> Vec<f64> {
        (0..self.tau_count())
            .map(|tau| {
                self.log_likelihood(&self.segment(tau, Regime::Before), mu1, sigma1)
                    + self.log_likelihood(&self.segment(tau, Regime::After), mu2, sigma2)
            })
            .collect()
    }
}

/// Posterior draw generator.
pub trait PosteriorSampler {
    fn name(&self) -> &'static str;

    fn sample(&self, model: &ChangePointModel) -> Result<ChangePointPosterior, ChangePointError>;
}

/// Draw an index with probability proportional to `exp(log_weights[i])`.
pub fn sample_log_weights<R: Rng>(log_weights: &[f64], rng: &mut R) -> usize {
    let cdf = cumulative_weights(log_weights);
    sample_cdf(&cdf, rng)
}

/// Normalised cumulative weights for repeated draws from the same
/// distribution.
pub fn cumulative_weights(log_weights: &[f64]) -> Vec<f64> {
    let max = log_weights
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mut acc = 0.0;
    let mut cdf: Vec<f64> = log_weights
        .iter()
        .map(|w| {
            acc += (w - max).exp();
            acc
        })
        .collect();
    if acc > 0.0 && acc.is_finite() {
        for c in &mut cdf {
            *c /= acc;
        }
    }
    cdf
}

pub fn sample_cdf<R: Rng>(cdf: &[f64], rng: &mut R) -> usize {
    let total = cdf.last().copied().unwrap_or(0.0);
    if !(total > 0.0) {
        return rng.random_range(0..cdf.len().max(1));
    }
    let u = rng.random::<f64>() * total;
    cdf.partition_point(|&c| c <= u).min(cdf.len() - 1)
}

/// `ln(sum(exp(xs)))` without overflow.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(y: &[f64]) -> ChangePointModel {
        ChangePointModel::new(y, ModelPriors::default()).unwrap()
    }

    #[test]
    fn test_rejects_short_series() {
        let result = ChangePointModel::new(&[1.0], ModelPriors::default());
        assert!(matches!(
            result,
            Err(ChangePointError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn test_segments_partition_the_series() {
        let m = model(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(m.tau_count(), 4);
        for tau in 0..m.tau_count() {
            let before = m.segment(tau, Regime::Before);
            let after = m.segment(tau, Regime::After);
            assert_eq!(before.n, tau + 1);
            assert!(after.n >= 1);
            assert_eq!(before.n + after.n, 5);
            // centred sums cancel over the full series
            assert!((before.sum + after.sum).abs() < 1e-12);
        }
    }

    #[test]
    fn test_log_likelihood_matches_direct_sum() {
        let y = [3.1, 2.9, 3.4, 4.0, 4.2, 3.8];
        let m = model(&y);
        let (mu, sigma) = (3.5f64, 0.4f64);
        let stats = m.segment(2, Regime::Before);
        let density = Normal::new(mu, sigma).unwrap();
        let direct: f64 = y[..3].iter().map(|v| density.ln_pdf(*v)).sum();
        assert!((m.log_likelihood(&stats, mu, sigma) - direct).abs() < 1e-10);
    }

    #[test]
    fn test_marginal_matches_numeric_integration_over_mu() {
        let y = [3.1, 2.9, 3.4, 4.0];
        let m = model(&y);
        let sigma = 0.3;
        let stats = m.segment(1, Regime::Before);

        let mu_prior = Normal::new(m.center(), m.priors().mu_prior_sd).unwrap();
        let h = 1e-3;
        let terms: Vec<f64> = (-20_000..=20_000)
            .map(|k| {
                let mu = m.center() + k as f64 * h;
                m.log_likelihood(&stats, mu, sigma) + mu_prior.ln_pdf(mu) + h.ln()
            })
            .collect();

        let numeric = log_sum_exp(&terms);
        let exact = m.log_marginal_given_sigma(&stats, sigma);
        assert!((numeric - exact).abs() < 1e-6, "numeric {} vs exact {}", numeric, exact);
    }

    #[test]
    fn test_sigma_prior_is_folded_normal() {
        let m = model(&[1.0, 2.0, 3.0]);
        let scale = m.priors().sigma_prior_scale;
        for sigma in [0.05, 0.5, 1.0, 2.5] {
            let density = 2.0 * (-sigma * sigma / (2.0 * scale * scale)).exp()
                / (scale * (2.0 * std::f64::consts::PI).sqrt());
            assert!((m.log_sigma_prior(sigma) - density.ln()).abs() < 1e-12);
        }
        assert_eq!(m.log_sigma_prior(0.0), f64::NEG_INFINITY);
        assert_eq!(m.log_sigma_prior(-1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_mu_conditional_shrinks_toward_data() {
        let y = [10.0, 10.0, 10.0, 0.0, 0.0, 0.0];
        let m = model(&y);
        let (mean, sd) = m.mu_conditional(&m.segment(2, Regime::Before), 0.01);
        assert!((mean - 10.0).abs() < 1e-3);
        assert!(sd < 0.01);
    }

    #[test]
    fn test_sample_log_weights_prefers_heavy_index() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = [-50.0, 0.0, -50.0];
        for _ in 0..100 {
            assert_eq!(sample_log_weights(&weights, &mut rng), 1);
        }
    }

    #[test]
    fn test_log_sum_exp_is_stable() {
        let value = log_sum_exp(&[1000.0, 1000.0]);
        assert!((value - (1000.0 + LN_2)).abs() < 1e-12);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
    }
}
