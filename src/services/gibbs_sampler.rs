//! Metropolis-within-Gibbs over `(tau, mu1, mu2, sigma1, sigma2)`.
//!
//! Each sweep draws tau from its exact full conditional, each mu from its
//! conjugate normal conditional, and each log-sigma with a random-walk
//! Metropolis step whose scale adapts during warmup only.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, info, warn};

use crate::errors::{ChangePointError, SamplerError};
use crate::models::{ChangePointPosterior, PosteriorDraw};
use crate::services::changepoint_model::{
    sample_log_weights, ChangePointModel, PosteriorSampler, Regime,
};
use crate::services::posterior_stats;

const TARGET_ACCEPTANCE: f64 = 0.44;
const ADAPT_WINDOW: usize = 50;
const MIN_ACCEPTANCE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct GibbsSampler {
    pub draws: usize,
    pub tune: usize,
    pub chains: usize,
    pub seed: u64,
    pub rhat_threshold: f64,
}

#[derive(Debug, Clone, Copy)]
struct ChainState {
    tau: usize,
    mu: [f64; 2],
    sigma: [f64; 2],
}

/// Random-walk proposal scale and acceptance bookkeeping for one log-sigma.
#[derive(Debug, Clone, Copy)]
struct Proposal {
    step: f64,
    accepted: usize,
    proposed: usize,
}

impl Proposal {
    fn rate(&self) -> f64 {
        if self.proposed == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.proposed as f64
    }

    fn adapt(&mut self) {
        if self.rate() > TARGET_ACCEPTANCE {
            self.step *= 1.2;
        } else {
            self.step /= 1.2;
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.accepted = 0;
        self.proposed = 0;
    }
}

const REGIMES: [Regime; 2] = [Regime::Before, Regime::After];

struct ChainRun {
    draws: Vec<PosteriorDraw>,
    acceptance: [f64; 2],
}

impl GibbsSampler {
    fn run_chain(&self, model: &ChangePointModel, chain: usize) -> ChainRun {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(chain as u64));

        // dispersed starting points so R-hat can detect stuck chains
        let sd = model.overall_sd().max(1e-3);
        let z1: f64 = rng.sample(StandardNormal);
        let z2: f64 = rng.sample(StandardNormal);
        let mut state = ChainState {
            tau: rng.random_range(0..model.tau_count()),
            mu: [model.center() + sd * z1, model.center() + sd * z2],
            sigma: [sd, sd],
        };
        let mut proposals = [Proposal {
            step: 0.5,
            accepted: 0,
            proposed: 0,
        }; 2];

        let mut draws = Vec::with_capacity(self.draws);
        for iteration in 0..self.tune + self.draws {
            self.sweep(model, &mut state, &mut proposals, &mut rng);

            if iteration < self.tune {
                if (iteration + 1) % ADAPT_WINDOW == 0 {
                    proposals.iter_mut().for_each(Proposal::adapt);
                }
                if iteration + 1 == self.tune {
                    proposals.iter_mut().for_each(Proposal::reset);
                }
                continue;
            }

            draws.push(PosteriorDraw {
                tau: state.tau,
                mu1: state.mu[0],
                mu2: state.mu[1],
                sigma1: state.sigma[0],
                sigma2: state.sigma[1],
            });
        }

        debug!(
            "Chain {} finished: sigma steps {:.4}/{:.4}, acceptance {:.2}/{:.2}",
            chain,
            proposals[0].step,
            proposals[1].step,
            proposals[0].rate(),
            proposals[1].rate()
        );

        ChainRun {
            draws,
            acceptance: [proposals[0].rate(), proposals[1].rate()],
        }
    }

    fn sweep(
        &self,
        model: &ChangePointModel,
        state: &mut ChainState,
        proposals: &mut [Proposal; 2],
        rng: &mut StdRng,
    ) {
        let log_cond =
            model.tau_log_conditional(state.mu[0], state.mu[1], state.sigma[0], state.sigma[1]);
        state.tau = sample_log_weights(&log_cond, rng);

        for (k, regime) in REGIMES.iter().enumerate() {
            let stats = model.segment(state.tau, *regime);

            let (mean, sd) = model.mu_conditional(&stats, state.sigma[k]);
            let z: f64 = rng.sample(StandardNormal);
            state.mu[k] = mean + sd * z;

            let log_target = |u: f64| {
                let sigma = u.exp();
                model.log_likelihood(&stats, state.mu[k], sigma) + model.log_sigma_prior(sigma) + u
            };
            let current = state.sigma[k].ln();
            let z: f64 = rng.sample(StandardNormal);
            let candidate = current + proposals[k].step * z;
            let log_ratio = log_target(candidate) - log_target(current);

            proposals[k].proposed += 1;
            if log_ratio >= 0.0 || rng.random::<f64>().ln() < log_ratio {
                state.sigma[k] = candidate.exp();
                proposals[k].accepted += 1;
            }
        }
    }
}

fn acceptance_warnings(chain: usize, acceptance: &[f64; 2]) -> Vec<SamplerError> {
    acceptance
        .iter()
        .enumerate()
        .filter(|(_, rate)| **rate < MIN_ACCEPTANCE)
        .map(|(k, rate)| SamplerError::LowAcceptance {
            param: format!("sigma{} (chain {})", k + 1, chain),
            rate: *rate,
        })
        .collect()
}

impl PosteriorSampler for GibbsSampler {
    fn name(&self) -> &'static str {
        "gibbs"
    }

    fn sample(&self, model: &ChangePointModel) -> Result<ChangePointPosterior, ChangePointError> {
        if self.chains == 0 || self.draws == 0 {
            return Err(ChangePointError::InvalidConfig(
                "gibbs sampler needs at least one chain and one draw".to_string(),
            ));
        }

        info!(
            "Running {} Gibbs chain(s): {} warmup + {} draws each",
            self.chains, self.tune, self.draws
        );

        let mut posterior = ChangePointPosterior::default();
        for chain in 0..self.chains {
            let run = self.run_chain(model, chain);
            posterior
                .warnings
                .extend(acceptance_warnings(chain, &run.acceptance));
            posterior.chain_lengths.push(run.draws.len());
            posterior.draws.extend(run.draws);
        }

        let summaries = posterior_stats::summarize(&posterior);
        posterior
            .warnings
            .extend(posterior_stats::r_hat_warnings(&summaries, self.rhat_threshold));

        for warning in &posterior.warnings {
            warn!("{}", warning);
        }

        Ok(posterior)
    }
}
