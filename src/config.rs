use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ChangePointError;
use crate::services::changepoint_model::{ModelPriors, PosteriorSampler};
use crate::services::gibbs_sampler::GibbsSampler;
use crate::services::marginal_sampler::MarginalSampler;
use crate::utils::DateParsingConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ChangePointError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ChangePointError::InvalidConfig(format!("{} has invalid value '{}'", key, raw))),
    }
}

/// Locations of the source tables and the summary artifact.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub prices_csv: PathBuf,
    pub events_csv: PathBuf,
    pub summary_csv: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            prices_csv: PathBuf::from("data/raw/brent_raw.csv"),
            events_csv: PathBuf::from("data/events/external_events.csv"),
            summary_csv: PathBuf::from("reports/02_changepoint_summary.csv"),
        }
    }
}

impl DataPaths {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            prices_csv: std::env::var("PRICES_CSV").map(PathBuf::from).unwrap_or(defaults.prices_csv),
            events_csv: std::env::var("EVENTS_CSV").map(PathBuf::from).unwrap_or(defaults.events_csv),
            summary_csv: std::env::var("CHANGEPOINT_SUMMARY_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.summary_csv),
        }
    }
}

/// Settings for the API process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub paths: DataPaths,
    pub dates: DateParsingConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ChangePointError> {
        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:5000"),
            paths: DataPaths::from_env(),
            dates: DateParsingConfig::from_env().map_err(ChangePointError::InvalidConfig)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerMethod {
    Marginal,
    Gibbs,
}

impl FromStr for SamplerMethod {
    type Err = ChangePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "marginal" => Ok(SamplerMethod::Marginal),
            "gibbs" => Ok(SamplerMethod::Gibbs),
            other => Err(ChangePointError::InvalidConfig(format!(
                "SAMPLER_METHOD must be 'marginal' or 'gibbs', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub method: SamplerMethod,
    pub draws: usize,
    pub tune: usize,
    pub chains: usize,
    pub seed: u64,
    pub sigma_grid_points: usize,
    pub rhat_threshold: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            method: SamplerMethod::Marginal,
            draws: 1500,
            tune: 1000,
            chains: 4,
            seed: 42,
            sigma_grid_points: 1200,
            rhat_threshold: 1.01,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), ChangePointError> {
        if self.draws == 0 || self.chains == 0 {
            return Err(ChangePointError::InvalidConfig(
                "SAMPLER_DRAWS and SAMPLER_CHAINS must be positive".to_string(),
            ));
        }
        if self.sigma_grid_points < 2 {
            return Err(ChangePointError::InvalidConfig(
                "SIGMA_GRID_POINTS must be at least 2".to_string(),
            ));
        }
        if !(self.rhat_threshold >= 1.0) {
            return Err(ChangePointError::InvalidConfig(
                "RHAT_THRESHOLD must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of joint draws either sampler returns.
    pub fn total_draws(&self) -> usize {
        self.draws * self.chains
    }

    pub fn build(&self) -> Box<dyn PosteriorSampler> {
        match self.method {
            SamplerMethod::Marginal => Box::new(MarginalSampler {
                draws: self.total_draws(),
                grid_points: self.sigma_grid_points,
                seed: self.seed,
            }),
            SamplerMethod::Gibbs => Box::new(GibbsSampler {
                draws: self.draws,
                tune: self.tune,
                chains: self.chains,
                seed: self.seed,
                rhat_threshold: self.rhat_threshold,
            }),
        }
    }
}

/// Settings for the offline change point job.
#[derive(Debug, Clone)]
pub struct ChangePointConfig {
    pub paths: DataPaths,
    pub dates: DateParsingConfig,
    pub priors: ModelPriors,
    pub sampler: SamplerConfig,
    pub event_window_days: i64,
    pub volatility_window: usize,
}

impl Default for ChangePointConfig {
    fn default() -> Self {
        Self {
            paths: DataPaths::default(),
            dates: DateParsingConfig::default(),
            priors: ModelPriors::default(),
            sampler: SamplerConfig::default(),
            event_window_days: 30,
            volatility_window: 90,
        }
    }
}

impl ChangePointConfig {
    pub fn from_env() -> Result<Self, ChangePointError> {
        let defaults = Self::default();
        let sampler = SamplerConfig {
            method: env_parse("SAMPLER_METHOD", defaults.sampler.method)?,
            draws: env_parse("SAMPLER_DRAWS", defaults.sampler.draws)?,
            tune: env_parse("SAMPLER_TUNE", defaults.sampler.tune)?,
            chains: env_parse("SAMPLER_CHAINS", defaults.sampler.chains)?,
            seed: env_parse("SAMPLER_SEED", defaults.sampler.seed)?,
            sigma_grid_points: env_parse("SIGMA_GRID_POINTS", defaults.sampler.sigma_grid_points)?,
            rhat_threshold: env_parse("RHAT_THRESHOLD", defaults.sampler.rhat_threshold)?,
        };

        let config = Self {
            paths: DataPaths::from_env(),
            dates: DateParsingConfig::from_env().map_err(ChangePointError::InvalidConfig)?,
            priors: defaults.priors,
            sampler,
            event_window_days: env_parse("EVENT_WINDOW_DAYS", defaults.event_window_days)?,
            volatility_window: env_parse("VOLATILITY_WINDOW", defaults.volatility_window)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChangePointError> {
        self.sampler.validate()?;
        if self.event_window_days < 0 {
            return Err(ChangePointError::InvalidConfig(
                "EVENT_WINDOW_DAYS must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
