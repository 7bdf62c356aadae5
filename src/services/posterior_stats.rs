use crate::errors::SamplerError;
use crate::models::{ChangePointPosterior, ParameterSummary};

pub const HDI_PROB: f64 = 0.94;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Narrowest interval containing `prob` of the draws.
pub fn hdi(values: &[f64], prob: f64) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let included = ((prob * n as f64).floor() as usize).min(n - 1);
    let excluded = n - included;

    (0..excluded)
        .map(|i| (sorted[i], sorted[i + included]))
        .min_by(|a, b| (a.1 - a.0).total_cmp(&(b.1 - b.0)))
        .unwrap_or((sorted[0], sorted[n - 1]))
}

/// Split R-hat (Gelman-Rubin on half-chains). `chain_lengths` describes how
/// `values` is laid out chain after chain. `None` when any half-chain has
/// fewer than 2 draws.
pub fn split_r_hat(values: &[f64], chain_lengths: &[usize]) -> Option<f64> {
    let mut halves: Vec<&[f64]> = Vec::with_capacity(chain_lengths.len() * 2);
    let mut offset = 0;
    for &len in chain_lengths {
        let chain = values.get(offset..offset + len)?;
        let half = len / 2;
        // odd-length chains drop their first draw
        let chain = &chain[len - 2 * half..];
        halves.push(&chain[..half]);
        halves.push(&chain[half..]);
        offset += len;
    }

    let n = halves.iter().map(|h| h.len()).min()?;
    if n < 2 {
        return None;
    }
    let halves: Vec<&[f64]> = halves.into_iter().map(|h| &h[..n]).collect();

    let means: Vec<f64> = halves.iter().map(|h| mean(h)).collect();
    let within = mean(&halves.iter().map(|h| std_dev(h).powi(2)).collect::<Vec<_>>());
    let between = n as f64 * std_dev(&means).powi(2);

    if within == 0.0 {
        return Some(if between == 0.0 { 1.0 } else { f64::INFINITY });
    }
    let n = n as f64;
    let var_hat = (n - 1.0) / n * within + between / n;
    Some((var_hat / within).sqrt())
}

/// Mean, sd, 94% HDI and split R-hat for each latent variable.
pub fn summarize(posterior: &ChangePointPosterior) -> Vec<ParameterSummary> {
    posterior
        .traces()
        .into_iter()
        .map(|(name, values)| {
            let (hdi_low, hdi_high) = hdi(&values, HDI_PROB);
            ParameterSummary {
                name: name.to_string(),
                mean: mean(&values),
                sd: std_dev(&values),
                hdi_low,
                hdi_high,
                r_hat: split_r_hat(&values, &posterior.chain_lengths),
            }
        })
        .collect()
}

pub fn r_hat_warnings(summaries: &[ParameterSummary], threshold: f64) -> Vec<SamplerError> {
    summaries
        .iter()
        .filter_map(|s| match s.r_hat {
            Some(r_hat) if !(r_hat <= threshold) => Some(SamplerError::HighRHat {
                param: s.name.clone(),
                r_hat,
                threshold,
            }),
            _ => None,
        })
        .collect()
}
