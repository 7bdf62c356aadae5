use crate::errors::DataError;
use crate::models::PriceSeries;

/// Log-price view of a price series.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub log_prices: Vec<f64>,
    /// `None` at index 0, where no previous price exists.
    pub log_returns: Vec<Option<f64>>,
}

impl ReturnSeries {
    /// Fails on the first non-positive price instead of producing NaN.
    pub fn from_prices(series: &PriceSeries) -> Result<Self, DataError> {
        let mut log_prices = Vec::with_capacity(series.len());
        for point in series.points() {
            if point.price <= 0.0 {
                return Err(DataError::NonPositivePrice {
                    date: point.date,
                    price: point.price,
                });
            }
            log_prices.push(point.price.ln());
        }

        let log_returns = std::iter::once(None)
            .chain(log_prices.windows(2).map(|w| Some(w[1] - w[0])))
            .take(log_prices.len())
            .collect();

        Ok(Self {
            log_prices,
            log_returns,
        })
    }

    /// Returns with the undefined first entry removed.
    pub fn defined_returns(&self) -> Vec<f64> {
        self.log_returns.iter().flatten().copied().collect()
    }
}

/// Trailing sample standard deviation of log returns over `window` defined
/// values. Output is aligned with the input; positions without a full window
/// are `None`.
pub fn rolling_volatility(log_returns: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; log_returns.len()];
    if window < 2 {
        return result;
    }

    for i in 0..log_returns.len() {
        if i + 1 < window {
            continue;
        }
        let slice = &log_returns[i + 1 - window..=i];
        if slice.iter().any(Option::is_none) {
            continue;
        }
        let values: Vec<f64> = slice.iter().flatten().copied().collect();
        let mean = values.iter().sum::<f64>() / window as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        result[i] = Some(var.sqrt());
    }

    result
}
