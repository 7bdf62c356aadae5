use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use thiserror::Error;

/// Failures while loading or deriving the tabular inputs.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Source file not found: {0}")]
    MissingFile(PathBuf),
    #[error("No usable rows in {0}")]
    Empty(PathBuf),
    #[error("Non-positive price {price} on {date}; log-price undefined")]
    NonPositivePrice { date: NaiveDate, price: f64 },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single malformed row. Never fatal: the loader drops the row and moves on.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unparseable date '{0}'")]
    Date(String),
    #[error("non-numeric price '{0}'")]
    Price(String),
}

/// Sampler health problems. Surfaced as warnings; the draws are still used.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SamplerError {
    #[error("R-hat for {param} is {r_hat:.3} (threshold {threshold:.3}); chains may not have converged")]
    HighRHat {
        param: String,
        r_hat: f64,
        threshold: f64,
    },
    #[error("Acceptance rate for {param} is {rate:.2}; proposal scale may be off")]
    LowAcceptance { param: String, rate: f64 },
}

#[derive(Debug, Error)]
pub enum ChangePointError {
    #[error("Need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("Posterior has no draws")]
    NoDraws,
    #[error("Change point index {tau} outside series of length {len}")]
    TauOutOfRange { tau: usize, len: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}
