//! Offline jobs run outside the API process.
//!
//! - `changepoint_job` - fits the change point model over the price history
//!   and writes the summary artifact the API serves.

pub mod changepoint_job;
