pub mod changepoint_model;
pub mod event_service;
pub mod gibbs_sampler;
pub mod impact_service;
pub mod marginal_sampler;
pub mod posterior_stats;
pub mod returns_service;
