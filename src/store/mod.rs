pub mod change_point_store;
pub mod event_store;
pub mod price_store;
