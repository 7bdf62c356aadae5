pub mod changepoints;
pub mod events;
pub mod health;
pub mod prices;
