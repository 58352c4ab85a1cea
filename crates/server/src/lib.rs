pub mod api;
pub mod config;
pub mod dashboard;
pub mod event_bus;
pub mod persistence;
