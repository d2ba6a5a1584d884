pub mod config;
pub mod daily_job;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod rotator;
pub mod routes;
pub mod state;
pub mod store;
