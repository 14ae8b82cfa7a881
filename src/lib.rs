pub mod app;
pub mod auth;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod payload;
pub mod server;
