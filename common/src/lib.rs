// Common library for shared code across the worker and API

pub mod config;
pub mod connector;
pub mod db;
pub mod errors;
pub mod messages;
pub mod models;
pub mod properties;
pub mod store;
pub mod telemetry;
pub mod validation;
