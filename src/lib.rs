pub mod allocation;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod output;
pub mod routes;
pub mod session;
