pub mod auth;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod server;
pub mod services;
pub mod types;

#[cfg(test)]
pub mod testing;
