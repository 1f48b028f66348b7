// src/lib.rs
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod orchestrator;
pub mod provider;
pub mod signals;
pub mod snapshot;
pub mod types;
pub mod universe;
