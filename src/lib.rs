pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod models;
pub mod utils;
