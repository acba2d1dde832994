pub mod config;
pub mod handlers;
pub mod logger;
pub mod stats;
