pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod openapi;
pub mod repo;
pub mod routes;
pub mod seed;
pub mod stats;
pub mod storage; // uploaded file bytes
pub mod validate;

// Re-export commonly used items for tests / external users
pub use config::AppConfig;
pub use routes::{config as configure_routes, AppState};
