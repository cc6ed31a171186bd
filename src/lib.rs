pub mod admin;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use state::AppState;
