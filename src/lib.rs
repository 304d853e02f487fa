pub mod app;
pub mod auth;
pub mod config;
pub mod dates;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod handlers;
pub mod models;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use extract::{extract_metrics, Extraction};
pub use state::AppState;
