pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod shutdown;
pub mod state;
pub mod views;

pub use app::{build_registry, create_router};
pub use config::AppConfig;
pub use state::AppState;
