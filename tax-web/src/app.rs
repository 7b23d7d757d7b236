use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tax_core::db::RepositoryRegistry;
use tax_db_memory::MemoryRepositoryFactory;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Registry with every store backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// All routes, with static files served from `static_dir` under `/static`.
pub fn create_router(
    state: Arc<AppState>,
    static_dir: &Path,
) -> Router {
    Router::new()
        .route("/", get(handlers::show_form))
        .route(
            "/tax-calculator",
            post(handlers::calculate).get(handlers::redirect_to_form),
        )
        .route("/tax/:id", get(handlers::show_result))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_ships_memory_backend() {
        assert_eq!(build_registry().available_backends(), vec!["memory"]);
    }
}
