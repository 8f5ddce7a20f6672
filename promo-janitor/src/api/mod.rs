//! HTTP API handlers for promo-janitor

pub mod auth;
pub mod cleanup;
pub mod health;

pub use auth::secret_middleware;
pub use cleanup::trigger_cleanup;
pub use health::health_routes;
