//! HTTP API handlers for aqua-insights

pub mod health;
pub mod results;
pub mod session;
pub mod sse;

pub use health::health_routes;
pub use results::result_routes;
pub use session::session_routes;
pub use sse::event_routes;
