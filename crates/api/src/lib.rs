//! HTTP layer for blog-rs.
//!
//! - **Endpoints**: public pages, AJAX endpoints and the `/admin` back office
//! - **Extractors**: client address, admin token, JSON/query bodies with uniform errors
//! - **Middleware**: shared application state
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
