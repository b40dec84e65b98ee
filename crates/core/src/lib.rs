//! Core business logic for blog-rs.
//!
//! - [`metrics`]: reading time, engagement ratio and excerpts derived from a post
//! - [`services`]: listings and search, comment intake, like/dislike
//!   reconciliation and back-office operations

pub mod metrics;
pub mod services;

pub use services::*;
