//! Short-link web host
//!
//! Serves the signed redirect page and proxies the admin console to the
//! resource API.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;

// Re-export the main functions
pub use server::{build_app, build_app_with_state};
pub use state::AppState;
