//! Server core functionality
//!
//! This module contains the HTTP server, its route table, and the state
//! shared by all handlers.

pub mod core;
pub mod routes;
pub mod state;

pub use self::core::Server;
pub use routes::build_router;
pub use state::AppState;
