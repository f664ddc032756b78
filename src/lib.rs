pub mod config;
pub mod error;
pub mod hub;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod storage;

pub use server::Server;
