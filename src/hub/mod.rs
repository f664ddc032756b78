//! Hub module
//!
//! Client for the home-automation hub's REST API, used by the device and
//! state endpoints. The file tools never call it.

mod client;

pub use client::HubClient;
