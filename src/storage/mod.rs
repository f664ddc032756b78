//! File system storage management
//!
//! Handles path confinement and the file operations built on top of it.

pub mod filesystem;
pub mod operations;
pub mod results;
pub mod search;
pub mod validation;

pub use operations::{FileOperations, ScanLimits};
pub use validation::{ConfinedPath, PathResolver};
