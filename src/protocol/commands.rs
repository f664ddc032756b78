//! Request bodies
//!
//! Callers send the same logical parameter under several names (`path`,
//! `file_path`, `filename`, ...). The aliases are folded into one canonical
//! field here, during deserialization, so handlers and the storage layer
//! only ever see the canonical names.

use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// Any request naming a single path
#[derive(Debug, Deserialize, PartialEq)]
pub struct PathRequest {
    #[serde(
        default,
        alias = "file_path",
        alias = "filename",
        alias = "directory",
        alias = "dir"
    )]
    pub path: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct WriteRequest {
    #[serde(alias = "file_path", alias = "filename")]
    pub path: String,
    #[serde(alias = "data", alias = "text")]
    pub content: String,
    #[serde(default = "default_true", alias = "backup")]
    pub create_backup: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct TreeRequest {
    #[serde(default, alias = "directory", alias = "dir")]
    pub path: String,
    #[serde(default, alias = "depth")]
    pub max_depth: Option<usize>,
}

/// Move or copy
#[derive(Debug, Deserialize, PartialEq)]
pub struct TransferRequest {
    #[serde(alias = "src", alias = "from")]
    pub source: String,
    #[serde(alias = "dest", alias = "to", alias = "target")]
    pub destination: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct SearchRequest {
    #[serde(default, alias = "root", alias = "directory", alias = "dir")]
    pub path: String,
    #[serde(alias = "query", alias = "name")]
    pub pattern: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ContentSearchRequest {
    #[serde(default, alias = "root", alias = "directory", alias = "dir")]
    pub path: String,
    #[serde(alias = "query", alias = "text")]
    pub pattern: String,
    #[serde(default, alias = "file_extension", alias = "ext")]
    pub extension: Option<String>,
}
