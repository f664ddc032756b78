//! Storage result types
//!
//! Defines result structures returned by storage operations. All of them
//! serialize straight into an envelope's `data` payload.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kind of filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One item from a directory listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Bytes, files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Result of a read operation
#[derive(Debug, Clone, Serialize)]
pub struct ReadResult {
    pub path: String,
    pub content: String,
    pub size: u64,
}

/// Result of a write operation
#[derive(Debug, Clone, Serialize)]
pub struct WriteResult {
    pub path: String,
    pub bytes_written: u64,
    /// Base-relative path of the backup, if one was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub path: String,
    pub entries: Vec<FileEntry>,
}

/// Node of a directory tree.
///
/// `children` is present only for directories that were expanded. A
/// directory at the depth limit has `truncated` set instead; one that could
/// not be read carries `error`.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(TreeNode::count)
            .sum::<usize>()
    }
}

/// Result of a mkdir operation
#[derive(Debug, Clone, Serialize)]
pub struct MkdirResult {
    pub path: String,
    pub created: bool,
}

/// Result of a delete operation
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub path: String,
    pub kind: EntryKind,
}

/// Result of a move or copy operation
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub source: String,
    pub destination: String,
    pub kind: EntryKind,
}

/// Result of an info operation
#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub path: String,
    #[serde(flatten)]
    pub entry: FileEntry,
}

/// A path that a recursive scan could not process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanError {
    pub path: String,
    pub error: String,
}

/// Result of a search by file name
#[derive(Debug, Clone, Serialize)]
pub struct NameSearchResult {
    pub root: String,
    pub pattern: String,
    /// Base-relative paths of matching files
    pub matches: Vec<String>,
    pub truncated: bool,
    pub errors: Vec<ScanError>,
}

/// Per-file hit list of a content search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentMatch {
    pub path: String,
    /// 1-based line numbers, capped per file
    pub line_numbers: Vec<usize>,
}

/// Result of a search by file content
#[derive(Debug, Clone, Serialize)]
pub struct ContentSearchResult {
    pub root: String,
    pub pattern: String,
    pub matches: Vec<ContentMatch>,
    pub files_scanned: usize,
    pub truncated: bool,
    pub errors: Vec<ScanError>,
}
