//! Path validation
//!
//! Confines caller-supplied relative paths to the base directory. The check
//! runs on the fully resolved location (`.`/`..` applied, symlinks followed),
//! never on the raw string.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::FileOpError;

/// Resolves relative paths against a fixed, canonical base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

/// An absolute path proven to lie inside (or at) the base directory.
///
/// Only [`PathResolver`] constructs one; it lives for a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath {
    absolute: PathBuf,
    relative: String,
}

impl PathResolver {
    /// Creates the base directory if missing and canonicalizes it once.
    pub fn new(base_directory: &Path) -> io::Result<Self> {
        fs::create_dir_all(base_directory)?;
        let base = base_directory.canonicalize()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `raw` against the base directory.
    ///
    /// Leading separators are stripped and `\` is treated as `/`, so
    /// `/secrets.yaml` and `\secrets.yaml` both mean `<base>/secrets.yaml`.
    pub fn resolve(&self, raw: &str) -> Result<ConfinedPath, FileOpError> {
        if raw.contains('\0') {
            return Err(FileOpError::InvalidInput("path contains a NUL byte".into()));
        }

        let normalized = raw.replace('\\', "/");
        let trimmed = normalized.trim_start_matches('/');

        let mut current = self.base.clone();
        for part in trimmed.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    current.pop();
                }
                name => {
                    // Drive prefixes and the like would replace `current` on push.
                    let mut components = Path::new(name).components();
                    match (components.next(), components.next()) {
                        (Some(Component::Normal(_)), None) => {}
                        _ => return Err(FileOpError::PathEscape(raw.to_string())),
                    }
                    current.push(name);
                    current = follow_symlink(current);
                }
            }
        }

        if !current.starts_with(&self.base) {
            return Err(FileOpError::PathEscape(raw.to_string()));
        }

        let relative = self.relative_of(&current);
        Ok(ConfinedPath {
            absolute: current,
            relative,
        })
    }

    /// Like [`resolve`](Self::resolve), but a symlink in the final position
    /// is kept as the link itself rather than followed. Used by operations
    /// that act on the directory entry (delete, move) instead of its target.
    pub fn resolve_entry(&self, raw: &str) -> Result<ConfinedPath, FileOpError> {
        if raw.contains('\0') {
            return Err(FileOpError::InvalidInput("path contains a NUL byte".into()));
        }

        let normalized = raw.replace('\\', "/");
        let trimmed = normalized.trim_end_matches('/');
        let (parent, name) = match trimmed.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", trimmed),
        };

        if matches!(name, "" | "." | "..") {
            return self.resolve(raw);
        }

        let parent = self.resolve(parent).map_err(|e| match e {
            FileOpError::PathEscape(_) => FileOpError::PathEscape(raw.to_string()),
            other => other,
        })?;

        let mut components = Path::new(name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(FileOpError::PathEscape(raw.to_string()));
        }

        let absolute = parent.absolute.join(name);
        let relative = self.relative_of(&absolute);
        Ok(ConfinedPath {
            absolute,
            relative,
        })
    }

    /// Base-relative, `/`-separated form of a path already known to be
    /// inside the base directory.
    pub fn relative_of(&self, path: &Path) -> String {
        path.strip_prefix(&self.base)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }

    /// Whether `path` (typically a directory entry found during a scan)
    /// still resolves inside the base directory.
    pub fn contains(&self, path: &Path) -> bool {
        follow_symlink(path.to_path_buf()).starts_with(&self.base)
    }
}

impl ConfinedPath {
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }

    /// Base-relative form; empty for the base directory itself
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn is_base(&self) -> bool {
        self.relative.is_empty()
    }

    /// Name used in messages and errors
    pub fn label(&self) -> &str {
        if self.relative.is_empty() {
            "."
        } else {
            &self.relative
        }
    }
}

/// If `path` is a symlink, replace it with its target.
///
/// Live links canonicalize fully. Dangling or looping links resolve lexically
/// against the link's parent so the confinement check still sees where they
/// point.
fn follow_symlink(path: PathBuf) -> PathBuf {
    let is_symlink = fs::symlink_metadata(&path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return path;
    }

    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    match fs::read_link(&path) {
        Ok(target) => {
            let joined = match path.parent() {
                Some(parent) => parent.join(target),
                None => target,
            };
            lexical_normalize(&joined)
        }
        Err(_) => path,
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
