//! Storage operations
//!
//! Every operation resolves its input through the [`PathResolver`] first and
//! never touches a raw caller path. Filesystem failures are translated into
//! [`FileOpError`] here; nothing from `std::io` leaks past this module.

use chrono::Local;
use log::{debug, info};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::FilesConfig;
use crate::error::FileOpError;
use crate::storage::filesystem::{
    backup_path, copy_directory, copy_file, create_directory, entry_from_metadata,
};
use crate::storage::results::{
    ContentMatch, ContentSearchResult, DeleteResult, EntryKind, InfoResult, ListResult,
    MkdirResult, NameSearchResult, ReadResult, ScanError, TransferResult, TreeNode, WriteResult,
};
use crate::storage::search::{compile_content_pattern, compile_name_pattern};
use crate::storage::validation::{ConfinedPath, PathResolver};

const ESCAPING_SYMLINK: &str = "symlink target is outside the base directory";

/// Bounds applied to recursive scans
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub max_tree_depth: usize,
    pub max_search_results: usize,
    pub max_line_matches: usize,
}

impl From<&FilesConfig> for ScanLimits {
    fn from(config: &FilesConfig) -> Self {
        Self {
            max_tree_depth: config.max_tree_depth,
            max_search_results: config.max_search_results,
            max_line_matches: config.max_line_matches,
        }
    }
}

/// Filesystem actions confined to one base directory
#[derive(Debug, Clone)]
pub struct FileOperations {
    resolver: PathResolver,
    limits: ScanLimits,
}

impl FileOperations {
    pub fn new(resolver: PathResolver, limits: ScanLimits) -> Self {
        Self { resolver, limits }
    }

    /// Build from configuration, creating the base directory if needed
    pub fn from_config(config: &FilesConfig) -> io::Result<Self> {
        let resolver = PathResolver::new(&config.base_directory_path())?;
        Ok(Self::new(resolver, ScanLimits::from(config)))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Reads a whole text file
    pub fn read(&self, path: &str) -> Result<ReadResult, FileOpError> {
        let target = self.resolver.resolve(path)?;
        let metadata = stat(&target)?;
        if metadata.is_dir() {
            return Err(FileOpError::IsADirectory(target.label().to_string()));
        }

        let content = fs::read_to_string(target.as_path()).map_err(io_error(&target))?;
        debug!("Read {} ({} bytes)", target.label(), content.len());

        Ok(ReadResult {
            path: target.relative().to_string(),
            size: content.len() as u64,
            content,
        })
    }

    /// Replaces a file's content, creating parents as needed.
    ///
    /// With `create_backup`, an existing file is first copied to a
    /// timestamped sibling; if that copy fails the write does not happen.
    pub fn write(
        &self,
        path: &str,
        content: &str,
        create_backup: bool,
    ) -> Result<WriteResult, FileOpError> {
        let target = self.resolver.resolve(path)?;
        if target.is_base() {
            return Err(FileOpError::IsADirectory(target.label().to_string()));
        }

        let exists = match fs::metadata(target.as_path()) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(FileOpError::IsADirectory(target.label().to_string()));
            }
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(FileOpError::from_io(target.label(), e)),
        };

        if let Some(parent) = target.as_path().parent() {
            create_directory(parent).map_err(io_error(&target))?;
        }

        let backup = if exists && create_backup {
            let backup = backup_path(target.as_path(), Local::now());
            copy_file(target.as_path(), &backup).map_err(io_error(&target))?;
            let relative = self.resolver.relative_of(&backup);
            info!("Backed up {} to {}", target.label(), relative);
            Some(relative)
        } else {
            None
        };

        fs::write(target.as_path(), content).map_err(io_error(&target))?;
        info!("Wrote {} ({} bytes)", target.label(), content.len());

        Ok(WriteResult {
            path: target.relative().to_string(),
            bytes_written: content.len() as u64,
            backup,
        })
    }

    /// Lists a directory, non-recursively, sorted by name
    pub fn list(&self, path: &str) -> Result<ListResult, FileOpError> {
        let target = self.resolver.resolve(path)?;
        require_directory(&target)?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(target.as_path()).map_err(io_error(&target))? {
            let entry = entry.map_err(io_error(&target))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if is_symlink(&path) && !self.resolver.contains(&path) {
                debug!("Skipping {} in {}: {}", name, target.label(), ESCAPING_SYMLINK);
                continue;
            }
            match fs::metadata(&path) {
                Ok(metadata) => entries.push(entry_from_metadata(name, &metadata)),
                Err(e) => debug!("Skipping {} in {}: {}", name, target.label(), e),
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Listed {} ({} entries)", target.label(), entries.len());
        Ok(ListResult {
            path: target.relative().to_string(),
            entries,
        })
    }

    /// Builds a nested view of a directory.
    ///
    /// `max_depth` is clamped to the configured limit; `0` returns only the
    /// root, marked truncated. Unreadable subtrees become error nodes.
    pub fn tree(&self, path: &str, max_depth: Option<usize>) -> Result<TreeNode, FileOpError> {
        let target = self.resolver.resolve(path)?;
        require_directory(&target)?;
        // The root itself must be readable; only nested failures are partial.
        fs::read_dir(target.as_path()).map_err(io_error(&target))?;

        let depth = max_depth
            .unwrap_or(self.limits.max_tree_depth)
            .min(self.limits.max_tree_depth);
        let name = target
            .as_path()
            .file_name()
            .filter(|_| !target.is_base())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        let node = self.tree_node(target.as_path(), name, depth);
        debug!("Built tree for {} ({} nodes)", target.label(), node.count());
        Ok(node)
    }

    fn tree_node(&self, path: &Path, name: String, remaining: usize) -> TreeNode {
        let mut node = TreeNode {
            name,
            path: self.resolver.relative_of(path),
            kind: None,
            size: None,
            children: None,
            truncated: false,
            error: None,
        };

        let linked = is_symlink(path);
        if linked && !self.resolver.contains(path) {
            node.error = Some(ESCAPING_SYMLINK.to_string());
            return node;
        }

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Tree node {} unreadable: {}", node.path, e);
                node.error = Some(e.to_string());
                return node;
            }
        };

        if !metadata.is_dir() {
            node.kind = Some(EntryKind::File);
            node.size = Some(metadata.len());
            return node;
        }

        node.kind = Some(EntryKind::Directory);
        if linked || remaining == 0 {
            node.truncated = true;
            return node;
        }

        match fs::read_dir(path) {
            Ok(entries) => {
                let mut children: Vec<TreeNode> = entries
                    .map(|entry| match entry {
                        Ok(entry) => self.tree_node(
                            &entry.path(),
                            entry.file_name().to_string_lossy().into_owned(),
                            remaining - 1,
                        ),
                        Err(e) => TreeNode {
                            name: String::new(),
                            path: node.path.clone(),
                            kind: None,
                            size: None,
                            children: None,
                            truncated: false,
                            error: Some(e.to_string()),
                        },
                    })
                    .collect();
                children.sort_by(|a, b| a.name.cmp(&b.name));
                node.children = Some(children);
            }
            Err(e) => {
                debug!("Tree node {} unreadable: {}", node.path, e);
                node.error = Some(e.to_string());
            }
        }
        node
    }

    /// Creates a directory and any missing parents; existing directories
    /// are left alone
    pub fn mkdir(&self, path: &str) -> Result<MkdirResult, FileOpError> {
        let target = self.resolver.resolve(path)?;

        let created = match fs::metadata(target.as_path()) {
            Ok(metadata) if metadata.is_dir() => false,
            Ok(_) => return Err(FileOpError::AlreadyExists(target.label().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_directory(target.as_path()).map_err(io_error(&target))?;
                info!("Created directory {}", target.label());
                true
            }
            Err(e) => return Err(FileOpError::from_io(target.label(), e)),
        };

        Ok(MkdirResult {
            path: target.relative().to_string(),
            created,
        })
    }

    /// Removes a file, a symlink, or a directory tree
    pub fn delete(&self, path: &str) -> Result<DeleteResult, FileOpError> {
        let target = self.resolver.resolve_entry(path)?;
        if target.is_base() {
            return Err(FileOpError::InvalidInput(
                "refusing to delete the base directory".into(),
            ));
        }

        let metadata = fs::symlink_metadata(target.as_path()).map_err(io_error(&target))?;
        let kind = if metadata.is_dir() {
            fs::remove_dir_all(target.as_path()).map_err(io_error(&target))?;
            EntryKind::Directory
        } else {
            fs::remove_file(target.as_path()).map_err(io_error(&target))?;
            EntryKind::File
        };

        info!("Deleted {}", target.label());
        Ok(DeleteResult {
            path: target.relative().to_string(),
            kind,
        })
    }

    /// Renames `source` to `destination`. Never replaces an existing
    /// destination.
    pub fn move_path(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<TransferResult, FileOpError> {
        let src = self.resolver.resolve_entry(source)?;
        let dst = self.resolver.resolve_entry(destination)?;
        if src.is_base() {
            return Err(FileOpError::InvalidInput(
                "refusing to move the base directory".into(),
            ));
        }

        let metadata = fs::symlink_metadata(src.as_path()).map_err(io_error(&src))?;
        ensure_vacant(&dst)?;
        if metadata.is_dir() && dst.as_path().starts_with(src.as_path()) {
            return Err(FileOpError::InvalidInput(format!(
                "cannot move {} into itself",
                src.label()
            )));
        }

        if let Some(parent) = dst.as_path().parent() {
            create_directory(parent).map_err(io_error(&dst))?;
        }

        match fs::rename(src.as_path(), dst.as_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!("Rename across devices, copying {} instead", src.label());
                if metadata.is_dir() {
                    copy_directory(src.as_path(), dst.as_path()).map_err(io_error(&dst))?;
                    fs::remove_dir_all(src.as_path()).map_err(io_error(&src))?;
                } else {
                    copy_file(src.as_path(), dst.as_path()).map_err(io_error(&dst))?;
                    fs::remove_file(src.as_path()).map_err(io_error(&src))?;
                }
            }
            Err(e) => return Err(FileOpError::from_io(src.label(), e)),
        }

        info!("Moved {} to {}", src.label(), dst.label());
        Ok(TransferResult {
            source: src.relative().to_string(),
            destination: dst.relative().to_string(),
            kind: kind_of(&metadata),
        })
    }

    /// Duplicates a file or a directory tree.
    ///
    /// An existing destination is only replaced when `overwrite` is set.
    pub fn copy(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<TransferResult, FileOpError> {
        let src = self.resolver.resolve(source)?;
        let dst = self.resolver.resolve_entry(destination)?;

        let metadata = stat(&src)?;
        if src.as_path() == dst.as_path() {
            return Err(FileOpError::InvalidInput(
                "source and destination are the same".into(),
            ));
        }
        if metadata.is_dir() && dst.as_path().starts_with(src.as_path()) {
            return Err(FileOpError::InvalidInput(format!(
                "cannot copy {} into itself",
                src.label()
            )));
        }
        // Replacing an ancestor would delete the source before it is read.
        if src.as_path().starts_with(dst.as_path()) {
            return Err(FileOpError::InvalidInput(format!(
                "cannot copy {} over its own parent {}",
                src.label(),
                dst.label()
            )));
        }

        if overwrite {
            remove_existing(&dst)?;
        } else {
            ensure_vacant(&dst)?;
        }

        if let Some(parent) = dst.as_path().parent() {
            create_directory(parent).map_err(io_error(&dst))?;
        }

        if metadata.is_dir() {
            copy_directory(src.as_path(), dst.as_path()).map_err(io_error(&dst))?;
        } else {
            copy_file(src.as_path(), dst.as_path()).map_err(io_error(&dst))?;
        }

        info!("Copied {} to {}", src.label(), dst.label());
        Ok(TransferResult {
            source: src.relative().to_string(),
            destination: dst.relative().to_string(),
            kind: kind_of(&metadata),
        })
    }

    /// Metadata for a single path
    pub fn info(&self, path: &str) -> Result<InfoResult, FileOpError> {
        let target = self.resolver.resolve(path)?;
        let metadata = stat(&target)?;
        let name = target
            .as_path()
            .file_name()
            .filter(|_| !target.is_base())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        Ok(InfoResult {
            path: target.relative().to_string(),
            entry: entry_from_metadata(name, &metadata),
        })
    }

    /// Finds files under `root` whose name matches `pattern`
    pub fn search_files(
        &self,
        root: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<NameSearchResult, FileOpError> {
        let regex = compile_name_pattern(pattern)?;
        let target = self.resolver.resolve(root)?;
        require_directory(&target)?;

        let mut result = NameSearchResult {
            root: target.relative().to_string(),
            pattern: pattern.to_string(),
            matches: Vec::new(),
            truncated: false,
            errors: Vec::new(),
        };
        self.walk_names(target.as_path(), &regex, recursive, &mut result);

        debug!(
            "Name search {:?} under {}: {} matches, {} errors",
            pattern,
            target.label(),
            result.matches.len(),
            result.errors.len()
        );
        Ok(result)
    }

    fn walk_names(
        &self,
        dir: &Path,
        regex: &Regex,
        recursive: bool,
        out: &mut NameSearchResult,
    ) {
        let entries = match read_dir_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => {
                out.errors.push(self.scan_error(dir, e.to_string()));
                return;
            }
        };

        for path in entries {
            if out.truncated {
                return;
            }
            let Some(metadata) = self.scan_metadata(&path, &mut out.errors) else {
                continue;
            };

            if metadata.is_dir() {
                if recursive && !is_symlink(&path) {
                    self.walk_names(&path, regex, recursive, out);
                }
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if regex.is_match(&name) {
                if out.matches.len() >= self.limits.max_search_results {
                    out.truncated = true;
                    return;
                }
                out.matches.push(self.resolver.relative_of(&path));
            }
        }
    }

    /// Finds lines matching `pattern` in every file under `root`,
    /// optionally only files with the given extension
    pub fn search_content(
        &self,
        root: &str,
        pattern: &str,
        extension: Option<&str>,
    ) -> Result<ContentSearchResult, FileOpError> {
        let regex = compile_content_pattern(pattern)?;
        let target = self.resolver.resolve(root)?;
        require_directory(&target)?;

        let extension = extension
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty());

        let mut result = ContentSearchResult {
            root: target.relative().to_string(),
            pattern: pattern.to_string(),
            matches: Vec::new(),
            files_scanned: 0,
            truncated: false,
            errors: Vec::new(),
        };
        self.walk_content(target.as_path(), &regex, extension, &mut result);

        debug!(
            "Content search {:?} under {}: {} files matched of {} scanned",
            pattern,
            target.label(),
            result.matches.len(),
            result.files_scanned
        );
        Ok(result)
    }

    fn walk_content(
        &self,
        dir: &Path,
        regex: &Regex,
        extension: Option<&str>,
        out: &mut ContentSearchResult,
    ) {
        let entries = match read_dir_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => {
                out.errors.push(self.scan_error(dir, e.to_string()));
                return;
            }
        };

        for path in entries {
            if out.truncated {
                return;
            }
            let Some(metadata) = self.scan_metadata(&path, &mut out.errors) else {
                continue;
            };

            if metadata.is_dir() {
                if !is_symlink(&path) {
                    self.walk_content(&path, regex, extension, out);
                }
                continue;
            }

            if let Some(ext) = extension {
                if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                    continue;
                }
            }

            out.files_scanned += 1;
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    out.errors.push(self.scan_error(&path, e.to_string()));
                    continue;
                }
            };

            let line_numbers: Vec<usize> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| regex.is_match(line))
                .map(|(index, _)| index + 1)
                .take(self.limits.max_line_matches)
                .collect();

            if !line_numbers.is_empty() {
                if out.matches.len() >= self.limits.max_search_results {
                    out.truncated = true;
                    return;
                }
                out.matches.push(ContentMatch {
                    path: self.resolver.relative_of(&path),
                    line_numbers,
                });
            }
        }
    }

    /// Metadata for a scanned entry, or a recorded per-node error
    fn scan_metadata(&self, path: &Path, errors: &mut Vec<ScanError>) -> Option<fs::Metadata> {
        if is_symlink(path) && !self.resolver.contains(path) {
            errors.push(self.scan_error(path, ESCAPING_SYMLINK.to_string()));
            return None;
        }
        match fs::metadata(path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                errors.push(self.scan_error(path, e.to_string()));
                None
            }
        }
    }

    fn scan_error(&self, path: &Path, error: String) -> ScanError {
        ScanError {
            path: self.resolver.relative_of(path),
            error,
        }
    }
}

fn io_error(path: &ConfinedPath) -> impl FnOnce(io::Error) -> FileOpError + '_ {
    move |e| FileOpError::from_io(path.label(), e)
}

fn stat(path: &ConfinedPath) -> Result<fs::Metadata, FileOpError> {
    fs::metadata(path.as_path()).map_err(io_error(path))
}

fn require_directory(path: &ConfinedPath) -> Result<(), FileOpError> {
    if stat(path)?.is_dir() {
        Ok(())
    } else {
        Err(FileOpError::NotADirectory(path.label().to_string()))
    }
}

fn ensure_vacant(path: &ConfinedPath) -> Result<(), FileOpError> {
    match fs::symlink_metadata(path.as_path()) {
        Ok(_) => Err(FileOpError::AlreadyExists(path.label().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FileOpError::from_io(path.label(), e)),
    }
}

fn remove_existing(path: &ConfinedPath) -> Result<(), FileOpError> {
    if path.is_base() {
        return Err(FileOpError::InvalidInput(
            "refusing to overwrite the base directory".into(),
        ));
    }
    match fs::symlink_metadata(path.as_path()) {
        Ok(metadata) if metadata.is_dir() => {
            fs::remove_dir_all(path.as_path()).map_err(io_error(path))
        }
        Ok(_) => fs::remove_file(path.as_path()).map_err(io_error(path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FileOpError::from_io(path.label(), e)),
    }
}

fn read_dir_sorted(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}
