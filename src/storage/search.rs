//! Search pattern compilation

use log::debug;
use regex::Regex;

use crate::error::FileOpError;

/// Compile a file-name pattern.
///
/// The pattern is tried as a case-sensitive regex first (unanchored). If it
/// does not compile, it is read as a glob: `*` matches any run of
/// characters, `?` one character, everything else literally, and the glob
/// must match the whole name. `*.yaml` therefore works without regex
/// knowledge.
pub fn compile_name_pattern(pattern: &str) -> Result<Regex, FileOpError> {
    if pattern.is_empty() {
        return Err(FileOpError::InvalidInput("search pattern is empty".into()));
    }

    match Regex::new(pattern) {
        Ok(regex) => Ok(regex),
        Err(e) => {
            debug!("Pattern {:?} is not a regex ({}), treating as glob", pattern, e);
            Regex::new(&glob_to_regex(pattern))
                .map_err(|e| FileOpError::InvalidInput(format!("unusable pattern: {}", e)))
        }
    }
}

/// Compile a content pattern: regex, or the literal text if it is not one.
pub fn compile_content_pattern(pattern: &str) -> Result<Regex, FileOpError> {
    if pattern.is_empty() {
        return Err(FileOpError::InvalidInput("search pattern is empty".into()));
    }

    Regex::new(pattern)
        .or_else(|_| Regex::new(&regex::escape(pattern)))
        .map_err(|e| FileOpError::InvalidInput(format!("unusable pattern: {}", e)))
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}
