//! File selection: include/exclude glob patterns and list files, applied
//! during traversal.
//!
//! Grounded on the teacher's `FileSelector` (glob-pattern matching via the
//! `glob` crate), generalized here to also read `-i@list`/`-x@list` files
//! and to carry the recursion policy the traversal loop consults.

use std::fs;
use std::path::Path;

use glob::Pattern;

use crate::cli::error::RadyxError;

/// How directories named on the command line are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recursion {
    /// `-r`: recurse into every directory encountered, named or matched.
    Full,
    /// `-r-`: never recurse; only the literal entries given are considered.
    None,
    /// Default and `-r0`: recurse into directories named explicitly on the
    /// command line, but not into ones that only matched a wildcard.
    #[default]
    NamedOnly,
}

/// Include/exclude rules built from `-i`/`-x` switches.
#[derive(Debug, Default)]
pub struct Selector {
    include_patterns: Vec<Pattern>,
    exclude_patterns: Vec<Pattern>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_include_pattern(&mut self, pattern: &str) -> Result<(), RadyxError> {
        self.include_patterns
            .push(Pattern::new(pattern).map_err(|e| RadyxError::InvalidArgument(format!("bad include pattern {pattern:?}: {e}")))?);
        Ok(())
    }

    pub fn add_exclude_pattern(&mut self, pattern: &str) -> Result<(), RadyxError> {
        self.exclude_patterns
            .push(Pattern::new(pattern).map_err(|e| RadyxError::InvalidArgument(format!("bad exclude pattern {pattern:?}: {e}")))?);
        Ok(())
    }

    /// Reads `path`, one pattern per line, blank lines and `#`-prefixed
    /// lines ignored, adding each as an include pattern.
    pub fn add_include_list(&mut self, path: &Path) -> Result<(), RadyxError> {
        for pattern in read_list_file(path)? {
            self.add_include_pattern(&pattern)?;
        }
        Ok(())
    }

    pub fn add_exclude_list(&mut self, path: &Path) -> Result<(), RadyxError> {
        for pattern in read_list_file(path)? {
            self.add_exclude_pattern(&pattern)?;
        }
        Ok(())
    }

    /// Whether a discovered path (archive-relative, `/`-separated) should
    /// be added to the session.
    pub fn matches(&self, relative_path: &str) -> bool {
        if !self.include_patterns.is_empty() && !self.include_patterns.iter().any(|p| p.matches(relative_path)) {
            return false;
        }
        !self.exclude_patterns.iter().any(|p| p.matches(relative_path))
    }

    pub fn is_trivial(&self) -> bool {
        self.include_patterns.is_empty() && self.exclude_patterns.is_empty()
    }
}

fn read_list_file(path: &Path) -> Result<Vec<String>, RadyxError> {
    let text = fs::read_to_string(path)
        .map_err(|e| RadyxError::InvalidArgument(format!("failed to read list file {}: {e}", path.display())))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selector_matches_everything() {
        let sel = Selector::new();
        assert!(sel.matches("anything.txt"));
        assert!(sel.is_trivial());
    }

    #[test]
    fn include_patterns_narrow_the_match_set() {
        let mut sel = Selector::new();
        sel.add_include_pattern("*.txt").unwrap();
        assert!(sel.matches("readme.txt"));
        assert!(!sel.matches("image.png"));
    }

    #[test]
    fn exclude_overrides_include() {
        let mut sel = Selector::new();
        sel.add_include_pattern("*.txt").unwrap();
        sel.add_exclude_pattern("debug*.txt").unwrap();
        assert!(sel.matches("readme.txt"));
        assert!(!sel.matches("debug.txt"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut sel = Selector::new();
        assert!(sel.add_include_pattern("[").is_err());
    }
}
