//! Ignore rule set parsed from the workspace control file.

use glob::Pattern;

use crate::error::CoderError;

/// Ordered glob patterns matched against single path segments.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    /// Parse control-file contents: one pattern per line, `#` comments and
    /// blank lines skipped. A trailing `/` is dropped since patterns always
    /// apply to a single segment.
    pub fn parse(contents: &str) -> Result<Self, CoderError> {
        let mut rules = Self::default();
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            rules.push(trimmed).map_err(|reason| CoderError::InvalidIgnorePattern {
                line: idx + 1,
                pattern: trimmed.to_string(),
                reason,
            })?;
        }
        Ok(rules)
    }

    /// Append one more pattern after the ones loaded from the file.
    pub fn push(&mut self, raw: &str) -> Result<(), String> {
        let pattern = raw.trim().trim_end_matches('/');
        if pattern.is_empty() {
            return Err("pattern is empty".to_string());
        }
        if pattern.contains('/') {
            return Err("patterns match a single path segment and may not contain '/'".to_string());
        }
        let compiled = Pattern::new(pattern).map_err(|err| err.to_string())?;
        self.patterns.push(compiled);
        Ok(())
    }

    /// True if `name` (a base name or directory segment) matches any pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// True if a segment must be left out of the listing: hidden or ignored.
    pub fn excludes(&self, name: &str) -> bool {
        name.starts_with('.') || self.matches(name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
