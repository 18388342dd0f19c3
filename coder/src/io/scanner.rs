//! Workspace scanner producing the File Structure Listing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::ignore::IgnoreRules;
use crate::core::path::to_slash;
use crate::error::CoderError;

/// Load the ignore rule set from the control file.
///
/// The file must exist: scanning never proceeds with a default rule set.
pub fn load_ignore_rules(ignore_path: &Path) -> Result<IgnoreRules> {
    if !ignore_path.is_file() {
        return Err(CoderError::MissingIgnoreFile {
            path: ignore_path.to_path_buf(),
        }
        .into());
    }
    let contents = fs::read_to_string(ignore_path)
        .with_context(|| format!("read ignore file {}", ignore_path.display()))?;
    let rules = IgnoreRules::parse(&contents)?;
    debug!(patterns = rules.len(), path = %ignore_path.display(), "loaded ignore rules");
    Ok(rules)
}

/// Walk `root` depth-first and list every directory and file not excluded by
/// `rules`, as sorted `/`-separated relative paths.
///
/// Excluded directories are pruned. Unreadable entries are skipped.
pub fn scan_workspace(root: &Path, rules: &IgnoreRules) -> Vec<String> {
    let mut listing = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry, rules));

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(err = %err, "skipping unreadable workspace entry");
                continue;
            }
        };
        match entry.path().strip_prefix(root) {
            Ok(relative) => listing.push(to_slash(relative)),
            Err(_) => warn!(path = %entry.path().display(), "entry outside workspace root"),
        }
    }

    listing.sort();
    listing
}

/// Load rules (plus `extra_patterns`) and scan in one call.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan(root: &Path, ignore_path: &Path, extra_patterns: &[&str]) -> Result<Vec<String>> {
    let mut rules = load_ignore_rules(ignore_path)?;
    for pattern in extra_patterns {
        rules
            .push(pattern)
            .map_err(|reason| CoderError::InvalidIgnorePattern {
                line: 0,
                pattern: pattern.to_string(),
                reason,
            })?;
    }
    let listing = scan_workspace(root, &rules);
    debug!(entries = listing.len(), "scanned workspace");
    Ok(listing)
}

fn is_excluded(entry: &DirEntry, rules: &IgnoreRules) -> bool {
    rules.excludes(&entry.file_name().to_string_lossy())
}
