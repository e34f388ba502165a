//! File discovery: walk directory trees and collect files with a known
//! comment style.
//!
//! By default the walker:
//!  - Respects `.gitignore` (and `.ignore`) files at every level.
//!  - **Skips hidden entries** (names starting with `.`).
//!  - Always skips the vendored and build directories listed in
//!    [`ALWAYS_EXCLUDE`] even if they are not gitignored.
//!
//! `--globs` narrows the walk further: when given, only files whose name
//! matches one of the globs are returned.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use tracing::debug;

/// Directory names that are never searched.
const ALWAYS_EXCLUDE: &[&str] = &[
    "node_modules",
    "target",
    "vendor",
    "__pycache__",
    "venv",
    "build",
    "dist",
];

fn excluded(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => ALWAYS_EXCLUDE.contains(&name.to_string_lossy().as_ref()),
        _ => false,
    })
}

/// Discover every file under `root` that `accept` takes and, if `globs` is
/// non-empty, that matches one of them.
///
/// The returned paths are sorted.
pub fn discover_files(
    root: &Path,
    globs: &[String],
    accept: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(true).git_ignore(true).require_git(false);

    if !globs.is_empty() {
        let mut overrides = OverrideBuilder::new(root);
        for glob in globs {
            overrides
                .add(glob)
                .with_context(|| format!("invalid glob {glob:?}"))?;
        }
        builder.overrides(overrides.build()?);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if excluded(path.strip_prefix(root).unwrap_or(path)) || !accept(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    debug!(root = %root.display(), count = files.len(), "discovered files");
    Ok(files)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
