//! Backup of the lines a session changed, and restoring from it.
//!
//! The backup lives in the working directory as JSON.  For every written
//! file it keeps the modification time right after writing and the original
//! text of each changed line; restoring skips files changed since.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BACKUP_FILE: &str = "spellcheck_comments.backup.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupLine {
    /// 0-based.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBackup {
    pub path: PathBuf,
    /// Nanoseconds since the epoch.
    pub mtime: u64,
    pub lines: Vec<BackupLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub files: Vec<FileBackup>,
}

/// What happened to one file during a restore.
#[derive(Debug)]
pub enum RestoreOutcome {
    Restored(PathBuf),
    /// Modified after the backup was taken; left alone.
    Outdated(PathBuf),
    Failed(PathBuf, anyhow::Error),
}

fn mtime(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("could not stat {}", path.display()))?;
    let since = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(since.as_nanos() as u64)
}

impl Backup {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Record `lines` for `path`, which must already be written.
    pub fn add_file(&mut self, path: &Path, lines: Vec<BackupLine>) -> Result<()> {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mtime = mtime(&path)?;
        self.files.push(FileBackup { path, mtime, lines });
        Ok(())
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(BACKUP_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("could not write {}", path.display()))?;
        debug!(path = %path.display(), files = self.files.len(), "saved backup");
        Ok(path)
    }

    /// `None` if `dir` has no backup.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(BACKUP_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?;
        let backup = serde_json::from_str(&text)
            .with_context(|| format!("invalid backup {}", path.display()))?;
        Ok(Some(backup))
    }

    pub fn restore(&self) -> Vec<RestoreOutcome> {
        self.files
            .iter()
            .map(|file| match restore_file(file) {
                Ok(true) => RestoreOutcome::Restored(file.path.clone()),
                Ok(false) => RestoreOutcome::Outdated(file.path.clone()),
                Err(e) => RestoreOutcome::Failed(file.path.clone(), e),
            })
            .collect()
    }
}

/// Returns `false` if the file changed since the backup.
fn restore_file(backup: &FileBackup) -> Result<bool> {
    if mtime(&backup.path)? != backup.mtime {
        return Ok(false);
    }
    let content = fs::read_to_string(&backup.path)
        .with_context(|| format!("could not read {}", backup.path.display()))?;
    let mut lines: Vec<&str> = content.split('\n').collect();
    for saved in &backup.lines {
        let Some(line) = lines.get_mut(saved.line) else {
            anyhow::bail!("line {} is past the end of the file", saved.line + 1);
        };
        *line = saved.text.as_str();
    }
    fs::write(&backup.path, lines.join("\n"))
        .with_context(|| format!("could not write {}", backup.path.display()))?;
    Ok(true)
}
