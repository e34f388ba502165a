//! Configuration file and compiled comment dialects.
//!
//! The file is JSON with kebab-case keys; every field has a default, so an
//! empty object (or no file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "extensions": { "builtin-c": ["glsl"], "lua": ["lua"] },
//!   "styles": { "lua": { "line": ["--"], "block-begin": ["--[["], "block-end": ["]]"] } },
//!   "general": { "suggestions": 10, "filters": ["^0x[0-9a-f]+$"] },
//!   "colors": { "comment": "bright black", "highlight": "reverse red" }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::comment_lexer::{Dialect, compile};
use crate::style::{CommentStyle, StyleError, builtin_styles};
use crate::text_buffer::Style;

pub const CONFIG_FILE: &str = "spellcheck_comments.json";
pub const CONFIG_DIR: &str = "spellcheck_comments";
pub const DEFAULT_IGNORE_LIST: &str = ".spellcheck_comments_ignorelist";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid configuration in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid comment style {name:?}: {source}")]
    Style { name: String, source: StyleError },
    #[error("extensions given for unknown style {0:?}")]
    UnknownStyle(String),
    #[error("invalid filter {pattern:?}: {source}")]
    Filter {
        pattern: String,
        source: regex::Error,
    },
    #[error("invalid color {0:?}")]
    Color(String),
}

// ── File format ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Style name → file extensions (without the dot).
    pub extensions: BTreeMap<String, Vec<String>>,
    pub styles: BTreeMap<String, CommentStyle>,
    pub general: General,
    pub colors: Colors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct General {
    /// Store a backup before writing files.
    pub backup: bool,
    pub dim_code: bool,
    pub filter_commented_code: bool,
    /// Regexes; matching words are never flagged.
    pub filters: Vec<String>,
    /// Shell commands producing ANSI highlighted output, `%FILE%` is the
    /// file path.  The first one that succeeds wins.
    pub highlight_commands: Vec<String>,
    pub ignore_case: bool,
    /// File names searched in the working and configuration directories.
    pub ignore_lists: Vec<String>,
    /// Maximum number of suggestions shown.
    pub suggestions: usize,
    pub tab_size: usize,
    /// Word lists for the spelling oracle.
    pub dictionaries: Vec<PathBuf>,
}

impl Default for General {
    fn default() -> Self {
        Self {
            backup: true,
            dim_code: true,
            filter_commented_code: false,
            filters: Vec::new(),
            highlight_commands: Vec::new(),
            ignore_case: true,
            ignore_lists: vec![DEFAULT_IGNORE_LIST.to_string()],
            suggestions: 20,
            tab_size: 4,
            dictionaries: vec![PathBuf::from("/usr/share/dict/words")],
        }
    }
}

/// Colours are space separated names and attributes, e.g. `"bold red"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Colors {
    pub comment: Option<String>,
    pub highlight: String,
    pub line_number: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            comment: None,
            highlight: "reverse".to_string(),
            line_number: "yellow".to_string(),
        }
    }
}

/// Turn a colour description into a [`Style`].
pub fn parse_color(desc: &str) -> Result<Style, ConfigError> {
    let mut codes: Vec<String> = Vec::new();
    let words: Vec<&str> = desc.split_whitespace().collect();
    let mut i = 0;
    while i < words.len() {
        let attr = match words[i] {
            "bold" => Some("1"),
            "dim" => Some("2"),
            "italic" => Some("3"),
            "underline" => Some("4"),
            "reverse" => Some("7"),
            _ => None,
        };
        if let Some(code) = attr {
            codes.push(code.to_string());
            i += 1;
            continue;
        }
        // "bright red" is one colour spread over two words.
        let (name, used) = match (words[i], words.get(i + 1)) {
            ("bright", Some(next)) => (format!("bright {next}"), 2),
            (word, _) => (word.to_string(), 1),
        };
        let color =
            colored::Color::from_str(&name).map_err(|_| ConfigError::Color(desc.to_string()))?;
        codes.push(color.to_fg_str().into_owned());
        i += used;
    }
    if codes.is_empty() {
        return Ok(Style::plain());
    }
    Ok(Style::new(format!("\x1b[{}m", codes.join(";"))))
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
}

/// Files probed when no configuration is given explicitly, in order.
pub fn default_locations() -> Vec<PathBuf> {
    match config_home() {
        Some(home) => vec![
            home.join(CONFIG_FILE),
            home.join(CONFIG_DIR).join("config.json"),
        ],
        None => Vec::new(),
    }
}

impl Config {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Load the explicit file, or the first existing default location, or
    /// the defaults.  Builtin styles are merged in.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => match default_locations().into_iter().find(|p| p.is_file()) {
                Some(path) => {
                    debug!(path = %path.display(), "using configuration file");
                    Self::read(&path)?
                }
                None => Self::default(),
            },
        };
        config.merge_builtins();
        Ok(config)
    }

    /// Add builtin styles.  Extensions the user mapped elsewhere stay with
    /// the user's style; a user style named like a builtin replaces it.
    pub fn merge_builtins(&mut self) {
        let taken: Vec<String> = self.extensions.values().flatten().cloned().collect();
        for builtin in builtin_styles() {
            self.styles
                .entry(builtin.name.to_string())
                .or_insert(builtin.style);
            let exts = self.extensions.entry(builtin.name.to_string()).or_default();
            for ext in builtin.extensions {
                let ext = ext.to_string();
                if !taken.contains(&ext) && !exts.contains(&ext) {
                    exts.push(ext);
                }
            }
        }
    }

    pub fn filters(&self) -> Result<Vec<Regex>, ConfigError> {
        self.general
            .filters
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Filter {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    pub fn comment_color(&self) -> Result<Option<Style>, ConfigError> {
        self.colors.comment.as_deref().map(parse_color).transpose()
    }

    /// All styles in display order: builtins first, then by name.
    pub fn dump_styles(&self) -> String {
        let builtin_names: Vec<&str> = builtin_styles().iter().map(|b| b.name).collect();
        let rank = |name: &str| {
            builtin_names
                .iter()
                .position(|b| *b == name)
                .unwrap_or(usize::MAX)
        };
        // Keys come sorted; the sort is stable.
        let mut names: Vec<&String> = self.styles.keys().collect();
        names.sort_by_key(|n| rank(n.as_str()));

        let mut out = String::new();
        for name in names {
            let exts = self
                .extensions
                .get(name)
                .map(|e| e.join(", "))
                .unwrap_or_default();
            let _ = writeln!(out, "{name} ({exts}):");
            let _ = writeln!(out, "{}", self.styles[name]);
        }
        out
    }
}

// ── Compiled dialects ─────────────────────────────────────────────────────────

pub struct DialectEntry {
    pub name: String,
    pub style: CommentStyle,
    pub dialect: Dialect,
}

/// Every configured style compiled, indexed by extension.
pub struct Dialects {
    entries: Vec<DialectEntry>,
    by_extension: HashMap<String, usize>,
}

/// Extension used for style lookup; dot files like `.bashrc` use their name.
pub fn extension_of(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension() {
        return Some(ext.to_string_lossy().into_owned());
    }
    let name = path.file_name()?.to_string_lossy();
    name.strip_prefix('.')
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

impl Dialects {
    /// Validate and compile every style.  The first failure names its style.
    pub fn compile(config: &Config) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(config.styles.len());
        let mut positions = HashMap::new();
        for (name, style) in &config.styles {
            let dialect = compile(style).map_err(|source| ConfigError::Style {
                name: name.clone(),
                source,
            })?;
            positions.insert(name.clone(), entries.len());
            entries.push(DialectEntry {
                name: name.clone(),
                style: style.clone(),
                dialect,
            });
        }

        let mut by_extension = HashMap::new();
        for (name, exts) in &config.extensions {
            let Some(&pos) = positions.get(name) else {
                return Err(ConfigError::UnknownStyle(name.clone()));
            };
            for ext in exts {
                by_extension.insert(ext.clone(), pos);
            }
        }
        debug!(
            styles = entries.len(),
            extensions = by_extension.len(),
            "compiled comment dialects"
        );
        Ok(Self {
            entries,
            by_extension,
        })
    }

    pub fn for_path(&self, path: &Path) -> Option<&DialectEntry> {
        let ext = extension_of(path)?;
        self.by_extension.get(&ext).map(|&i| &self.entries[i])
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
