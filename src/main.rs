use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use spellcheck_comments::backup::{Backup, RestoreOutcome};
use spellcheck_comments::checker::{SessionOptions, SpellChecker};
use spellcheck_comments::config::{
    CONFIG_DIR, Config, DEFAULT_IGNORE_LIST, Dialects, config_home, parse_color,
};
use spellcheck_comments::discovery::discover_files;
use spellcheck_comments::ignore_list::{IgnoreList, append_words};
use spellcheck_comments::pipeline::{FileParser, report, spawn_parser};
use spellcheck_comments::speller::DictionarySpeller;
use spellcheck_comments::terminal::{Display, TerminalFrontend};
use spellcheck_comments::types::Misspelling;

const LOG_ENV: &str = "SPELLCHECK_COMMENTS_LOG";

#[derive(Parser)]
#[command(
    name = "spellcheck_comments",
    about = "Spell check the comments in source files",
    version,
    long_about = "Finds misspelled words in source code comments (and only comments) and \
                  lets you fix, ignore or replace them interactively.\n\n\
                  Use --list or --json for a non-interactive report."
)]
struct Cli {
    /// Files or directories to check.
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Only check files matching one of the comma-separated globs
    /// (e.g. --globs '*.rs,*.c').
    #[arg(long, value_delimiter = ',')]
    globs: Option<Vec<String>>,

    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra word list for the spelling dictionary (repeatable).
    #[arg(long = "dict")]
    dicts: Vec<PathBuf>,

    /// Store a backup of changed lines even if disabled in the configuration.
    #[arg(long)]
    with_backup: bool,

    /// Restore the backup in the current directory and exit.
    #[arg(long)]
    apply_backup: bool,

    /// Print every known comment style and exit.
    #[arg(long)]
    dump_styles: bool,

    /// Skip words in comments that look like commented-out code.
    #[arg(long)]
    fcc: bool,

    /// Append words ignored with "ignore all" to a local ignore list.
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_IGNORE_LIST
    )]
    save_ignore: Option<PathBuf>,

    /// Print the flagged words instead of starting an interactive session.
    #[arg(long)]
    list: bool,

    /// Emit the report as JSON (implies --list).
    #[arg(long)]
    json: bool,

    /// Exit with code 0 even when misspellings are reported.
    #[arg(long)]
    no_exit_code: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("could not determine working directory")?;

    // ── backup restore ────────────────────────────────────────────────────────
    if cli.apply_backup {
        apply_backup(&cwd)?;
        return Ok(0);
    }

    // ── configuration ─────────────────────────────────────────────────────────
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.dump_styles {
        print!("{}", config.dump_styles());
        return Ok(0);
    }
    config.general.filter_commented_code |= cli.fcc;
    config.general.backup |= cli.with_backup;

    let dialects = Dialects::compile(&config)?;
    let exclude = config.filters()?;
    let comment_color = config.comment_color()?;
    let display = Display {
        tab_size: config.general.tab_size,
        highlight: parse_color(&config.colors.highlight)?,
        line_number: parse_color(&config.colors.line_number)?,
    };

    // ── ignore list and dictionary ────────────────────────────────────────────
    let mut ignore = IgnoreList::with_defaults(config.general.ignore_case);
    let mut dirs: Vec<PathBuf> = vec![cwd.clone()];
    if let Some(home) = config_home() {
        dirs.push(home.join(CONFIG_DIR));
    }
    if let Some(dir) = cli.config.as_deref().and_then(Path::parent) {
        dirs.push(dir.to_path_buf());
    }
    let dir_refs: Vec<&Path> = dirs.iter().map(PathBuf::as_path).collect();
    ignore.load(&config.general.ignore_lists, &dir_refs);

    let mut speller = DictionarySpeller::new();
    for path in &config.general.dictionaries {
        if let Err(e) = speller.load(path) {
            warn!("{e:#}");
        }
    }
    for path in &cli.dicts {
        speller.load(path)?;
    }
    if speller.is_empty() {
        bail!("no dictionary words loaded; configure general.dictionaries or pass --dict");
    }
    debug!(words = speller.len(), ignored = ignore.len(), "dictionary ready");

    // ── file discovery ────────────────────────────────────────────────────────
    let globs = cli.globs.clone().unwrap_or_default();
    let mut files = Vec::new();
    for path in &cli.paths {
        if path.is_file() {
            if dialects.for_path(path).is_some() {
                files.push(path.clone());
            } else {
                warn!(path = %path.display(), "no comment style for file");
            }
        } else {
            files.extend(discover_files(path, &globs, |p| {
                dialects.for_path(p).is_some()
            })?);
        }
    }
    if files.is_empty() {
        println!("No files");
        return Ok(0);
    }

    let parser = FileParser {
        dialects,
        speller: Arc::new(speller),
        ignore,
        exclude,
        highlight_commands: config.general.highlight_commands.clone(),
        dim_code: config.general.dim_code,
        filter_commented_code: config.general.filter_commented_code,
        comment_color,
    };

    // ── report mode ───────────────────────────────────────────────────────────
    if cli.list || cli.json {
        let found = report(&parser, &files, config.general.suggestions);
        if cli.json {
            print_json(&found)?;
        } else {
            for m in &found {
                println!("{m}");
            }
            if found.is_empty() {
                println!("{}", "All files OK".green());
            } else {
                let count = found.len();
                println!("{}", format!("Found {count} misspelling(s)").yellow().bold());
            }
        }
        let code = if !cli.no_exit_code && !found.is_empty() {
            1
        } else {
            0
        };
        return Ok(code);
    }

    // ── interactive session ───────────────────────────────────────────────────
    let parser = Arc::new(parser);
    let speller = Arc::clone(&parser.speller);
    let received = spawn_parser(parser, files);

    let interrupted = Arc::new(AtomicBool::new(false));
    let stdin = io::stdin();
    let mut checker = SpellChecker::new(
        TerminalFrontend::new(stdin.lock(), io::stdout(), display, Arc::clone(&interrupted)),
        speller,
        SessionOptions {
            ignore_case: config.general.ignore_case,
            suggestions: config.general.suggestions,
        },
    );
    let on_interrupt = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        on_interrupt.store(true, Ordering::SeqCst);
    })
    .context("could not install the Ctrl-C handler")?;
    checker.set_interrupt_handle(interrupted);

    let mut all_ok = true;
    for file in received {
        all_ok = false;
        checker.add_file(file);
        if checker.run()? {
            break;
        }
    }

    let backup_dir = config.general.backup.then_some(cwd.as_path());
    let finished = checker.finish(backup_dir)?;
    for (path, e) in &finished.failed {
        eprintln!("{}: {}: {e:#}", "error".red().bold(), path.display());
    }
    if !finished.written.is_empty() {
        println!(
            "{}",
            format!("Wrote {} file(s)", finished.written.len()).green()
        );
    }
    if let Some(path) = &finished.backup {
        println!("Backup saved to {}", path.display());
    }

    if all_ok {
        println!("{}", "All files OK".green());
    } else if let Some(path) = &cli.save_ignore {
        let words = checker.ignored_words();
        if !words.is_empty() {
            append_words(path, words)
                .with_context(|| format!("writing ignore list {} failed", path.display()))?;
            println!("Saved {} word(s) to {}", words.len(), path.display());
        }
    }
    Ok(if finished.failed.is_empty() { 0 } else { 2 })
}

fn apply_backup(cwd: &Path) -> Result<()> {
    let Some(backup) = Backup::load(cwd)? else {
        println!("No backup file in current directory");
        return Ok(());
    };
    for outcome in backup.restore() {
        match outcome {
            RestoreOutcome::Restored(path) => {
                println!("{} {}", "✓".green(), relative(cwd, &path).display())
            }
            RestoreOutcome::Outdated(path) => println!(
                "{} {} (file changed since backup, skipped)",
                "⚠".yellow(),
                relative(cwd, &path).display()
            ),
            RestoreOutcome::Failed(path, e) => println!(
                "{} {}: {e:#}",
                "✗".red(),
                relative(cwd, &path).display()
            ),
        }
    }
    Ok(())
}

fn relative<'a>(cwd: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(cwd).unwrap_or(path)
}

/// Emit valid, well-formatted JSON using serde_json.
fn print_json(found: &[Misspelling]) -> Result<()> {
    let output = json!({
        "misspellings": found,
        "count":        found.len(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
