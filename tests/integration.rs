use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

// ── helpers ──────────────────────────────────────────────────────────────────

fn spellcheck_bin() -> PathBuf {
    // CARGO_BIN_EXE_spellcheck_comments is set by cargo test for integration tests
    PathBuf::from(env!("CARGO_BIN_EXE_spellcheck_comments"))
}

const WORDS: &str = "hello\nworld\nthe\nis\nint\nreturn\nvalue\n";

/// A scratch project: source files, a word list and an isolated config home.
struct TempProject {
    dir: tempfile::TempDir,
}

impl TempProject {
    fn new() -> Self {
        let t = Self {
            dir: tempfile::TempDir::new().unwrap(),
        };
        t.write("words.txt", WORDS);
        // Keep the system dictionary out of the suggestions.
        t.config(r#"{ "general": { "dictionaries": [] } }"#);
        t
    }

    fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }

    fn file(&mut self, name: &str, content: &str) -> &mut Self {
        self.write(name, content);
        self
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    fn exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Replace the configuration picked up from the config home.
    fn config(&self, json: &str) {
        self.write(".cfg/spellcheck_comments.json", json);
    }

    fn command(&self, extra: &[&str]) -> Command {
        let mut cmd = Command::new(spellcheck_bin());
        cmd.current_dir(self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join(".cfg"))
            .env_remove(LOG_ENV)
            .arg("--dict")
            .arg(self.dir.path().join("words.txt"));
        for a in extra {
            cmd.arg(a);
        }
        cmd
    }

    /// Run with the given extra args.  Returns (stdout, stderr, exit_code).
    fn run(&self, extra: &[&str]) -> (String, String, i32) {
        let out = self
            .command(extra)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run spellcheck_comments");
        (
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
            out.status.code().unwrap_or(-1),
        )
    }

    /// Convenience: report mode with --no-exit-code so exit code is always 0.
    fn run_no_exit(&self, extra: &[&str]) -> String {
        let mut args = vec!["--list", "--no-exit-code"];
        args.extend_from_slice(extra);
        let (stdout, _, code) = self.run(&args);
        assert_eq!(code, 0);
        stdout
    }

    /// Run an interactive session answering with `input`.
    fn interact(&self, extra: &[&str], input: &str) -> (String, i32) {
        let mut child = self
            .command(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to run spellcheck_comments");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        let out = child.wait_with_output().unwrap();
        (
            String::from_utf8_lossy(&out.stdout).into_owned(),
            out.status.code().unwrap_or(-1),
        )
    }
}

const LOG_ENV: &str = "SPELLCHECK_COMMENTS_LOG";

// ── report mode ──────────────────────────────────────────────────────────────

#[test]
fn test_clean_file_is_ok() {
    let mut t = TempProject::new();
    t.file("a.c", "// hello world\nint x = 1;\n");
    let (out, _, code) = t.run(&["--list"]);
    assert!(out.contains("All files OK"), "{out}");
    assert_eq!(code, 0);
}

#[test]
fn test_misspelling_is_listed_with_position() {
    let mut t = TempProject::new();
    t.file("a.c", "int x;\n// hello wrold\n");
    let (out, _, code) = t.run(&["--list"]);
    assert!(out.contains("a.c:2:10: wrold (world)"), "{out}");
    assert!(out.contains("Found 1 misspelling(s)"));
    assert_eq!(code, 1);
}

#[test]
fn test_no_exit_code() {
    let mut t = TempProject::new();
    t.file("a.c", "// wrold\n");
    let out = t.run_no_exit(&[]);
    assert!(out.contains("wrold"));
}

#[test]
fn test_json_report() {
    let mut t = TempProject::new();
    t.file("a.c", "// hello wrold\n")
        .file("b.py", "# the valeu\nx = 1\n");
    let (out, _, code) = t.run(&["--json"]);
    assert_eq!(code, 1);
    let doc: serde_json::Value = serde_json::from_str(&out).expect("report is valid JSON");
    assert_eq!(doc["count"], 2);
    let found = doc["misspellings"].as_array().unwrap();
    assert_eq!(found[0]["word"], "wrold");
    assert_eq!(found[0]["line"], 1);
    assert_eq!(found[0]["col"], 10);
    assert_eq!(found[0]["suggestions"][0], "world");
    assert_eq!(found[1]["word"], "valeu");
    assert_eq!(found[1]["suggestions"][0], "value");
}

#[test]
fn test_code_and_strings_are_not_checked() {
    let mut t = TempProject::new();
    t.file(
        "a.c",
        "int wrold = 1;\nchar *s = \"wrold // wrold\";\n/* hello */ int helo;\n",
    );
    let out = t.run_no_exit(&[]);
    assert!(out.contains("All files OK"), "{out}");
}

#[test]
fn test_block_comments_and_builtin_styles() {
    let mut t = TempProject::new();
    t.file("a.rs", "/* hello /* hello */ wrold */\nfn main() {}\n")
        .file("b.py", "\"\"\"\nthe helo\n\"\"\"\n")
        .file("c.sh", "echo '# not a comment' # wrold\n");
    let out = t.run_no_exit(&[]);
    assert!(out.contains("a.rs:1:22: wrold"), "{out}");
    assert!(out.contains("b.py:2:5: helo"), "{out}");
    assert!(out.contains("c.sh:1:26: wrold"), "{out}");
    assert!(!out.contains("not"), "{out}");
}

#[test]
fn test_globs_restrict_files() {
    let mut t = TempProject::new();
    t.file("a.c", "// wrold\n").file("b.rs", "// helo\n");
    let out = t.run_no_exit(&["--globs", "*.rs"]);
    assert!(out.contains("helo"), "{out}");
    assert!(!out.contains("wrold"), "{out}");
}

#[test]
fn test_gitignore_is_respected() {
    let mut t = TempProject::new();
    t.file(".gitignore", "skipped.c\n")
        .file("skipped.c", "// wrold\n")
        .file("kept.c", "// helo\n");
    let out = t.run_no_exit(&[]);
    assert!(out.contains("helo"), "{out}");
    assert!(!out.contains("wrold"), "{out}");
}

#[test]
fn test_explicit_file_path() {
    let mut t = TempProject::new();
    t.file("a.c", "// wrold\n").file("b.c", "// helo\n");
    let out = t.run_no_exit(&["b.c"]);
    assert!(out.contains("helo"), "{out}");
    assert!(!out.contains("wrold"), "{out}");
}

#[test]
fn test_no_files() {
    let mut t = TempProject::new();
    t.file("notes.unknown", "// wrold\n");
    let (out, _, code) = t.run(&["--list"]);
    assert!(out.contains("No files"), "{out}");
    assert_eq!(code, 0);
}

#[test]
fn test_fcc_skips_commented_out_code() {
    let mut t = TempProject::new();
    t.file("a.c", "// int wrold = 1;\n// the helo\n");
    let out = t.run_no_exit(&[]);
    assert!(out.contains("a.c:1:8: wrold"), "{out}");

    let out = t.run_no_exit(&["--fcc"]);
    assert!(!out.contains("wrold"), "{out}");
    assert!(out.contains("a.c:2:8: helo"), "{out}");
}

#[test]
fn test_local_ignore_list() {
    let mut t = TempProject::new();
    t.file("a.c", "// wrold helo\n")
        .file(".spellcheck_comments_ignorelist", "Wrold\n");
    let out = t.run_no_exit(&[]);
    assert!(!out.contains("wrold"), "{out}");
    assert!(out.contains("helo"), "{out}");
}

// ── configuration ────────────────────────────────────────────────────────────

#[test]
fn test_custom_style_from_config() {
    let mut t = TempProject::new();
    t.config(
        r#"{
            "extensions": { "lisp": ["el"] },
            "styles": { "lisp": { "line": [";"], "strings": [{ "begin": "\"", "end": "\"" }] } },
            "general": { "dictionaries": [], "filters": ["^[A-Z]+$"] }
        }"#,
    );
    t.file("a.el", "(setq x \"wrold\") ; helo ABCD\n");
    let out = t.run_no_exit(&[]);
    assert!(out.contains("a.el:1:20: helo"), "{out}");
    assert!(!out.contains("wrold"), "{out}");
    assert!(!out.contains("ABCD"), "{out}");
}

#[test]
fn test_explicit_config_flag() {
    let mut t = TempProject::new();
    t.file(
        "custom.json",
        r#"{ "extensions": { "builtin-#": ["conf"] }, "general": { "dictionaries": [] } }"#,
    )
    .file("a.conf", "# wrold\n");
    let out = t.run_no_exit(&["--config", "custom.json"]);
    assert!(out.contains("a.conf:1:3: wrold"), "{out}");
}

#[test]
fn test_invalid_style_is_fatal() {
    let mut t = TempProject::new();
    t.config(r#"{ "styles": { "broken": { "line": ["123456789"] } } }"#);
    t.file("a.c", "// hello\n");
    let (_, err, code) = t.run(&["--list"]);
    assert_eq!(code, 2);
    assert!(err.contains("error"), "{err}");
    assert!(err.contains("broken"), "{err}");
}

#[test]
fn test_invalid_json_is_fatal() {
    let t = TempProject::new();
    t.config("{ not json");
    let (_, err, code) = t.run(&["--list"]);
    assert_eq!(code, 2);
    assert!(err.contains("invalid configuration"), "{err}");
}

#[test]
fn test_missing_dictionary_is_fatal() {
    let t = TempProject::new();
    let (_, err, code) = t.run(&["--list", "--dict", "does-not-exist.txt"]);
    assert_eq!(code, 2);
    assert!(err.contains("does-not-exist.txt"), "{err}");
}

#[test]
fn test_dump_styles() {
    let t = TempProject::new();
    t.config(r#"{ "styles": { "aaa": { "line": [";"] } }, "extensions": { "aaa": ["el"] } }"#);
    let (out, _, code) = t.run(&["--dump-styles"]);
    assert_eq!(code, 0);
    let c = out.find("builtin-c").unwrap();
    let rust = out.find("builtin-rust").unwrap();
    let custom = out.find("aaa (el)").unwrap();
    assert!(c < rust && rust < custom, "{out}");
}

// ── interactive session ──────────────────────────────────────────────────────

#[test]
fn test_interactive_fix_and_restore_backup() {
    let mut t = TempProject::new();
    t.file("a.c", "int x; // hello wrold\nint y;\n");
    let (out, code) = t.interact(&[], "1\n");
    assert_eq!(code, 0, "{out}");
    assert_eq!(t.read("a.c"), "int x; // hello world\nint y;\n");
    assert!(t.exists("spellcheck_comments.backup.json"));

    let (out, code) = t.interact(&["--apply-backup"], "");
    assert_eq!(code, 0);
    assert!(out.contains("a.c"), "{out}");
    assert_eq!(t.read("a.c"), "int x; // hello wrold\nint y;\n");
}

#[test]
fn test_interactive_replace_all_across_files() {
    let mut t = TempProject::new();
    t.config(r#"{ "general": { "dictionaries": [], "backup": false } }"#);
    t.file("a.c", "// wrold wrold\n").file("b.c", "// Wrold\n");
    let (out, code) = t.interact(&[], "R\nworld\n");
    assert_eq!(code, 0, "{out}");
    assert_eq!(t.read("a.c"), "// world world\n");
    assert_eq!(t.read("b.c"), "// world\n");
    assert!(!t.exists("spellcheck_comments.backup.json"));
}

#[test]
fn test_interactive_end_of_input_discards() {
    let mut t = TempProject::new();
    t.file("a.c", "// wrold helo\n");
    let (_, code) = t.interact(&[], "1\n");
    assert_eq!(code, 0);
    assert_eq!(t.read("a.c"), "// wrold helo\n");
    assert!(!t.exists("spellcheck_comments.backup.json"));
}

#[test]
fn test_interactive_save_ignore() {
    let mut t = TempProject::new();
    t.file("a.c", "// Wrold wrold\n");
    let (out, code) = t.interact(&["--save-ignore"], "I\n");
    assert_eq!(code, 0, "{out}");
    assert_eq!(t.read(".spellcheck_comments_ignorelist"), "wrold\n");

    let out = t.run_no_exit(&[]);
    assert!(out.contains("All files OK"), "{out}");
}

#[test]
fn test_interactive_all_ok() {
    let mut t = TempProject::new();
    t.file("a.c", "// hello world\n");
    let (out, code) = t.interact(&[], "");
    assert_eq!(code, 0);
    assert!(out.contains("All files OK"), "{out}");
}

#[test]
fn test_apply_backup_without_backup() {
    let t = TempProject::new();
    let (out, _, code) = t.run(&["--apply-backup"]);
    assert_eq!(code, 0);
    assert!(out.contains("No backup file in current directory"), "{out}");
}
