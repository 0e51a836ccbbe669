#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub fn pupgate_cmd() -> assert_cmd::Command {
    cargo_bin_cmd!("pupgate")
}

/// Stand-in for `puppet parser validate --color=false FILE`: fails on files
/// containing BROKEN, with colored output, and hangs on SLOW.
const FAKE_PUPPET: &str = r#"#!/bin/sh
file="$4"
if grep -q SLOW "$file"; then exec sleep 30; fi
if grep -q BROKEN "$file"; then
  printf '\033[31mError:\033[0m syntax error line 4 (file: %s)\n' "$file" >&2
  exit 1
fi
exit 0
"#;

/// Stand-in for `puppet-lint [flags] FILE`: fails on files containing UGLY.
const FAKE_PUPPET_LINT: &str = r#"#!/bin/sh
for arg; do file="$arg"; done
if grep -q UGLY "$file"; then
  echo "$file - WARNING: double quoted string containing no variables on line 1"
  exit 1
fi
exit 0
"#;

/// Stand-in for `ruby -e SCRIPT FILE` (always exits 0, complains on stderr
/// about files containing BAD) and `ruby -c` (fails on BROKEN input).
const FAKE_RUBY: &str = r#"#!/bin/sh
if [ "$1" = "-e" ]; then
  if grep -q BAD "$3"; then echo "$3: did not find expected key while parsing a block mapping" >&2; fi
  exit 0
fi
if [ "$1" = "-c" ]; then
  input=$(cat)
  case "$input" in
    *BROKEN*) echo "-:3: syntax error, unexpected end-of-input" >&2; exit 1;;
  esac
  echo "Syntax OK"
  exit 0
fi
exit 2
"#;

/// Stand-in for `erb -P -x -T - FILE`.
const FAKE_ERB: &str = r#"#!/bin/sh
cat "$5"
"#;

/// A directory of fake validator tools.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for (name, body) in [
            ("puppet", FAKE_PUPPET),
            ("puppet-lint", FAKE_PUPPET_LINT),
            ("ruby", FAKE_RUBY),
            ("erb", FAKE_ERB),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, body).unwrap();
            make_executable(&path);
        }
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Point a command at the fake tools and isolate it from the caller's
    /// pupgate settings.
    pub fn configure(&self, cmd: &mut assert_cmd::Command) {
        cmd.env("PUPGATE_PUPPET", self.path("puppet"))
            .env("PUPGATE_PUPPET_LINT", self.path("puppet-lint"))
            .env("PUPGATE_RUBY", self.path("ruby"))
            .env("PUPGATE_ERB", self.path("erb"))
            .env("PUPGATE_TIMEOUT", "30")
            .env_remove("PUPGATE_CONFIG")
            .env_remove("PUPGATE_LOG");
    }
}

pub fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q", "-b", "main"]);
    git(dir, &["config", "user.email", "gate@example.com"]);
    git(dir, &["config", "user.name", "Gate Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "--allow-empty", "--no-verify", "-m", message]);
    git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

/// Symlink the built binary under a hook name so it is dispatched by argv[0].
pub fn hook_binary(dir: &Path, name: &str) -> PathBuf {
    let link = dir.join(name);
    std::os::unix::fs::symlink(env!("CARGO_BIN_EXE_pupgate"), &link).unwrap();
    link
}

pub fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}
