use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "pupgate",
    version,
    about = "Validate Puppet manifests, ERB templates and YAML data before they enter git"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub globals: GlobalArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Color mode (defaults to the config file setting)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Path to a .pupgate.json config (overrides discovery and PUPGATE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run as a git hook
    Hook {
        #[command(subcommand)]
        hook: HookCommand,
    },

    /// Check files in a directory without involving git
    Check {
        /// Directory the file paths are relative to
        #[arg(long)]
        root: Option<PathBuf>,

        /// Files to check
        files: Vec<PathBuf>,
    },

    /// Install pupgate as a native git hook
    Install {
        /// Install the server-side update hook instead of pre-commit
        #[arg(long)]
        server: bool,

        /// Replace an existing hook not written by pupgate
        #[arg(long)]
        force: bool,

        /// Repository to install into (defaults to the current directory)
        #[arg(long)]
        git_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum HookCommand {
    /// Check the staged content of the work tree
    PreCommit,
    /// Check a pushed revision (server-side update hook)
    Update(UpdateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Name of the ref being updated
    pub refname: String,
    /// Old object id (all zeros when the ref is created)
    pub old: String,
    /// New object id (all zeros when the ref is deleted)
    pub new: String,
}

/// Arguments when the binary is installed under the name `update`.
#[derive(Parser, Debug)]
#[command(name = "update", about = "pupgate server-side update hook")]
pub struct UpdateHookCli {
    #[command(flatten)]
    pub args: UpdateArgs,
}

/// Arguments when the binary is installed under the name `pre-commit`.
#[derive(Parser, Debug)]
#[command(name = "pre-commit", about = "pupgate pre-commit hook")]
pub struct PreCommitHookCli {}
