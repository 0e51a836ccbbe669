mod cli;
mod commands;
mod output;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use cli::{Cli, ColorMode, Commands, GlobalArgs, HookCommand, PreCommitHookCli, UpdateHookCli};
use output::{OutputMode, Reporter};
use pupgate_core::config::{resolve_config, ColorPreference};
use pupgate_core::GateConfig;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    let (globals, command) = parse_invocation(&args);

    init_tracing(globals.verbose);
    tracing::debug!(?command, "parsed invocation");

    let mode = if globals.json {
        OutputMode::Json
    } else if globals.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Human
    };
    let mut reporter = Reporter::new(mode);
    apply_color(globals.color, None);

    let success = match command {
        Commands::Hook { hook } => match load_config_required(&globals, &mut reporter) {
            Some(config) => match hook {
                HookCommand::PreCommit => commands::hook::run_pre_commit(&config, &mut reporter),
                HookCommand::Update(args) => {
                    commands::hook::run_update(&args, &config, &mut reporter)
                }
            },
            None => false,
        },
        Commands::Check { root, files } => match load_config_required(&globals, &mut reporter) {
            Some(config) => {
                commands::check::run_check(root.as_deref(), &files, &config, &mut reporter)
            }
            None => false,
        },
        Commands::Install {
            server,
            force,
            git_dir,
        } => commands::install::run_install(server, force, git_dir.as_deref(), &mut reporter),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pupgate", &mut std::io::stdout());
            true
        }
    };

    reporter.finish();

    if !success {
        std::process::exit(1);
    }
}

/// Pick the command from the name the binary was invoked under.
///
/// Installed (or symlinked) as `update*` or `pre-commit*` the binary behaves
/// as that git hook; under any other name it is the `pupgate` CLI.
fn parse_invocation(args: &[OsString]) -> (GlobalArgs, Commands) {
    let program = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if program.starts_with("update") {
        let parsed = parse_or_exit::<UpdateHookCli>(args);
        let hook = HookCommand::Update(parsed.args);
        (GlobalArgs::default(), Commands::Hook { hook })
    } else if program.starts_with("pre-commit") {
        parse_or_exit::<PreCommitHookCli>(args);
        let hook = HookCommand::PreCommit;
        (GlobalArgs::default(), Commands::Hook { hook })
    } else {
        let cli = parse_or_exit::<Cli>(args);
        (cli.globals, cli.command)
    }
}

/// Like `Parser::parse_from`, but usage errors exit with status 1.
fn parse_or_exit<P: Parser>(args: &[OsString]) -> P {
    match P::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("PUPGATE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn apply_color(flag: Option<ColorMode>, config: Option<ColorPreference>) {
    let preference = match (flag, config) {
        (Some(ColorMode::Always), _) => ColorPreference::Always,
        (Some(ColorMode::Never), _) => ColorPreference::Never,
        (Some(ColorMode::Auto), _) => ColorPreference::Auto,
        (None, Some(pref)) => pref,
        (None, None) => ColorPreference::Auto,
    };
    match preference {
        ColorPreference::Never => colored::control::set_override(false),
        ColorPreference::Always => colored::control::set_override(true),
        ColorPreference::Auto => colored::control::unset_override(),
    }
}

/// Resolves the configuration, reporting an error if it cannot be loaded.
fn load_config_required(globals: &GlobalArgs, reporter: &mut Reporter) -> Option<GateConfig> {
    let cwd = match std::env::current_dir() {
        Ok(c) => c,
        Err(e) => {
            reporter.error(&format!("Cannot get current directory: {e}"));
            return None;
        }
    };

    let explicit = globals
        .config
        .clone()
        .or_else(|| std::env::var_os("PUPGATE_CONFIG").map(PathBuf::from));

    match resolve_config(explicit.as_deref(), &cwd) {
        Ok(config) => {
            apply_color(globals.color, Some(config.color));
            Some(config)
        }
        Err(e) => {
            reporter.error(&format!("Failed to load config: {e}"));
            None
        }
    }
}
