//! Entry point for the `git-subtree` binary.

use clap::Parser;
use eyre::Context;
use lib::core::effects::Effects;
use lib::git::GitRunInfo;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use git_subtree::commands;
use git_subtree::opts::Opts;

/// Wrapper function for `main` to ensure that `Drop` is called for local
/// variables, since `std::process::exit` will skip them.
fn do_main_and_drop_locals() -> eyre::Result<i32> {
    let opts = Opts::parse();
    let global = opts.global;

    let git_run_info = GitRunInfo::guess().wrap_err("Could not find a `git` executable")?;

    let effects = Effects::new_from_env();
    let effects = if global.quiet {
        effects.suppress()
    } else {
        effects
    };

    let _tracing_guard = install_tracing(effects.clone(), global.debug)?;

    let repo = lib::git::Repo::from_current_dir()?;
    let exit_code = commands::run(&effects, &git_run_info, &repo, opts.command)?;

    Ok(exit_code.into_i32_or_default())
}

/// Execute the main process and exit with the appropriate exit code.
fn main() {
    color_eyre::install().expect("Could not install panic handler");

    let exit_code = do_main_and_drop_locals().expect("A fatal error occurred");
    std::process::exit(exit_code)
}

#[must_use = "This function returns a guard object to flush traces. Dropping it immediately is probably incorrect. Make sure that the returned value lives until tracing has finished."]
fn install_tracing(effects: Effects, debug: bool) -> eyre::Result<impl Drop> {
    let default_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let fmt_layer = tracing_fmt::layer().with_writer(move || effects.clone().get_error_stream());

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;

    struct TracingGuard;
    Ok(TracingGuard)
}
