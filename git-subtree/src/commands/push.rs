//! `git subtree push`: split the subdirectory's history out and push the
//! result to a remote repository.

use std::path::Path;

use lib::core::effects::Effects;
use lib::git::{GitRunInfo, Repo};
use lib::util::ExitCode;
use opts::RememberArg;

use super::{common, split};

pub fn command_main(
    effects: &Effects,
    git_run_info: &GitRunInfo,
    repo: &Repo,
    prefix: &Path,
    repository: &str,
    refspec: &str,
    annotate: Option<&str>,
    ignore_joins: bool,
    onto: &[String],
    notree: &[String],
    remember: &[RememberArg],
) -> eyre::Result<ExitCode> {
    let tip = common::resolve_commit_ish(repo, "HEAD")?;
    let newrev = split::run_split(
        effects,
        repo,
        prefix,
        annotate,
        ignore_joins,
        onto,
        notree,
        remember,
        tip,
    )?;

    let local_ref = format!("{newrev}:{refspec}");
    let exit_code = git_run_info.run(effects, &["push", repository, &local_ref])?;
    if !exit_code.is_success() {
        eyre::bail!("`git push {repository} {local_ref}` failed with {exit_code}");
    }
    Ok(ExitCode::SUCCESS)
}
