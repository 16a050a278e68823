//! `git subtree add`: fetch a remote repository's history and merge it into
//! a new subdirectory.

use lib::core::effects::Effects;
use lib::git::{GitRunInfo, Repo};
use lib::util::ExitCode;
use opts::AddMergeArgs;

use super::common::{self, WrapperKind};

pub fn command_main(
    effects: &Effects,
    git_run_info: &GitRunInfo,
    repo: &Repo,
    prefix: &std::path::Path,
    repository: &str,
    refspec: &str,
    args: &AddMergeArgs,
) -> eyre::Result<ExitCode> {
    if repo.exists(&format!("HEAD:{}", prefix.display())) {
        eyre::bail!(
            "prefix '{}' already exists in HEAD; use `merge` or `pull` to update it",
            prefix.display()
        );
    }

    let mainline_tip = common::resolve_commit_ish(repo, "HEAD")?;
    let subtree_commit = common::fetch(git_run_info, effects, repo, repository, refspec)?;

    let rev_range_summary = format!("1 commit from {repository} {refspec}");
    let newrev = common::synthesize_wrapper_commit(
        repo,
        effects,
        prefix,
        mainline_tip,
        subtree_commit,
        args,
        WrapperKind::Add,
        &rev_range_summary,
    )?;

    common::update_head_and_checkout(repo, newrev)?;
    Ok(ExitCode::SUCCESS)
}
