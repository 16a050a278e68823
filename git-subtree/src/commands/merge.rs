//! `git subtree merge`: merge a previously-fetched commit into an existing
//! subdirectory.

use lib::core::effects::Effects;
use lib::git::Repo;
use lib::util::ExitCode;
use opts::AddMergeArgs;

use super::common::{self, WrapperKind};

pub fn command_main(
    effects: &Effects,
    repo: &Repo,
    prefix: &std::path::Path,
    commit: &str,
    args: &AddMergeArgs,
) -> eyre::Result<ExitCode> {
    if !repo.exists(&format!("HEAD:{}", prefix.display())) {
        eyre::bail!(
            "prefix '{}' does not exist in HEAD; use `add` to create it first",
            prefix.display()
        );
    }

    let mainline_tip = common::resolve_commit_ish(repo, "HEAD")?;
    let subtree_commit = common::resolve_commit_ish(repo, commit)?;

    let rev_range_summary = format!("changes up to {subtree_commit}");
    let newrev = common::synthesize_wrapper_commit(
        repo,
        effects,
        prefix,
        mainline_tip,
        subtree_commit,
        args,
        WrapperKind::Merge,
        &rev_range_summary,
    )?;

    common::update_head_and_checkout(repo, newrev)?;
    Ok(ExitCode::SUCCESS)
}
