//! Plumbing shared by the five driver commands: resolving the active
//! repository, turning CLI commit-ish strings into [`CommitId`]s, and the
//! add/merge/pull "wrapper commit" logic that differs from `add` to `merge`
//! only in its default subject line and in whether a fetch precedes it.

use std::path::Path;

use eyre::Context;
use lib::core::effects::Effects;
use lib::core::synth;
use lib::git::{CommitId, CommitMetadata, GitRunInfo, Repo};
use opts::AddMergeArgs;

/// Which non-squash subject line a wrapper commit should default to when
/// `--message` isn't given. Squashed wrapper commits always use
/// [`synth::squash_add_subject`] regardless of which command produced them.
#[derive(Clone, Copy)]
pub enum WrapperKind {
    Add,
    Merge,
}

/// Resolve a CLI-supplied commit-ish string (a ref name, an abbreviated
/// hash, or `FETCH_HEAD`) to a [`CommitId`], with the offending token
/// attached to the error for a clear "bad revision" report.
pub fn resolve_commit_ish(repo: &Repo, rev: &str) -> eyre::Result<CommitId> {
    repo.resolve(rev)
        .wrap_err_with(|| format!("'{rev}' is not a valid commit-ish"))
}

/// The merge commit created by `add`, `merge`, and `pull`: combine the
/// current `HEAD` tree (with `prefix` replaced by `subtree_commit`'s tree)
/// with `subtree_commit` as a second parent, optionally squashing the
/// incoming history into a single commit first.
///
/// Returns the new commit id; the caller is responsible for moving the
/// branch ref and refreshing the working copy.
pub fn synthesize_wrapper_commit(
    repo: &Repo,
    effects: &Effects,
    prefix: &Path,
    mainline_tip: CommitId,
    subtree_commit: CommitId,
    args: &AddMergeArgs,
    kind: WrapperKind,
    rev_range_summary: &str,
) -> eyre::Result<CommitId> {
    let second_parent = if args.squash {
        let prior_squash = lib::core::annotation::find_latest_squash(repo, prefix, mainline_tip)?;
        let subtree_metadata = CommitMetadata::from_commit(&repo.find_commit_or_fail(subtree_commit)?);
        synth::synth_squash(
            repo,
            effects,
            prefix,
            &subtree_metadata,
            rev_range_summary,
            subtree_commit,
            prior_squash,
        )?
    } else {
        subtree_commit
    };

    let mainline_commit = repo.find_commit_or_fail(mainline_tip)?;
    let mainline_tree = mainline_commit.get_tree()?;
    let second_tree = repo.find_commit_or_fail(second_parent)?.get_tree()?;
    let working_tree_oid = repo.graft_subtree(Some(&mainline_tree), prefix, &second_tree)?;
    let working_tree = repo.find_tree(working_tree_oid)?;

    let dir_str = prefix.to_string_lossy().into_owned();
    let message = args.message.clone().unwrap_or_else(|| {
        if args.squash {
            synth::squash_add_subject(&dir_str, second_parent)
        } else {
            match kind {
                WrapperKind::Add => synth::add_subject(&dir_str, second_parent),
                WrapperKind::Merge => synth::merge_subject(&dir_str, second_parent),
            }
        }
    });
    let metadata = CommitMetadata::from_repo_now(repo)?;

    synth::synth_add(
        repo,
        effects,
        prefix,
        &metadata,
        &message,
        mainline_tip,
        second_parent,
        &working_tree,
    )
    .map_err(Into::into)
}

/// Move the current branch to `commit` and reset the index/working copy to
/// match it (the working-copy side of `add`/`merge`/`pull`/`split --rejoin`).
pub fn update_head_and_checkout(repo: &Repo, commit: CommitId) -> eyre::Result<()> {
    let head_ref = repo.head_ref_name()?;
    repo.update_ref(&head_ref, commit, "git-subtree")?;
    repo.checkout_hard(commit)?;
    Ok(())
}

/// Fetch `refspec` from `repository` and resolve the result to a
/// [`CommitId`] via `FETCH_HEAD` (the `add`/`pull` commands' first step).
pub fn fetch(
    git_run_info: &GitRunInfo,
    effects: &Effects,
    repo: &Repo,
    repository: &str,
    refspec: &str,
) -> eyre::Result<CommitId> {
    let exit_code = git_run_info.run(effects, &["fetch", repository, refspec])?;
    if !exit_code.is_success() {
        eyre::bail!("`git fetch {repository} {refspec}` failed with {exit_code}");
    }
    resolve_commit_ish(repo, "FETCH_HEAD")
}
