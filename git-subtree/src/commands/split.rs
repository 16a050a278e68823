//! `git subtree split`: project the subdirectory's history into its own
//! independent commit history.

use std::io::Write as _;
use std::path::Path;

use lib::core::effects::Effects;
use lib::core::{config, synth, Engine, EngineOptions, Error as EngineError, RememberPair};
use lib::git::{CommitId, CommitMetadata, Repo};
use lib::util::ExitCode;
use opts::SplitArgs;

use super::common;

/// Run the split engine against `tip` and return the synthesized subtree
/// tip. Shared by `split` and `push` (push is "split, then push the
/// result").
pub fn run_split(
    effects: &Effects,
    repo: &Repo,
    prefix: &Path,
    annotate: Option<&str>,
    ignore_joins: bool,
    onto: &[String],
    notree: &[String],
    remember: &[opts::RememberArg],
    tip: CommitId,
) -> eyre::Result<CommitId> {
    let annotate_prefix = match annotate {
        Some(prefix) => Some(prefix.to_string()),
        None => config::get_default_annotate_prefix(repo)?,
    };
    let preseeded_notree: Vec<CommitId> = onto
        .iter()
        .chain(notree.iter())
        .map(|rev| common::resolve_commit_ish(repo, rev))
        .collect::<eyre::Result<_>>()?;
    let remember_pairs: Vec<RememberPair> = remember
        .iter()
        .map(|arg| {
            RememberPair::parse(&format!("{}:{}", arg.before, arg.after))
                .map_err(|reason| eyre::eyre!(reason))
        })
        .collect::<eyre::Result<_>>()?;

    let options = EngineOptions {
        annotate_prefix,
        ignore_joins,
        preseeded_notree,
        remember: remember_pairs,
    };
    let mut engine = Engine::new(effects.clone(), prefix, options)?;
    Ok(engine.run(repo, tip)?)
}

pub fn command_main(
    effects: &Effects,
    repo: &Repo,
    prefix: &Path,
    split: &SplitArgs,
) -> eyre::Result<ExitCode> {
    let tip = common::resolve_commit_ish(repo, "HEAD")?;
    let newrev = run_split(
        effects,
        repo,
        prefix,
        split.annotate.as_deref(),
        split.ignore_joins,
        &split.onto,
        &split.notree,
        &split.remember,
        tip,
    )?;

    if let Some(branch) = &split.branch {
        let branch_ref = format!("refs/heads/{branch}");
        if repo.exists(&branch_ref) {
            let existing = repo.resolve(&branch_ref)?;
            if !repo.is_ancestor(existing, newrev)? {
                return Err(EngineError::BranchNotAncestor {
                    branch: branch.clone(),
                    tip: newrev,
                }
                .into());
            }
        }
        repo.update_ref(&branch_ref, newrev, "git subtree split")?;
    }

    if split.rejoin {
        let mainline_commit = repo.find_commit_or_fail(tip)?;
        let mainline_tree = mainline_commit.get_tree()?;
        let split_tree = repo.find_commit_or_fail(newrev)?.get_tree()?;
        let working_tree_oid = repo.graft_subtree(Some(&mainline_tree), prefix, &split_tree)?;
        let working_tree = repo.find_tree(working_tree_oid)?;
        let metadata = CommitMetadata::from_repo_now(repo)?;
        let dir_str = prefix.to_string_lossy().into_owned();
        let message = synth::rejoin_subject(&dir_str, newrev);

        let rejoin_commit = synth::synth_rejoin(
            repo,
            effects,
            prefix,
            &metadata,
            &message,
            tip,
            newrev,
            &working_tree,
        )?;
        common::update_head_and_checkout(repo, rejoin_commit)?;
    }

    writeln!(effects.get_output_stream(), "{newrev}")?;
    Ok(ExitCode::SUCCESS)
}
