//! Squash, add, and rejoin commit synthesis.

use std::path::Path;

use tracing::instrument;

use crate::core::effects::{Effects, OperationType};
use crate::core::error::Result;
use crate::git::{Commit, CommitId, CommitMetadata, Repo, Tree};

fn trailers(dir: &str, mainline: Option<CommitId>, split: Option<CommitId>) -> String {
    let mut out = format!("\n\ngit-subtree-dir: {dir}\n");
    if let Some(mainline) = mainline {
        out.push_str(&format!("git-subtree-mainline: {mainline}\n"));
    }
    if let Some(split) = split {
        out.push_str(&format!("git-subtree-split: {split}\n"));
    }
    out
}

/// Synthesize (or reuse) the squash commit collapsing the subtree range
/// `(oldsub, newsub]` into a single commit with `newsub`'s root tree.
#[instrument(skip(repo, effects, metadata))]
pub fn synth_squash(
    repo: &Repo,
    effects: &Effects,
    dir: &Path,
    metadata: &CommitMetadata,
    rev_range_summary: &str,
    newsub: CommitId,
    prior_squash: Option<CommitId>,
) -> Result<CommitId> {
    let _progress = effects.start_operation(OperationType::SynthesizeCommit);
    let dir_str = dir.to_string_lossy().into_owned();
    let newsub_commit = repo.find_commit_or_fail(newsub)?;
    let newsub_tree = newsub_commit.get_tree()?;

    let message = format!(
        "{rev_range_summary}{}",
        trailers(&dir_str, None, Some(newsub))
    );

    let parent_commit = prior_squash
        .map(|prior| repo.find_commit_or_fail(prior))
        .transpose()?;
    let parents: Vec<&Commit<'_>> = parent_commit.iter().collect();

    repo.create_commit(metadata, &message, &newsub_tree, &parents)
        .map_err(Into::into)
}

/// Synthesize the `add` merge commit: the current working-tree write,
/// combined with `subtree_commit` (possibly a squash commit) as a second
/// parent.
#[instrument(skip(repo, effects, metadata))]
pub fn synth_add(
    repo: &Repo,
    effects: &Effects,
    dir: &Path,
    metadata: &CommitMetadata,
    message_body: &str,
    mainline_parent: CommitId,
    subtree_commit: CommitId,
    working_tree: &Tree<'_>,
) -> Result<CommitId> {
    synth_merge(
        repo,
        effects,
        dir,
        metadata,
        message_body,
        mainline_parent,
        subtree_commit,
        working_tree,
    )
}

/// Synthesize the `rejoin` commit emitted at the end of `split --rejoin`.
/// Identical in shape to `add`.
#[instrument(skip(repo, effects, metadata))]
pub fn synth_rejoin(
    repo: &Repo,
    effects: &Effects,
    dir: &Path,
    metadata: &CommitMetadata,
    message_body: &str,
    mainline_parent: CommitId,
    split_tip: CommitId,
    working_tree: &Tree<'_>,
) -> Result<CommitId> {
    synth_merge(
        repo,
        effects,
        dir,
        metadata,
        message_body,
        mainline_parent,
        split_tip,
        working_tree,
    )
}

fn synth_merge(
    repo: &Repo,
    effects: &Effects,
    dir: &Path,
    metadata: &CommitMetadata,
    message_body: &str,
    mainline_parent: CommitId,
    second_parent: CommitId,
    working_tree: &Tree<'_>,
) -> Result<CommitId> {
    let _progress = effects.start_operation(OperationType::SynthesizeCommit);
    let dir_str = dir.to_string_lossy().into_owned();
    let mainline_commit = repo.find_commit_or_fail(mainline_parent)?;
    let second_commit = repo.find_commit_or_fail(second_parent)?;

    let message = format!(
        "{message_body}{}",
        trailers(&dir_str, Some(mainline_parent), Some(second_parent))
    );

    repo.create_commit(
        metadata,
        &message,
        working_tree,
        &[&mainline_commit, &second_commit],
    )
    .map_err(Into::into)
}

/// Synthesize the rewritten subtree commit for a processed `mainline:tree`
/// commit (the "copy" outcome of the copy-or-skip decision): tree `T`, parent list `parents`
/// (already deduplicated by the copy-or-skip decider), metadata and message
/// copied from the source commit, optionally prefixed by the annotation
/// prefix.
#[instrument(skip(repo, effects, metadata, parents))]
pub fn synth_copy(
    repo: &Repo,
    effects: &Effects,
    metadata: &CommitMetadata,
    annotate_prefix: Option<&str>,
    original_message: &str,
    tree: &Tree<'_>,
    parents: &[CommitId],
) -> Result<CommitId> {
    let _progress = effects.start_operation(OperationType::SynthesizeCommit);
    let message = match annotate_prefix {
        Some(prefix) => format!("{prefix}{original_message}"),
        None => original_message.to_string(),
    };
    let parent_commits = parents
        .iter()
        .map(|&parent| repo.find_commit_or_fail(parent))
        .collect::<crate::git::RepoResult<Vec<_>>>()?;
    let parent_refs: Vec<&Commit<'_>> = parent_commits.iter().collect();
    repo.create_commit(metadata, &message, tree, &parent_refs)
        .map_err(Into::into)
}

/// The canonical `add` subject line.
pub fn add_subject(dir: &str, split: CommitId) -> String {
    format!("Add '{dir}/' from commit '{split}'")
}

/// The canonical squash-add subject line.
pub fn squash_add_subject(dir: &str, split: CommitId) -> String {
    format!("Merge commit '{split}' as '{dir}'")
}

/// The canonical `split --rejoin` subject line.
pub fn rejoin_subject(dir: &str, split: CommitId) -> String {
    format!("Split '{dir}/' into commit '{split}'")
}

/// The canonical `merge`/`pull` subject line (distinct from `add`'s, so the
/// two commands' history remains distinguishable by message alone).
pub fn merge_subject(dir: &str, split: CommitId) -> String {
    format!("Merge '{dir}/' changes from commit '{split}'")
}
