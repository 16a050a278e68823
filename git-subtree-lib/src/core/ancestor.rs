//! The classifier's "does `commit` have any ancestor that is a known
//! subtree commit?" test.
//!
//! The naive approach — check every known subtree commit against `commit`
//! directly — is correct but can issue one ancestor query per known commit,
//! which is wasteful once a split has produced thousands of subtree
//! commits. Instead the known set is first reduced to its independent tips
//! (dropping any commit that is itself an ancestor of another commit in the
//! set), since only a tip can possibly be the *nearest* subtree ancestor of
//! `commit`, and checking the reduced set is both cheaper and sufficient.

use tracing::instrument;

use crate::core::error::Result;
use crate::core::store::Store;
use crate::git::{CommitId, Repo};

/// Commits are batched through `select_independent_tips` in chunks of this
/// size, bounding the worst-case quadratic cost of the reduction on
/// pathological histories. Not user-configurable.
const CHUNK_SIZE: usize = 256;

/// Repeatedly reduce `commits` to its independent tips until the set size
/// stops shrinking. The reduction is a fixpoint of a monotone operation, so
/// this always converges; ordering within the result is not significant.
#[instrument(skip(repo))]
fn reduce_to_independent_tips(repo: &Repo, mut commits: Vec<CommitId>) -> Result<Vec<CommitId>> {
    loop {
        let mut reduced = Vec::with_capacity(commits.len());
        for chunk in commits.chunks(CHUNK_SIZE) {
            reduced.extend(repo.select_independent_tips(chunk)?);
        }
        // A chunked reduction can still leave cross-chunk ancestors in
        // place; repeat until a full pass makes no further progress.
        if reduced.len() == commits.len() {
            return Ok(reduced);
        }
        commits = reduced;
    }
}

/// Does `commit` have any ancestor that the cache already knows is a
/// subtree commit?
#[instrument(skip(repo, store))]
pub fn has_subtree_ancestor(repo: &Repo, store: &Store, commit: CommitId) -> Result<bool> {
    let known = store.known_subtree_commits()?;
    if known.is_empty() {
        return Ok(false);
    }
    let candidates = reduce_to_independent_tips(repo, known)?;
    for candidate in candidates {
        if candidate == commit {
            continue;
        }
        if repo.is_ancestor(candidate, commit)? {
            return Ok(true);
        }
    }
    Ok(false)
}
