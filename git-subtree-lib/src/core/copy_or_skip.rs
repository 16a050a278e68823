//! Copy-or-skip decider: given a commit's rewritten parent list,
//! decide whether an existing parent can stand in for it (skip) or a fresh
//! commit must be synthesized (copy).

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::core::error::Result;
use crate::git::{CommitId, Repo, TreeId};

/// The decider's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Reuse this existing commit as the rewrite of `c`; no new commit is
    /// synthesized.
    Skip(CommitId),

    /// Synthesize a new commit with this (deduplicated, order-preserving)
    /// parent list.
    Copy(Vec<CommitId>),
}

fn dedup_preserving_order(commits: &[CommitId]) -> Vec<CommitId> {
    let mut seen = HashSet::new();
    commits
        .iter()
        .copied()
        .filter(|commit| seen.insert(*commit))
        .collect()
}

/// Decide whether `new_parents` (the rewritten parent list of some commit
/// `c`, whose desired tree is `target_tree`) calls for a skip or a copy.
#[instrument(skip(repo))]
pub fn decide(repo: &Repo, target_tree: TreeId, new_parents: &[CommitId]) -> Result<Decision> {
    let mut identical = Vec::new();
    let mut non_identical = Vec::new();
    for &parent in new_parents {
        let tree = repo.find_commit_or_fail(parent)?.get_tree_oid();
        if tree == target_tree {
            identical.push(parent);
        } else {
            non_identical.push(parent);
        }
    }

    // Reducing the identical set to its independent tips collapses an
    // identical ancestor into its identical descendant, and leaves genuinely
    // unrelated identical parents (which must both be preserved) in place.
    let reduced_identical = repo.select_independent_tips(&identical)?;
    let reduced_identical_set: HashSet<CommitId> = reduced_identical.iter().copied().collect();

    if reduced_identical.len() == 1 && non_identical.is_empty() {
        let only = reduced_identical[0];
        debug!(commit = %only, "copy-or-skip: skip");
        return Ok(Decision::Skip(only));
    }

    let identical_set: HashSet<CommitId> = identical.iter().copied().collect();
    let final_parents: Vec<CommitId> = new_parents
        .iter()
        .copied()
        .filter(|parent| !identical_set.contains(parent) || reduced_identical_set.contains(parent))
        .collect();
    let final_parents = dedup_preserving_order(&final_parents);
    debug!(parents = ?final_parents, "copy-or-skip: copy");
    Ok(Decision::Copy(final_parents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_test_repo;

    #[test]
    fn single_identical_parent_skips() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let parent = repo.resolve("HEAD")?;
        let tree = repo.find_commit_or_fail(parent)?.get_tree_oid();

        let decision = decide(&repo, tree, &[parent])?;
        assert_eq!(decision, Decision::Skip(parent));
        Ok(())
    }

    #[test]
    fn duplicate_parents_are_deduplicated() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let parent = repo.resolve("HEAD")?;
        let tree = repo.find_commit_or_fail(parent)?.get_tree_oid();

        let decision = decide(&repo, tree, &[parent, parent])?;
        assert_eq!(decision, Decision::Skip(parent));
        Ok(())
    }

    #[test]
    fn unrelated_identical_parents_force_a_copy() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        let base_tree = repo
            .find_commit_or_fail(repo.resolve("HEAD")?)?
            .get_tree_oid();

        git.run(0, &["checkout", "-q", "-b", "other"])?;
        // Keep the tree identical to the base (empty commit) so both
        // branches end up with the same root tree despite diverging history.
        git.run(1, &["commit", "-q", "--allow-empty", "-m", "other side"])?;
        let other_tip = repo.resolve("other")?;
        git.run(0, &["checkout", "-q", "master"])?;
        git.run(2, &["commit", "-q", "--allow-empty", "-m", "master side"])?;
        let master_tip = repo.resolve("master")?;

        let decision = decide(&repo, base_tree, &[master_tip, other_tip])?;
        match decision {
            Decision::Copy(parents) => {
                assert_eq!(parents.len(), 2);
            }
            Decision::Skip(_) => panic!("expected a forced copy for unrelated identical parents"),
        }
        Ok(())
    }

    #[test]
    fn identical_and_non_identical_parents_copy() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let identical = repo.resolve("HEAD")?;
        let identical_tree = repo.find_commit_or_fail(identical)?.get_tree_oid();
        git.commit_file("b.txt", 2)?;
        let non_identical = repo.resolve("HEAD")?;

        let decision = decide(&repo, identical_tree, &[identical, non_identical])?;
        match decision {
            Decision::Copy(parents) => {
                assert_eq!(parents, vec![identical, non_identical]);
            }
            Decision::Skip(_) => panic!("expected a copy when a non-identical parent is present"),
        }
        Ok(())
    }
}
