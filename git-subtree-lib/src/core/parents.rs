//! Parent selector: decides which of a commit's parents the
//! traversal should recurse into, detecting subtree-merge and rejoin
//! shapes along the way.

use std::path::Path;

use tracing::{debug, instrument};

use crate::core::classify::{classify, Classification};
use crate::core::error::Result;
use crate::git::{CommitId, EntryKind, Repo, TreeId};

/// The parent selector's verdict for a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSelection {
    /// The parents the traversal should recurse into.
    pub parents: Vec<CommitId>,

    /// Set when `commit` is a rejoin: the traversal should stop recursing
    /// through this node, and the processor should cache-map `commit` to
    /// this value directly instead of classifying and synthesizing it.
    pub rejoin_target: Option<CommitId>,
}

fn subdir_tree_oid(repo: &Repo, commit: CommitId, dir: &Path) -> Result<Option<TreeId>> {
    let commit = repo.find_commit_or_fail(commit)?;
    let tree = commit.get_tree()?;
    let entry = tree.get_path(dir).map_err(crate::git::RepoError::from)?;
    Ok(match entry {
        Some(entry) if entry.kind == EntryKind::Tree => Some(entry.oid),
        _ => None,
    })
}

/// Select the parents to recurse into from `commit`.
#[instrument(skip(repo, store))]
pub fn select_parents(
    repo: &Repo,
    store: &crate::core::store::Store,
    dir: &Path,
    ignore_joins: bool,
    commit: CommitId,
) -> Result<ParentSelection> {
    let commit_obj = repo.find_commit_or_fail(commit)?;
    let parents = commit_obj.get_parent_oids();

    let (first, second) = match parents.as_slice() {
        [first, second] => (*first, *second),
        _ => {
            return Ok(ParentSelection {
                parents,
                rejoin_target: None,
            })
        }
    };

    let t = subdir_tree_oid(repo, commit, dir)?;

    // Identify exactly one parent as mainline-like (subdirectory present)
    // and the other as subtree-like (subdirectory absent).
    let first_has_tree = subdir_tree_oid(repo, first, dir)?.is_some();
    let second_has_tree = subdir_tree_oid(repo, second, dir)?.is_some();
    let (mainline_parent, subtree_parent) = match (first_has_tree, second_has_tree) {
        (true, false) => (first, second),
        (false, true) => (second, first),
        _ => {
            // Not a clean bipartition: both or neither parent has the
            // subdirectory. Fall through unchanged.
            return Ok(ParentSelection {
                parents,
                rejoin_target: None,
            });
        }
    };

    let t_m = subdir_tree_oid(repo, mainline_parent, dir)?;
    let t_s = repo.find_commit_or_fail(subtree_parent)?.get_tree_oid();

    if t.is_some() && t == t_m && t_m == Some(t_s) {
        // Rejoin: the merge's subdirectory tree matches both parents'.
        let subtree_classification = classify(repo, store, dir, ignore_joins, subtree_parent)?;
        let target = match subtree_classification {
            Classification::Split | Classification::Squash => Some(subtree_parent),
            _ => None,
        };
        if let Some(target) = target {
            debug!(%commit, %subtree_parent, "classified as rejoin");
            return Ok(ParentSelection {
                parents: Vec::new(),
                rejoin_target: Some(target),
            });
        }
    }

    if t.is_some() && t == t_m && t_m != Some(t_s) {
        let merge_root_tree = commit_obj.get_tree_oid();
        let mainline_root_tree = repo.find_commit_or_fail(mainline_parent)?.get_tree_oid();
        let subtree_classification = classify(repo, store, dir, ignore_joins, subtree_parent)?;
        let is_split_or_squash = matches!(
            subtree_classification,
            Classification::Split | Classification::Squash
        );
        if merge_root_tree != mainline_root_tree || !is_split_or_squash {
            debug!(%commit, "classified as cross-subtree merge, following only mainline parent");
            return Ok(ParentSelection {
                parents: vec![mainline_parent],
                rejoin_target: None,
            });
        }
    }

    Ok(ParentSelection {
        parents,
        rejoin_target: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Store;
    use crate::testing::make_test_repo;
    use std::path::PathBuf;

    #[test]
    fn non_merge_commit_keeps_its_single_parent() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let head = repo.resolve("HEAD")?;
        let store = Store::in_memory()?;
        let dir = PathBuf::from("sub");
        let selection = select_parents(&repo, &store, &dir, false, head)?;
        assert_eq!(selection.parents.len(), 1);
        assert_eq!(selection.rejoin_target, None);
        Ok(())
    }

    #[test]
    fn unrelated_two_parent_merge_falls_through() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.run(0, &["checkout", "-q", "-b", "topic"])?;
        git.commit_file("topic.txt", 1)?;
        git.run(0, &["checkout", "-q", "master"])?;
        git.commit_file("master.txt", 2)?;
        git.run(3, &["merge", "-q", "--no-ff", "-m", "merge topic", "topic"])?;
        let head = repo.resolve("HEAD")?;
        let store = Store::in_memory()?;
        let dir = PathBuf::from("sub");
        let selection = select_parents(&repo, &store, &dir, false, head)?;
        assert_eq!(selection.parents.len(), 2);
        assert_eq!(selection.rejoin_target, None);
        Ok(())
    }
}
