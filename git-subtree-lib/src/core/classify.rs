//! Classifies a mainline commit not already cached.

use std::path::Path;

use tracing::{debug, instrument};

use crate::core::ancestor::has_subtree_ancestor;
use crate::core::annotation::parse_annotation;
use crate::core::error::Result;
use crate::core::store::Store;
use crate::git::{CommitId, EntryKind, Repo};

/// The classifier's verdict for a single commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// On the mainline, and contains the subdirectory.
    MainlineTree,
    /// On the mainline, but does not contain the subdirectory.
    MainlineNoTree,
    /// Itself a subtree commit.
    Split,
    /// A synthesized commit collapsing a range of subtree history.
    Squash,
}

/// Classify `commit`.
#[instrument(skip(repo, store))]
pub fn classify(
    repo: &Repo,
    store: &Store,
    dir: &Path,
    ignore_joins: bool,
    commit: CommitId,
) -> Result<Classification> {
    let dir_str = dir.to_string_lossy().into_owned();

    if let Some(record) = parse_annotation(repo, commit)? {
        if record.dir == dir_str && record.split.is_some() {
            match record.mainline {
                None => {
                    debug!(%commit, "classified as squash via annotation trailer");
                    return Ok(Classification::Squash);
                }
                Some(_) if !ignore_joins => {
                    debug!(%commit, "classified as mainline:tree via prior-join annotation trailer");
                    return Ok(Classification::MainlineTree);
                }
                Some(_) => {
                    // `--ignore-joins`: fall through to the structural test
                    // below, as if no annotation were present.
                }
            }
        }
    }

    let commit_obj = repo.find_commit_or_fail(commit)?;
    let tree = commit_obj.get_tree()?;
    let entry = tree.get_path(dir).map_err(crate::git::RepoError::from)?;
    let has_tree = match entry {
        Some(entry) if entry.kind == EntryKind::Tree => true,
        Some(entry) => {
            debug!(%commit, gitlink = %entry.oid, "subdirectory entry is not a tree (submodule or blob), treating as absent");
            false
        }
        None => false,
    };

    if has_tree {
        return Ok(Classification::MainlineTree);
    }

    if has_subtree_ancestor(repo, store, commit)? {
        Ok(Classification::Split)
    } else {
        Ok(Classification::MainlineNoTree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{CacheValue, Store};
    use crate::testing::make_test_repo;
    use std::path::PathBuf;

    #[test]
    fn commit_without_subdir_is_mainline_notree() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("outside.txt", 1)?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;
        let dir = PathBuf::from("sub");
        assert_eq!(
            classify(&repo, &store, &dir, false, head)?,
            Classification::MainlineNoTree
        );
        Ok(())
    }

    #[test]
    fn commit_with_subdir_is_mainline_tree() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/file.txt", 1)?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;
        let dir = PathBuf::from("sub");
        assert_eq!(
            classify(&repo, &store, &dir, false, head)?,
            Classification::MainlineTree
        );
        Ok(())
    }

    #[test]
    fn notree_with_known_subtree_ancestor_is_split() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/file.txt", 1)?;
        let subtree_commit = repo.resolve("HEAD")?;
        git.run(2, &["rm", "-r", "-q", "sub"])?;
        git.run(2, &["commit", "-q", "-m", "remove sub"])?;
        let head = repo.resolve("HEAD")?;

        let store = Store::in_memory()?;
        store.set_cache(subtree_commit, CacheValue::Commit(subtree_commit))?;

        let dir = PathBuf::from("sub");
        assert_eq!(
            classify(&repo, &store, &dir, false, head)?,
            Classification::Split
        );
        Ok(())
    }
}
