//! Operations on Git tree objects.

use std::path::{Component, Path};

use thiserror::Error;
use tracing::instrument;

use super::oid::TreeId;
use super::repo::Repo;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not read tree entry at path {path}: {source}")]
    ReadTreeEntry { source: git2::Error, path: String },

    #[error("could not construct tree builder: {0}")]
    CreateTreeBuilder(#[source] git2::Error),

    #[error("could not insert entry into tree builder: {0}")]
    InsertTreeBuilderEntry(#[source] git2::Error),

    #[error("could not build tree: {0}")]
    BuildTree(#[source] git2::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of object found at a path inside a tree. Only `Tree` counts as
/// "the subdirectory is present" for the classifier; `Submodule` and
/// `Other` are both treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory tree.
    Tree,
    /// A submodule gitlink.
    Submodule,
    /// A blob or anything else.
    Other,
}

/// A single entry returned by [`Tree::get_path`].
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub oid: TreeId,
}

/// A wrapper around a `git2::Tree`.
#[derive(Clone)]
pub struct Tree<'repo> {
    pub(super) inner: git2::Tree<'repo>,
}

impl std::fmt::Debug for Tree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Tree {}>", self.get_oid())
    }
}

impl<'repo> Tree<'repo> {
    /// Get the OID of this tree.
    pub fn get_oid(&self) -> TreeId {
        TreeId::from(self.inner.id())
    }

    /// Determine if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Look up the entry at `path`, following directory components. Returns
    /// `None` if any component is missing. This is the primitive behind the
    /// repository service's `entry(commit, path)` operation.
    #[instrument]
    pub fn get_path(&self, path: &Path) -> Result<Option<TreeEntry>> {
        match self.inner.get_path(path) {
            Ok(entry) => {
                let kind = match entry.kind() {
                    Some(git2::ObjectType::Tree) => EntryKind::Tree,
                    Some(git2::ObjectType::Commit) => EntryKind::Submodule,
                    _ => EntryKind::Other,
                };
                Ok(Some(TreeEntry {
                    kind,
                    oid: TreeId::from(entry.id()),
                }))
            }
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(Error::ReadTreeEntry {
                source: err,
                path: path.to_string_lossy().into_owned(),
            }),
        }
    }
}

/// Create (and intern) the empty tree.
#[instrument]
pub fn make_empty_tree<'repo>(repo: &'repo Repo) -> Result<Tree<'repo>> {
    let oid = repo
        .inner()
        .treebuilder(None)
        .map_err(Error::CreateTreeBuilder)?
        .write()
        .map_err(Error::BuildTree)?;
    let tree = repo
        .inner()
        .find_tree(oid)
        .map_err(|source| Error::ReadTreeEntry {
            source,
            path: "<empty>".to_string(),
        })?;
    Ok(Tree { inner: tree })
}

/// Build a new tree equal to `base` (or empty, if `base` is `None`) but with
/// `prefix` replaced by the contents of `subtree`. Unlike `git2::TreeBuilder`,
/// which only ever touches a single level, this recurses to build the
/// intermediate directory trees `prefix` may require, which is exactly the
/// write side of the `read_tree_into_prefix`/`write_tree` repository-service
/// operation the `add` command needs.
#[instrument(skip(repo))]
pub fn graft_subtree<'repo>(
    repo: &'repo Repo,
    base: Option<&Tree<'_>>,
    prefix: &Path,
    subtree: &Tree<'_>,
) -> Result<TreeId> {
    let mut components: Vec<Component> = prefix.components().collect();
    let head = match components.first() {
        Some(Component::Normal(name)) => name.to_str().expect("non-utf8 path component"),
        _ => {
            // `prefix` has been fully consumed: replace the whole tree.
            return Ok(subtree.get_oid());
        }
    };
    let rest: std::path::PathBuf = components.drain(1..).collect();

    let base_inner = base.map(|tree| &tree.inner);
    let mut builder = repo
        .inner()
        .treebuilder(base_inner)
        .map_err(Error::CreateTreeBuilder)?;

    let existing_subtree = match base_inner.and_then(|tree| tree.get_name(head)) {
        Some(entry) if entry.kind() == Some(git2::ObjectType::Tree) => repo
            .inner()
            .find_tree(entry.id())
            .ok()
            .map(|inner| Tree { inner }),
        _ => None,
    };

    let new_child_oid = if rest.as_os_str().is_empty() {
        subtree.get_oid()
    } else {
        graft_subtree(repo, existing_subtree.as_ref(), &rest, subtree)?
    };

    let child_tree = repo
        .inner()
        .find_tree(new_child_oid.inner())
        .map_err(|source| Error::ReadTreeEntry {
            source,
            path: head.to_string(),
        })?;
    const GIT_FILEMODE_TREE: i32 = 0o040000;
    builder
        .insert(head, child_tree.id(), GIT_FILEMODE_TREE)
        .map_err(Error::InsertTreeBuilderEntry)?;
    let oid = builder.write().map_err(Error::BuildTree)?;
    Ok(TreeId::from(oid))
}
