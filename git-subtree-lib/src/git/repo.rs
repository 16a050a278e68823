//! Operations on the Git repository.
//!
//! This module exists for a few reasons:
//!
//! - To ensure that every call to a Git operation has an associated error
//!   variant for use with `?`.
//! - To improve the interface in some cases. In particular, some operations in
//!   `git2` return an `Error` with code `ENOTFOUND`, but we should really
//!   return an `Option` in those cases.
//! - To collect the handful of Git primitives the split engine actually needs
//!   behind one auditable surface.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;

use super::object::Commit;
use super::oid::{CommitId, TreeId};
use super::tree::{self, Tree};

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open repository: {0}")]
    OpenRepo(#[source] git2::Error),

    #[error("this repository does not have an associated working copy")]
    NoWorkingCopyPath,

    #[error("could not find commit {oid}: {source}")]
    FindCommit { source: git2::Error, oid: CommitId },

    #[error("could not find tree {oid}: {source}")]
    FindTree { source: git2::Error, oid: TreeId },

    #[error("could not resolve revision {rev}: {source}")]
    ResolveRevision { rev: String, source: git2::Error },

    #[error("could not create commit: {0}")]
    CreateCommit(#[source] git2::Error),

    #[error("could not update reference {name}: {source}")]
    UpdateRef { name: String, source: git2::Error },

    #[error("could not determine ancestor relationship between {lhs} and {rhs}: {source}")]
    GraphDescendantOf {
        lhs: CommitId,
        rhs: CommitId,
        source: git2::Error,
    },

    #[error("could not walk revisions: {0}")]
    Revwalk(#[source] git2::Error),

    #[error("could not read message trailers: {0}")]
    ReadMessageTrailer(#[source] git2::Error),

    #[error("could not decode {item} as UTF-8")]
    DecodeUtf8 { item: &'static str },

    #[error(transparent)]
    Tree(#[from] tree::Error),

    #[error("could not write index as tree: {0}")]
    WriteIndexToTree(#[source] git2::Error),

    #[error("could not read index: {0}")]
    ReadIndex(#[source] git2::Error),

    #[error(transparent)]
    Git(#[source] git2::Error),

    #[error("could not determine author/committer identity from Git configuration: {0}")]
    Signature(#[source] git2::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Author/committer metadata, copied verbatim when synthesizing a subtree
/// commit.
#[derive(Debug, Clone)]
pub struct CommitMetadata {
    pub author_name: String,
    pub author_email: String,
    pub author_time: git2::Time,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_time: git2::Time,
}

impl CommitMetadata {
    /// Extract metadata from a commit's author/committer signatures.
    pub fn from_commit(commit: &Commit) -> Self {
        let author = commit.get_author();
        let committer = commit.get_committer();
        CommitMetadata {
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time: author.when(),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            committer_time: committer.when(),
        }
    }

    fn author_signature(&self) -> std::result::Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::new(&self.author_name, &self.author_email, &self.author_time)
    }

    fn committer_signature(&self) -> std::result::Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::new(
            &self.committer_name,
            &self.committer_email,
            &self.committer_time,
        )
    }

    /// Build metadata for a fresh commit (an `add`/`merge`/`pull` merge
    /// commit, which has no prior commit to copy identity from) from the
    /// repository's configured `user.name`/`user.email` and the current
    /// time.
    pub fn from_repo_now(repo: &Repo) -> Result<Self> {
        let signature = repo.inner.signature().map_err(Error::Signature)?;
        let name = signature.name().unwrap_or("").to_string();
        let email = signature.email().unwrap_or("").to_string();
        let when = signature.when();
        Ok(CommitMetadata {
            author_name: name.clone(),
            author_email: email.clone(),
            author_time: when,
            committer_name: name,
            committer_email: email,
            committer_time: when,
        })
    }
}

/// A thin wrapper around `git2::Repository`.
pub struct Repo {
    inner: git2::Repository,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Repo path={:?}>", self.inner.path())
    }
}

impl Repo {
    /// Open the repository containing the current working directory.
    #[instrument]
    pub fn from_current_dir() -> Result<Self> {
        let path = std::env::current_dir().map_err(|err| Error::OpenRepo(git2::Error::from_str(&err.to_string())))?;
        Self::from_dir(&path)
    }

    /// Open the repository at or above `path`.
    #[instrument]
    pub fn from_dir(path: &Path) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(Error::OpenRepo)?;
        Ok(Repo { inner })
    }

    /// Access the underlying `git2::Repository`, for the handful of
    /// operations (tree-building, the working-tree index) that don't have a
    /// dedicated wrapper.
    pub(super) fn inner(&self) -> &git2::Repository {
        &self.inner
    }

    /// The `.git` directory (or the worktree-specific administrative
    /// directory, for a linked worktree).
    pub fn get_path(&self) -> &Path {
        self.inner.path()
    }

    /// The working copy root, if any (`None` for a bare repository).
    pub fn get_working_copy_path(&self) -> Option<PathBuf> {
        self.inner.workdir().map(Path::to_path_buf)
    }

    /// A read-only view of the repository's (possibly layered, local +
    /// global) Git configuration, for `core::config` to read tool defaults
    /// out of (`subtree.annotate`, `subtree.cacheOnDisk`).
    #[instrument]
    pub fn get_readonly_config(&self) -> Result<git2::Config> {
        self.inner.config().map_err(Error::Git)
    }

    /// `resolve(ref) → CommitId`. Accepts anything `git2` can
    /// `revparse_single`: an OID, an abbreviated OID, a branch or tag name.
    #[instrument]
    pub fn resolve(&self, rev: &str) -> Result<CommitId> {
        let object = self
            .inner
            .revparse_single(rev)
            .map_err(|source| Error::ResolveRevision {
                rev: rev.to_string(),
                source,
            })?;
        let commit = object.peel_to_commit().map_err(|source| Error::ResolveRevision {
            rev: rev.to_string(),
            source,
        })?;
        Ok(CommitId::from(commit.id()))
    }

    /// `exists(ref) → bool`.
    pub fn exists(&self, rev: &str) -> bool {
        self.inner.revparse_single(rev).is_ok()
    }

    /// Find a commit, returning `Ok(None)` if it does not exist.
    #[instrument]
    pub fn find_commit(&self, oid: CommitId) -> Result<Option<Commit<'_>>> {
        match self.inner.find_commit(oid.inner()) {
            Ok(commit) => Ok(Some(Commit { inner: commit })),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(Error::FindCommit { source: err, oid }),
        }
    }

    /// Find a commit, failing if it does not exist.
    #[instrument]
    pub fn find_commit_or_fail(&self, oid: CommitId) -> Result<Commit<'_>> {
        self.find_commit(oid)?
            .ok_or_else(|| Error::FindCommit {
                source: git2::Error::from_str("commit not found"),
                oid,
            })
    }

    /// Find a tree by id.
    #[instrument]
    pub fn find_tree(&self, oid: TreeId) -> Result<Tree<'_>> {
        let inner = self
            .inner
            .find_tree(oid.inner())
            .map_err(|source| Error::FindTree { source, oid })?;
        Ok(Tree { inner })
    }

    /// The empty tree, for parentless commits.
    pub fn make_empty_tree(&self) -> Result<Tree<'_>> {
        Ok(tree::make_empty_tree(self)?)
    }

    /// Replace `prefix` inside `base` (or build a fresh tree if `base` is
    /// `None`) with `subtree`'s contents. The write side of
    /// `read_tree_into_prefix`/`write_tree`.
    pub fn graft_subtree(
        &self,
        base: Option<&Tree<'_>>,
        prefix: &Path,
        subtree: &Tree<'_>,
    ) -> Result<TreeId> {
        Ok(tree::graft_subtree(self, base, prefix, subtree)?)
    }

    /// Write the current index as a tree (used by the working-tree side of
    /// `add`).
    #[instrument]
    pub fn write_index_as_tree(&self) -> Result<TreeId> {
        let mut index = self.inner.index().map_err(Error::ReadIndex)?;
        let oid = index.write_tree().map_err(Error::WriteIndexToTree)?;
        Ok(TreeId::from(oid))
    }

    /// `ancestor?(a, b) → bool`: is `a` an ancestor of `b`?.
    #[instrument]
    pub fn is_ancestor(&self, ancestor: CommitId, descendant: CommitId) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        self.inner
            .graph_descendant_of(descendant.inner(), ancestor.inner())
            .map_err(|source| Error::GraphDescendantOf {
                lhs: ancestor,
                rhs: descendant,
                source,
            })
    }

    /// `select_independent_tips(set) → set`: drop any commit in `set` that is
    /// an ancestor of another commit in `set`. `O(n^2)` pairwise
    /// comparisons; acceptable because the reduction is only run on the much
    /// smaller "known subtree commit" cache keys, not the full mainline.
    #[instrument]
    pub fn select_independent_tips(&self, commits: &[CommitId]) -> Result<Vec<CommitId>> {
        let mut result = Vec::with_capacity(commits.len());
        'outer: for (i, &candidate) in commits.iter().enumerate() {
            for (j, &other) in commits.iter().enumerate() {
                if i == j {
                    continue;
                }
                if self.is_ancestor(candidate, other)? {
                    continue 'outer;
                }
            }
            result.push(candidate);
        }
        Ok(result)
    }

    /// `count_between(exclude..include) → int`: the number of commits
    /// reachable from `include` but not from any of `exclude`. Used only for
    /// progress reporting, never for correctness.
    #[instrument]
    pub fn count_between(&self, exclude: &[CommitId], include: CommitId) -> Result<usize> {
        let mut walk = self.inner.revwalk().map_err(Error::Revwalk)?;
        walk.push(include.inner()).map_err(Error::Revwalk)?;
        for oid in exclude {
            walk.hide(oid.inner()).map_err(Error::Revwalk)?;
        }
        Ok(walk.filter_map(std::result::Result::ok).count())
    }

    /// `create_commit(tree, parents, metadata, message) → CommitId`.
    #[instrument]
    pub fn create_commit(
        &self,
        metadata: &CommitMetadata,
        message: &str,
        tree: &Tree<'_>,
        parents: &[&Commit<'_>],
    ) -> Result<CommitId> {
        let author = metadata.author_signature().map_err(Error::CreateCommit)?;
        let committer = metadata
            .committer_signature()
            .map_err(Error::CreateCommit)?;
        let parent_refs: Vec<&git2::Commit> = parents.iter().map(|c| &c.inner).collect();
        let oid = self
            .inner
            .commit(
                None,
                &author,
                &committer,
                message,
                &tree.inner,
                &parent_refs,
            )
            .map_err(Error::CreateCommit)?;
        Ok(CommitId::from(oid))
    }

    /// `update_ref(name, commit)`.
    #[instrument]
    pub fn update_ref(&self, name: &str, commit: CommitId, log_message: &str) -> Result<()> {
        self.inner
            .reference(name, commit.inner(), true, log_message)
            .map_err(|source| Error::UpdateRef {
                name: name.to_string(),
                source,
            })?;
        Ok(())
    }

    /// The fully-qualified name of the ref `HEAD` points to (e.g.
    /// `refs/heads/main`), for driver commands that need to move the current
    /// branch rather than a ref supplied by name.
    #[instrument]
    pub fn head_ref_name(&self) -> Result<String> {
        let head = self.inner.head().map_err(Error::Git)?;
        head.name()
            .map(str::to_string)
            .ok_or(Error::DecodeUtf8 { item: "HEAD ref name" })
    }

    /// Force the index and working copy to match `commit`, after a driver
    /// command has updated the ref it points to: a hard reset, the
    /// working-copy side of `add`/`merge`/`pull`/`split --rejoin`.
    #[instrument]
    pub fn checkout_hard(&self, commit: CommitId) -> Result<()> {
        let commit = self.find_commit_or_fail(commit)?;
        let object = commit.inner.as_object();
        let mut builder = git2::build::CheckoutBuilder::new();
        builder.force();
        self.inner
            .checkout_tree(object, Some(&mut builder))
            .map_err(Error::Git)?;
        self.inner.set_head(&self.head_ref_name()?).map_err(Error::Git)?;
        Ok(())
    }
}
