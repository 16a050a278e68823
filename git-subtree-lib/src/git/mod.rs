//! Tools for interfacing with the Git repository.

mod object;
mod oid;
mod repo;
mod run;
mod tree;

pub use object::{Commit, Signature};
pub use oid::{CommitId, TreeId};
pub use repo::{CommitMetadata, Error as RepoError, Repo, Result as RepoResult};
pub use run::{GitRunInfo, GitRunResult};
pub use tree::{graft_subtree, make_empty_tree, EntryKind, Tree, TreeEntry};
