//! Object identifiers.
//!
//! A commit's identity is treated as an opaque string with string equality;
//! in practice it's backed by `git2::Oid`. We newtype it so call sites never
//! see `git2` directly.

use std::fmt::{self, Display};
use std::str::FromStr;

/// The identifier of a commit object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(pub(super) git2::Oid);

impl CommitId {
    /// Access the underlying `git2::Oid`.
    pub fn inner(&self) -> git2::Oid {
        self.0
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        CommitId(oid)
    }
}

impl FromStr for CommitId {
    type Err = git2::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CommitId(git2::Oid::from_str(s)?))
    }
}

impl Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.0)
    }
}

/// The identifier of a tree object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(pub(super) git2::Oid);

impl TreeId {
    /// Access the underlying `git2::Oid`.
    pub fn inner(&self) -> git2::Oid {
        self.0
    }
}

impl From<git2::Oid> for TreeId {
    fn from(oid: git2::Oid) -> Self {
        TreeId(oid)
    }
}

impl Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeId({})", self.0)
    }
}
