//! Wrappers around `git2` commit/signature objects.

use bstr::{BString, ByteSlice};
use git2::message_trailers_bytes;
use tracing::instrument;

use super::oid::{CommitId, TreeId};
use super::repo::{Error, Result};
use super::tree::Tree;

/// Represents a commit object in the Git object database.
#[derive(Clone)]
pub struct Commit<'repo> {
    pub(super) inner: git2::Commit<'repo>,
}

impl std::fmt::Debug for Commit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Commit {}>", self.get_oid())
    }
}

impl<'repo> Commit<'repo> {
    /// Get the object ID of the commit.
    #[instrument]
    pub fn get_oid(&self) -> CommitId {
        CommitId::from(self.inner.id())
    }

    /// Get the short object ID of the commit.
    #[instrument]
    pub fn get_short_oid(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(
            &self
                .inner
                .clone()
                .into_object()
                .short_id()
                .map_err(Error::Git)?,
        )
        .to_string())
    }

    /// Get the object IDs of the parents of this commit, in declaration
    /// order.
    #[instrument]
    pub fn get_parent_oids(&self) -> Vec<CommitId> {
        self.inner.parent_ids().map(CommitId::from).collect()
    }

    /// Get the parent commits of this commit, in declaration order.
    #[instrument]
    pub fn get_parents(&self) -> Vec<Commit<'repo>> {
        self.inner
            .parents()
            .map(|commit| Commit { inner: commit })
            .collect()
    }

    /// Get the number of parents of this commit.
    pub fn get_parent_count(&self) -> usize {
        self.inner.parent_count()
    }

    /// Get the OID of the `Tree` object associated with this commit.
    #[instrument]
    pub fn get_tree_oid(&self) -> TreeId {
        TreeId::from(self.inner.tree_id())
    }

    /// Get the `Tree` object associated with this commit.
    #[instrument]
    pub fn get_tree(&self) -> Result<Tree<'repo>> {
        let tree = self.inner.tree().map_err(|err| Error::FindTree {
            source: err,
            oid: self.inner.tree_id().into(),
        })?;
        Ok(Tree { inner: tree })
    }

    /// Get the commit message, without any whitespace trimmed.
    #[instrument]
    pub fn get_message_raw(&self) -> BString {
        BString::from(self.inner.message_raw_bytes())
    }

    /// Get the summary (first line) of the commit message.
    #[instrument]
    pub fn get_summary(&self) -> Result<BString> {
        match self.inner.summary_bytes() {
            Some(summary) => Ok(BString::from(summary)),
            None => Err(Error::DecodeUtf8 { item: "summary" }),
        }
    }

    /// Get the "trailer" metadata from this commit's message: lines like
    /// `git-subtree-dir: foo` that appear in the trailer block at the end of
    /// the message. This delegates to the host implementation's own trailer
    /// parser so edge cases (blank-line requirements, folded continuation
    /// lines) match real Git exactly.
    #[instrument]
    pub fn get_trailers(&self) -> Result<Vec<(String, String)>> {
        let message = self.get_message_raw();
        let message = message.to_str().map_err(|_| Error::DecodeUtf8 {
            item: "raw message",
        })?;
        let mut result = Vec::new();
        for (k, v) in message_trailers_bytes(message)
            .map_err(Error::ReadMessageTrailer)?
            .iter()
        {
            if let (Ok(k), Ok(v)) = (std::str::from_utf8(k), std::str::from_utf8(v)) {
                result.push((k.to_owned(), v.to_owned()));
            }
        }
        Ok(result)
    }

    /// Get the author of this commit.
    #[instrument]
    pub fn get_author(&self) -> Signature<'_> {
        Signature {
            inner: self.inner.author(),
        }
    }

    /// Get the committer of this commit.
    #[instrument]
    pub fn get_committer(&self) -> Signature<'_> {
        Signature {
            inner: self.inner.committer(),
        }
    }

    /// Determine if the current commit is empty (has no changes compared to
    /// its sole parent).
    pub fn is_empty(&self) -> bool {
        match self.inner.parents().collect::<Vec<_>>().as_slice() {
            [only_parent] => only_parent.tree_id() == self.inner.tree_id(),
            _ => false,
        }
    }
}

/// A wrapper around a Git author/committer signature.
#[derive(Clone)]
pub struct Signature<'a> {
    pub(super) inner: git2::Signature<'a>,
}

impl std::fmt::Debug for Signature<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Signature {}>", self.inner)
    }
}

impl<'a> Signature<'a> {
    /// Get the name on the signature.
    pub fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    /// Get the email on the signature.
    pub fn email(&self) -> Option<&str> {
        self.inner.email()
    }

    /// Get the POSIX timestamp (with timezone offset) on the signature.
    pub fn when(&self) -> git2::Time {
        self.inner.when()
    }

    /// Access the underlying `git2::Signature`.
    pub fn inner(&self) -> &git2::Signature<'a> {
        &self.inner
    }
}
