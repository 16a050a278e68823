//! Consistency and internal errors raised by the engine itself, as opposed to
//! errors surfaced by the repository service (see [`crate::git::RepoError`]).

use thiserror::Error;

use crate::core::store::CacheValue;
use crate::git::CommitId;
use crate::util::ExitCode;

/// Errors raised by the split engine's own bookkeeping: cache conflicts,
/// `redo`/`--remember` drift, and `--remember` validation failures. These
/// are distinct from [`crate::git::RepoError`], which covers failures
/// talking to the repository itself.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "internal error: cache conflict for commit {commit}: already mapped to {existing:?}, \
         cannot also map to {attempted:?}"
    )]
    CacheConflict {
        commit: CommitId,
        existing: CacheValue,
        attempted: CacheValue,
    },

    #[error(
        "split is not idempotent: commit {commit} previously mapped to {previous}, but this run \
         recomputed {recomputed}. Pass `--remember {previous}:{recomputed}` to reconcile, or \
         `--remember {commit}:<desired>` if the stale mapping is itself wrong"
    )]
    RedoDrift {
        commit: CommitId,
        previous: CommitId,
        recomputed: CommitId,
    },

    #[error("--remember {before}:{after}: {reason}")]
    RememberValidation {
        before: CommitId,
        after: CommitId,
        reason: String,
    },

    #[error(
        "Branch '{branch}' is not an ancestor of commit '{tip}'."
    )]
    BranchNotAncestor { branch: String, tip: CommitId },

    #[error("no new revisions")]
    NoNewRevisions,

    #[error("internal error: {0}")]
    Assertion(String),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error(transparent)]
    Repo(#[from] crate::git::RepoError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The process exit code this error implies: every consistency or
    /// internal error is exit `1`; only environment misconfiguration, which
    /// is raised as a `git::RepoError` before an `Engine` ever exists, is
    /// `126`.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::NoNewRevisions => ExitCode::RUNTIME_FAILURE,
            _ => ExitCode::RUNTIME_FAILURE,
        }
    }
}
