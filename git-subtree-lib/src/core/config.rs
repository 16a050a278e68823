//! Accesses repo-specific configuration.

use tracing::instrument;

use crate::git::Repo;

/// Environment variables which affect the functioning of `git-subtree`.
pub mod env_vars {
    /// Path to the Git executable to shell out to as a subprocess. Set by
    /// the test harness so tests don't depend on the ambient `PATH`.
    pub const TEST_GIT: &str = "TEST_GIT";
}

/// How long split's persistent commit-correspondence cache is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRetention {
    /// Keep the cache only for the lifetime of the current process (the
    /// default: an in-memory SQLite database).
    InMemory,

    /// Persist the cache to disk under the repository's Git directory, so
    /// subsequent invocations can reuse it.
    OnDisk,
}

/// Get the configured default prefix for `git-subtree-dir`-style annotation
/// trailers, read from `subtree.annotate`. Returns `None` (meaning: don't
/// annotate unless `--annotate` was passed explicitly) if unset.
#[instrument]
pub fn get_default_annotate_prefix(repo: &Repo) -> eyre::Result<Option<String>> {
    let config = repo.get_readonly_config()?;
    match config.get_string("subtree.annotate") {
        Ok(prefix) => Ok(Some(prefix)),
        Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Get the configured cache retention policy, read from
/// `subtree.cacheOnDisk`. Defaults to [`CacheRetention::InMemory`].
#[instrument]
pub fn get_cache_retention(repo: &Repo) -> eyre::Result<CacheRetention> {
    let config = repo.get_readonly_config()?;
    match config.get_bool("subtree.cacheOnDisk") {
        Ok(true) => Ok(CacheRetention::OnDisk),
        Ok(false) => Ok(CacheRetention::InMemory),
        Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(CacheRetention::InMemory),
        Err(err) => Err(err.into()),
    }
}
