//! `--remember BEFORE:AFTER` validation and reconciliation.

use std::path::Path;
use std::str::FromStr;

use tracing::instrument;

use crate::core::error::{Error, Result};
use crate::core::store::{Attribute, CacheValue, Store};
use crate::git::{CommitId, EntryKind, Repo};

/// A single `--remember BEFORE:AFTER` pair, parsed but not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RememberPair {
    pub before: CommitId,
    pub after: CommitId,
}

impl RememberPair {
    /// Parse `BEFORE:AFTER` from a single `--remember` argument.
    pub fn parse(arg: &str) -> std::result::Result<Self, String> {
        let (before, after) = arg
            .split_once(':')
            .ok_or_else(|| format!("--remember value '{arg}' is not of the form BEFORE:AFTER"))?;
        let before = CommitId::from_str(before)
            .map_err(|_| format!("--remember: '{before}' is not a valid commit"))?;
        let after = CommitId::from_str(after)
            .map_err(|_| format!("--remember: '{after}' is not a valid commit"))?;
        Ok(RememberPair { before, after })
    }
}

fn subdir_tree(repo: &Repo, commit: CommitId, dir: &Path) -> Result<Option<crate::git::TreeId>> {
    let commit = repo.find_commit_or_fail(commit)?;
    let tree = commit.get_tree()?;
    let entry = tree.get_path(dir).map_err(crate::git::RepoError::from)?;
    Ok(match entry {
        Some(entry) if entry.kind == EntryKind::Tree => Some(entry.oid),
        _ => None,
    })
}

/// Validate a single `--remember` pair against the three reconciliation
/// checks: `before` must resolve, `after` must resolve, and `before` must
/// map to the prefix's absent/present tree state consistent with `after`.
#[instrument(skip(repo))]
fn validate(repo: &Repo, dir: &Path, pair: RememberPair) -> Result<()> {
    let RememberPair { before, after } = pair;

    let before_subdir = subdir_tree(repo, before, dir)?;
    let after_commit = repo.find_commit_or_fail(after)?;
    let after_tree = after_commit.get_tree_oid();
    if before_subdir != Some(after_tree) {
        return Err(Error::RememberValidation {
            before,
            after,
            reason: "BEFORE's subdirectory tree does not equal AFTER's root tree".to_string(),
        });
    }

    let before_commit = repo.find_commit_or_fail(before)?;
    let before_message = before_commit.get_message_raw();
    let after_message = after_commit.get_message_raw();
    let before_bytes: &[u8] = &before_message;
    let after_bytes: &[u8] = &after_message;
    if !after_bytes.ends_with(before_bytes) {
        return Err(Error::RememberValidation {
            before,
            after,
            reason: "AFTER's message does not have BEFORE's message as a suffix".to_string(),
        });
    }

    let before_author = before_commit.get_author();
    let after_author = after_commit.get_author();
    let before_committer = before_commit.get_committer();
    let after_committer = after_commit.get_committer();
    let signatures_match = before_author.name() == after_author.name()
        && before_author.email() == after_author.email()
        && before_author.when().seconds() == after_author.when().seconds()
        && before_committer.name() == after_committer.name()
        && before_committer.email() == after_committer.email()
        && before_committer.when().seconds() == after_committer.when().seconds();
    if !signatures_match {
        return Err(Error::RememberValidation {
            before,
            after,
            reason: "author/committer names, emails, or dates do not match exactly".to_string(),
        });
    }

    Ok(())
}

/// Validate and apply every `--remember` pair, cache-mapping `BEFORE → AFTER`
/// for each that passes. Run before any traversal begins.
#[instrument(skip(repo, store))]
pub fn apply_remember_pairs(
    repo: &Repo,
    store: &Store,
    dir: &Path,
    pairs: &[RememberPair],
) -> Result<()> {
    for &pair in pairs {
        validate(repo, dir, pair)?;
        store.set_attribute(pair.before, Attribute::Redo)?;
        store.set_cache_checked(pair.before, CacheValue::Commit(pair.after))?;
    }
    Ok(())
}
