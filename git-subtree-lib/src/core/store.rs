//! The split engine's persistent, run-scoped scratch area: a commit-keyed
//! cache, an attributes table, and a single-value variables table, all
//! backed by `rusqlite`.
//!
//! This store's lifetime is a single `Engine::run` call: it is created
//! fresh (normally `:memory:`) and dropped once the run finishes,
//! successfully or not.

use std::path::Path;
use std::str::FromStr;

use rusqlite::OptionalExtension;
use tracing::instrument;

use crate::git::CommitId;

/// The value a mainline commit's cache entry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheValue {
    /// The rewritten subtree commit corresponding to this mainline commit.
    /// Identity (`cache[c] == c`) means `c` is itself a subtree commit.
    Commit(CommitId),

    /// The commit is on the mainline but does not (yet) contain the
    /// subdirectory.
    NoTree,

    /// The commit has been visited by the counter pass but not yet
    /// processed.
    Counted,
}

impl CacheValue {
    fn tag(&self) -> &'static str {
        match self {
            CacheValue::Commit(_) => "commit",
            CacheValue::NoTree => "notree",
            CacheValue::Counted => "counted",
        }
    }

    fn commit_text(&self) -> Option<String> {
        match self {
            CacheValue::Commit(oid) => Some(oid.to_string()),
            CacheValue::NoTree | CacheValue::Counted => None,
        }
    }

    fn from_row(tag: &str, commit_text: Option<String>) -> rusqlite::Result<Self> {
        match tag {
            "commit" => {
                let text = commit_text.ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "commit".to_string(),
                        rusqlite::types::Type::Null,
                    )
                })?;
                let oid = CommitId::from_str(&text).map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "commit".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?;
                Ok(CacheValue::Commit(oid))
            }
            "notree" => Ok(CacheValue::NoTree),
            "counted" => Ok(CacheValue::Counted),
            other => Err(rusqlite::Error::InvalidColumnType(
                0,
                other.to_string(),
                rusqlite::types::Type::Text,
            )),
        }
    }
}

/// The tag recorded in the attributes table. Currently only `redo` is used:
/// the commit had a cache mapping inherited from a prior split run that is
/// considered stale and must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Redo,
}

impl Attribute {
    fn as_str(&self) -> &'static str {
        match self {
            Attribute::Redo => "redo",
        }
    }
}

/// Variables the engine threads across its passes, replacing the global
/// mutable state (`latest_split`, `latest_mainline`) of the original
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    LatestSplit,
    LatestMainline,
}

impl Variable {
    fn as_str(&self) -> &'static str {
        match self {
            Variable::LatestSplit => "latest_split",
            Variable::LatestMainline => "latest_mainline",
        }
    }
}

#[instrument]
fn init_tables(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
        "
CREATE TABLE IF NOT EXISTS cache (
    commit_id TEXT NOT NULL PRIMARY KEY,
    value_tag TEXT NOT NULL,
    value_commit TEXT
)
",
        [],
    )?;
    conn.execute(
        "
CREATE TABLE IF NOT EXISTS attributes (
    commit_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (commit_id, tag)
)
",
        [],
    )?;
    conn.execute(
        "
CREATE TABLE IF NOT EXISTS variables (
    name TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL
)
",
        [],
    )?;
    Ok(())
}

/// The split engine's scratch area.
pub struct Store {
    conn: rusqlite::Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Store>")
    }
}

impl Store {
    /// Open an in-memory store (the default).
    #[instrument]
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        init_tables(&conn)?;
        Ok(Store { conn })
    }

    /// Open an on-disk store at `path`, for the crash-resilience variant
    /// (`Engine::with_scratch_path`).
    #[instrument]
    pub fn on_disk(path: &Path) -> rusqlite::Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        init_tables(&conn)?;
        Ok(Store { conn })
    }

    /// Look up a commit's cache entry, if any.
    #[instrument]
    pub fn get_cache(&self, commit: CommitId) -> rusqlite::Result<Option<CacheValue>> {
        self.conn
            .query_row(
                "SELECT value_tag, value_commit FROM cache WHERE commit_id = :commit_id",
                rusqlite::named_params! { ":commit_id": commit.to_string() },
                |row| {
                    let tag: String = row.get("value_tag")?;
                    let value_commit: Option<String> = row.get("value_commit")?;
                    Ok((tag, value_commit))
                },
            )
            .optional()?
            .map(|(tag, value_commit)| CacheValue::from_row(&tag, value_commit))
            .transpose()
    }

    /// Unconditionally set a commit's cache entry. Callers enforce the
    /// "never overwrite a real mapping" invariant themselves, via
    /// [`Store::set_cache_checked`]; this raw setter exists for the pre-load
    /// and de-normalization passes, which establish the initial state.
    #[instrument]
    pub fn set_cache(&self, commit: CommitId, value: CacheValue) -> rusqlite::Result<()> {
        self.conn.execute(
            "
INSERT INTO cache (commit_id, value_tag, value_commit)
VALUES (:commit_id, :value_tag, :value_commit)
ON CONFLICT(commit_id) DO UPDATE SET value_tag = excluded.value_tag, value_commit = excluded.value_commit
",
            rusqlite::named_params! {
                ":commit_id": commit.to_string(),
                ":value_tag": value.tag(),
                ":value_commit": value.commit_text(),
            },
        )?;
        Ok(())
    }

    /// Set a commit's cache entry and return its prior value. Overwriting a
    /// differing, non-`counted` mapping is an internal-consistency error
    /// unless `commit` carries the `redo` attribute, in which case the
    /// caller (the processor) is expected to compare the returned prior
    /// value against the recomputed one itself and raise `RedoDrift` if
    /// they disagree.
    #[instrument]
    pub fn set_cache_checked(
        &self,
        commit: CommitId,
        value: CacheValue,
    ) -> crate::core::error::Result<Option<CacheValue>> {
        let previous = self.get_cache(commit)?;
        if let Some(existing) = previous {
            let conflicts = existing != value
                && !matches!(existing, CacheValue::Counted)
                && !self.has_attribute(commit, Attribute::Redo)?;
            if conflicts {
                return Err(crate::core::error::Error::CacheConflict {
                    commit,
                    existing,
                    attempted: value,
                });
            }
        }
        self.set_cache(commit, value)?;
        Ok(previous)
    }

    /// Every cache key whose value is neither `notree` nor `counted` — the
    /// set the ancestor test reduces via `select_independent_tips`.
    #[instrument]
    pub fn known_subtree_commits(&self) -> rusqlite::Result<Vec<CommitId>> {
        let mut stmt = self.conn.prepare(
            "SELECT commit_id FROM cache WHERE value_tag = 'commit'",
        )?;
        let rows = stmt.query_map([], |row| {
            let commit_id: String = row.get(0)?;
            Ok(commit_id)
        })?;
        let mut result = Vec::new();
        for row in rows {
            let commit_id = row?;
            if let Ok(oid) = CommitId::from_str(&commit_id) {
                result.push(oid);
            }
        }
        Ok(result)
    }

    /// Record an attribute on a commit (currently only `redo`).
    #[instrument]
    pub fn set_attribute(&self, commit: CommitId, attribute: Attribute) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO attributes (commit_id, tag) VALUES (:commit_id, :tag)",
            rusqlite::named_params! {
                ":commit_id": commit.to_string(),
                ":tag": attribute.as_str(),
            },
        )?;
        Ok(())
    }

    /// Whether a commit carries the given attribute.
    #[instrument]
    pub fn has_attribute(&self, commit: CommitId, attribute: Attribute) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM attributes WHERE commit_id = :commit_id AND tag = :tag",
            rusqlite::named_params! {
                ":commit_id": commit.to_string(),
                ":tag": attribute.as_str(),
            },
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Set a scratch variable (`latest_split`, `latest_mainline`).
    #[instrument]
    pub fn set_variable(&self, variable: Variable, commit: CommitId) -> rusqlite::Result<()> {
        self.conn.execute(
            "
INSERT INTO variables (name, value) VALUES (:name, :value)
ON CONFLICT(name) DO UPDATE SET value = excluded.value
",
            rusqlite::named_params! {
                ":name": variable.as_str(),
                ":value": commit.to_string(),
            },
        )?;
        Ok(())
    }

    /// Read a scratch variable.
    #[instrument]
    pub fn get_variable(&self, variable: Variable) -> rusqlite::Result<Option<CommitId>> {
        self.conn
            .query_row(
                "SELECT value FROM variables WHERE name = :name",
                rusqlite::named_params! { ":name": variable.as_str() },
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|value| {
                CommitId::from_str(&value).map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "value".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_test_repo;

    #[test]
    fn round_trips_cache_entries() -> eyre::Result<()> {
        let (_git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;

        assert_eq!(store.get_cache(head)?, None);
        store.set_cache(head, CacheValue::NoTree)?;
        assert_eq!(store.get_cache(head)?, Some(CacheValue::NoTree));

        store.set_cache(head, CacheValue::Commit(head))?;
        assert_eq!(store.get_cache(head)?, Some(CacheValue::Commit(head)));
        Ok(())
    }

    #[test]
    fn tracks_redo_attribute() -> eyre::Result<()> {
        let (_git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;

        assert!(!store.has_attribute(head, Attribute::Redo)?);
        store.set_attribute(head, Attribute::Redo)?;
        assert!(store.has_attribute(head, Attribute::Redo)?);
        Ok(())
    }

    #[test]
    fn round_trips_variables() -> eyre::Result<()> {
        let (_git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;

        assert_eq!(store.get_variable(Variable::LatestSplit)?, None);
        store.set_variable(Variable::LatestSplit, head)?;
        assert_eq!(store.get_variable(Variable::LatestSplit)?, Some(head));
        Ok(())
    }

    #[test]
    fn set_cache_checked_rejects_conflicting_overwrite_without_redo() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;
        git.commit_file("a.txt", 1)?;
        let other = repo.resolve("HEAD")?;

        store.set_cache_checked(head, CacheValue::Commit(head))?;
        let err = store
            .set_cache_checked(head, CacheValue::Commit(other))
            .expect_err("differing mapping without redo should be rejected");
        assert!(matches!(
            err,
            crate::core::error::Error::CacheConflict { .. }
        ));
        Ok(())
    }

    #[test]
    fn set_cache_checked_allows_reconciliation_with_redo() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;
        git.commit_file("a.txt", 1)?;
        let other = repo.resolve("HEAD")?;

        store.set_cache_checked(head, CacheValue::Commit(head))?;
        store.set_attribute(head, Attribute::Redo)?;
        let previous = store.set_cache_checked(head, CacheValue::Commit(other))?;
        assert_eq!(previous, Some(CacheValue::Commit(head)));
        assert_eq!(store.get_cache(head)?, Some(CacheValue::Commit(other)));
        Ok(())
    }

    #[test]
    fn set_cache_checked_allows_overwriting_counted() -> eyre::Result<()> {
        let (_git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;

        store.set_cache(head, CacheValue::Counted)?;
        store.set_cache_checked(head, CacheValue::Commit(head))?;
        assert_eq!(store.get_cache(head)?, Some(CacheValue::Commit(head)));
        Ok(())
    }

    #[test]
    fn known_subtree_commits_excludes_sentinels() -> eyre::Result<()> {
        let (_git, repo) = make_test_repo()?;
        let store = Store::in_memory()?;
        let head = repo.resolve("HEAD")?;

        store.set_cache(head, CacheValue::Counted)?;
        assert!(store.known_subtree_commits()?.is_empty());

        store.set_cache(head, CacheValue::Commit(head))?;
        assert_eq!(store.known_subtree_commits()?, vec![head]);
        Ok(())
    }
}
