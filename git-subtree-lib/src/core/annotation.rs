//! Extracts the three `git-subtree-*` trailers from a commit message and
//! recognizes the add/rejoin/squash shapes they encode.
//!
//! Trailer extraction is delegated to the host Git implementation's own
//! trailer parser ([`crate::git::Commit::get_trailers`], which wraps
//! `git2::message_trailers_bytes`) rather than a hand-rolled `key: value`
//! line scanner, so blank-line and folded-continuation-line edge cases match
//! real Git exactly.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::core::effects::{Effects, OperationType};
use crate::core::store::{CacheValue, Store};
use crate::git::{CommitId, Repo};

const TRAILER_DIR: &str = "git-subtree-dir";
const TRAILER_MAINLINE: &str = "git-subtree-mainline";
const TRAILER_SPLIT: &str = "git-subtree-split";

/// A well-formed set of `git-subtree-*` trailers found on a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub dir: String,
    pub mainline: Option<CommitId>,
    pub split: Option<CommitId>,
}

/// Extract the subtree annotation trailers from a commit's message. Returns
/// `None` if no `git-subtree-dir` trailer is present, or if a `split` value
/// is present but doesn't resolve to a valid commit id (a malformed record
/// is ignored rather than erroring).
#[instrument]
pub fn parse_annotation(repo: &Repo, commit: CommitId) -> crate::core::error::Result<Option<AnnotationRecord>> {
    let commit = repo.find_commit_or_fail(commit)?;
    let trailers = commit.get_trailers()?;

    let mut dir = None;
    let mut mainline = None;
    let mut split = None;
    let mut split_present_but_malformed = false;

    for (key, value) in &trailers {
        match key.as_str() {
            TRAILER_DIR => dir = Some(normalize_dir(value)),
            TRAILER_MAINLINE => {
                if let Ok(oid) = CommitId::from_str(value) {
                    mainline = Some(oid);
                }
            }
            TRAILER_SPLIT => match CommitId::from_str(value) {
                Ok(oid) => split = Some(oid),
                Err(_) => split_present_but_malformed = true,
            },
            _ => {}
        }
    }

    let dir = match dir {
        Some(dir) => dir,
        None => return Ok(None),
    };
    if split_present_but_malformed {
        debug!(commit = %commit.get_oid(), "malformed git-subtree-split trailer, ignoring record");
        return Ok(None);
    }

    Ok(Some(AnnotationRecord {
        dir,
        mainline,
        split,
    }))
}

fn normalize_dir(dir: &str) -> String {
    dir.trim_end_matches('/').to_string()
}

/// Scan mainline history reachable from `tip` for prior annotation records
/// and seed the cache with what they establish (the **pre-load** pass).
/// Does not recurse past any commit bearing a record: the aim is to
/// discover previously-synthesized subtree commits and previously-recorded
/// add/rejoin markers, not to walk the whole history eagerly (the counter
/// and processor passes do that).
#[instrument(skip(repo, store, effects))]
pub fn preload(
    repo: &Repo,
    store: &Store,
    effects: &Effects,
    dir: &Path,
    tip: CommitId,
) -> crate::core::error::Result<()> {
    let _progress = effects.start_operation(OperationType::LoadAnnotations);
    let dir_str = dir.to_string_lossy().into_owned();

    let mut stack = vec![tip];
    let mut seen = std::collections::HashSet::new();
    while let Some(commit_id) = stack.pop() {
        if !seen.insert(commit_id) {
            continue;
        }
        if let Some(record) = parse_annotation(repo, commit_id)? {
            if record.dir == dir_str {
                apply_record(repo, store, commit_id, &record)?;
                // A commit bearing a record is itself either a subtree
                // commit or a mainline marker; either way its own history is
                // already accounted for by the record (or will be
                // discovered again from `split`, which identity-maps).
                continue;
            }
        }
        let commit = repo.find_commit_or_fail(commit_id)?;
        for parent in commit.get_parent_oids() {
            stack.push(parent);
        }
    }
    Ok(())
}

/// Walk `tip`'s ancestry for the nearest commit carrying a well-formed
/// annotation record for `dir` with a `split` value set, and return that
/// value. A fresh `--squash` merge chains its new squash commit onto this
/// result rather than starting an unparented squash lineage every time —
/// the wrapper commit a squash-merge lands on is very often not `tip`
/// itself, since any ordinary commit made between two squash-merges sits
/// on top of the previous one.
#[instrument(skip(repo))]
pub fn find_latest_squash(
    repo: &Repo,
    dir: &Path,
    tip: CommitId,
) -> crate::core::error::Result<Option<CommitId>> {
    let dir_str = dir.to_string_lossy().into_owned();
    let mut queue = std::collections::VecDeque::from([tip]);
    let mut seen = std::collections::HashSet::new();
    while let Some(commit_id) = queue.pop_front() {
        if !seen.insert(commit_id) {
            continue;
        }
        if let Some(record) = parse_annotation(repo, commit_id)? {
            if record.dir == dir_str {
                if let Some(split) = record.split {
                    return Ok(Some(split));
                }
                continue;
            }
        }
        let commit = repo.find_commit_or_fail(commit_id)?;
        for parent in commit.get_parent_oids() {
            queue.push_back(parent);
        }
    }
    Ok(None)
}

fn apply_record(
    repo: &Repo,
    store: &Store,
    commit_id: CommitId,
    record: &AnnotationRecord,
) -> crate::core::error::Result<()> {
    let AnnotationRecord {
        mainline, split, ..
    } = record;

    match (mainline, split) {
        (None, Some(split)) => {
            // Squash commit: {dir, split} alone.
            store.set_cache(commit_id, CacheValue::Commit(*split))?;
            store.set_cache(*split, CacheValue::Commit(*split))?;
        }
        (Some(mainline), Some(split)) => {
            let mainline_commit = repo.find_commit_or_fail(*mainline)?;
            let mainline_tree = mainline_commit.get_tree()?;
            let subdir_entry = subdir_tree(&mainline_tree, &path_from_record(record))?;

            let split_commit = repo.find_commit_or_fail(*split)?;
            let split_root_tree_oid = split_commit.get_tree_oid();

            match subdir_entry {
                None => {
                    // Add: the subdirectory is absent in `mainline`.
                    store.set_cache(*mainline, CacheValue::NoTree)?;
                }
                Some(subdir_tree_oid) if subdir_tree_oid == split_root_tree_oid => {
                    // Rejoin: the trees line up.
                    store.set_cache(*mainline, CacheValue::Commit(*split))?;
                }
                Some(_) => {
                    // Cross-subtree merge: informational only, record nothing
                    // for `mainline`.
                }
            }
            store.set_cache(*split, CacheValue::Commit(*split))?;
        }
        (None, None) | (Some(_), None) => {
            // Not a well-formed record we act on (no `split`).
        }
    }
    Ok(())
}

fn path_from_record(record: &AnnotationRecord) -> PathBuf {
    PathBuf::from(&record.dir)
}

fn subdir_tree(
    tree: &crate::git::Tree<'_>,
    dir: &Path,
) -> crate::core::error::Result<Option<crate::git::TreeId>> {
    use crate::git::EntryKind;
    let entry = tree
        .get_path(dir)
        .map_err(crate::git::RepoError::from)?;
    match entry {
        Some(entry) if entry.kind == EntryKind::Tree => Ok(Some(entry.oid)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_test_repo;
    use std::path::PathBuf;

    #[test]
    fn missing_dir_trailer_is_not_a_record() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let head = repo.resolve("HEAD")?;
        assert_eq!(parse_annotation(&repo, head)?, None);
        Ok(())
    }

    #[test]
    fn normalizes_trailing_slash() {
        assert_eq!(normalize_dir("sub/"), "sub");
        assert_eq!(normalize_dir("sub"), "sub");
    }

    #[test]
    fn malformed_split_is_ignored() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.run(
            1,
            &[
                "commit",
                "-q",
                "--allow-empty",
                "-m",
                "squash\n\ngit-subtree-dir: sub\ngit-subtree-split: not-a-hex-oid\n",
            ],
        )?;
        let head = repo.resolve("HEAD")?;
        assert_eq!(parse_annotation(&repo, head)?, None);
        Ok(())
    }

    #[test]
    fn find_latest_squash_walks_past_intervening_commits() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/file.txt", 1)?;
        let split_oid = repo.resolve("HEAD")?;
        git.run(
            2,
            &[
                "commit",
                "-q",
                "--allow-empty",
                "-m",
                &format!("squash\n\ngit-subtree-dir: sub\ngit-subtree-split: {split_oid}\n"),
            ],
        )?;
        // An ordinary commit sits on top of the squash wrapper, as any
        // commit made between two squash-merges does.
        git.commit_file("unrelated.txt", 3)?;
        let tip = repo.resolve("HEAD")?;

        let dir = PathBuf::from("sub");
        assert_eq!(find_latest_squash(&repo, &dir, tip)?, Some(split_oid));
        Ok(())
    }

    #[test]
    fn find_latest_squash_is_none_without_a_prior_record() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("a.txt", 1)?;
        let tip = repo.resolve("HEAD")?;

        let dir = PathBuf::from("sub");
        assert_eq!(find_latest_squash(&repo, &dir, tip)?, None);
        Ok(())
    }

    #[test]
    fn parses_squash_record() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/file.txt", 1)?;
        let split_oid = repo.resolve("HEAD")?;
        git.run(
            2,
            &[
                "commit",
                "-q",
                "--allow-empty",
                "-m",
                &format!("squash\n\ngit-subtree-dir: sub\ngit-subtree-split: {split_oid}\n"),
            ],
        )?;
        let head = repo.resolve("HEAD")?;
        let record = parse_annotation(&repo, head)?.expect("record");
        assert_eq!(record.dir, "sub");
        assert_eq!(record.mainline, None);
        assert_eq!(record.split, Some(split_oid));
        Ok(())
    }
}
