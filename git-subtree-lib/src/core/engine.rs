//! Ties the split engine's passes together: pre-load, de-normalize, count,
//! process, finalize.
//!
//! Bookkeeping (`indent`, `split_started`, `split_max`, `split_redoing`) is
//! threaded as explicit fields on [`Engine`], passed by `&mut self`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info_span, instrument};

use crate::core::annotation;
use crate::core::classify::{classify, Classification};
use crate::core::copy_or_skip::{self, Decision};
use crate::core::counter;
use crate::core::effects::Effects;
use crate::core::error::{Error, Result};
use crate::core::parents::select_parents;
use crate::core::remember::{apply_remember_pairs, RememberPair};
use crate::core::store::{Attribute, CacheValue, Store, Variable};
use crate::core::synth;
use crate::git::{CommitMetadata, EntryKind, Repo, RepoError};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// Options controlling a single `Engine::run` invocation.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub annotate_prefix: Option<String>,
    pub ignore_joins: bool,
    /// Commits to seed as already-mainline (`notree`) before traversal
    /// begins. `--onto` and `--notree` are both folded in here: each commit
    /// is treated independently and the classifier's invariants reconcile
    /// any overlap.
    pub preseeded_notree: Vec<crate::git::CommitId>,
    pub remember: Vec<RememberPair>,
}

/// The split engine. Owns the run-scoped scratch store and the bookkeeping
/// fields tracking traversal progress.
pub struct Engine {
    store: Store,
    effects: Effects,
    dir: PathBuf,
    options: EngineOptions,

    /// Set once the processor has synthesized or identity-mapped at least one
    /// commit. If the run finishes with this still `false` and the tip maps
    /// to `notree`, nothing changed and `Error::NoNewRevisions` is raised.
    split_started: bool,
    /// The counter pass's total, used only to drive progress reporting.
    split_max: usize,
    /// Set while reconciling a commit that carries the `redo` attribute.
    split_redoing: bool,
    /// Tracks work-stack depth, for debug-level nested logging.
    indent: usize,
}

impl Engine {
    /// Construct an engine with a fresh in-memory scratch store (the
    /// default).
    pub fn new(effects: Effects, dir: &Path, options: EngineOptions) -> Result<Self> {
        Ok(Engine {
            store: Store::in_memory()?,
            effects,
            dir: dir.to_path_buf(),
            options,
            split_started: false,
            split_max: 0,
            split_redoing: false,
            indent: 0,
        })
    }

    /// Construct an engine backed by an on-disk scratch store at `path`, for
    /// crash resilience on very large histories. The file is the caller's
    /// responsibility to remove once the run completes.
    pub fn with_scratch_path(effects: Effects, dir: &Path, path: &Path, options: EngineOptions) -> Result<Self> {
        Ok(Engine {
            store: Store::on_disk(path)?,
            effects,
            dir: dir.to_path_buf(),
            options,
            split_started: false,
            split_max: 0,
            split_redoing: false,
            indent: 0,
        })
    }

    /// Run the full split pipeline against `tip`, returning the synthesized
    /// (or reused) subtree commit it maps to.
    #[instrument(skip(self, repo))]
    pub fn run(&mut self, repo: &Repo, tip: crate::git::CommitId) -> Result<crate::git::CommitId> {
        let _span = info_span!("split_engine_run", %tip).entered();

        annotation::preload(repo, &self.store, &self.effects, &self.dir, tip)?;

        for &commit in &self.options.preseeded_notree {
            self.store.set_cache(commit, CacheValue::NoTree)?;
        }
        apply_remember_pairs(repo, &self.store, &self.dir, &self.options.remember)?;

        self.split_max = counter::count(
            repo,
            &self.store,
            &self.effects,
            &self.dir,
            self.options.ignore_joins,
            tip,
        )?;

        self.process(repo, tip)?;

        match self.store.get_cache(tip)? {
            Some(CacheValue::Commit(newrev)) => Ok(newrev),
            Some(CacheValue::NoTree) => Err(Error::NoNewRevisions),
            _ => Err(Error::Assertion(format!(
                "commit {tip} was left unprocessed by the split engine"
            ))),
        }
    }

    /// Post-order DFS over the selector's edges, implemented as an explicit
    /// work-stack with white/gray/black color marking.
    fn process(&mut self, repo: &Repo, tip: crate::git::CommitId) -> Result<()> {
        let progress = self.effects.start_operation(crate::core::effects::OperationType::ProcessCommits);
        let mut colors: HashMap<crate::git::CommitId, Color> = HashMap::new();
        let mut stack = vec![tip];
        let mut processed = 0usize;

        while let Some(commit) = stack.pop() {
            match colors.get(&commit).copied() {
                Some(Color::Black) => continue,
                Some(Color::Gray) => {
                    self.indent = self.indent.saturating_sub(1);
                    self.process_one(repo, commit)?;
                    colors.insert(commit, Color::Black);
                    processed += 1;
                    progress.notify_progress(processed, self.split_max.max(processed));
                    continue;
                }
                None => {}
            }

            if let Some(value) = self.store.get_cache(commit)? {
                if !matches!(value, CacheValue::Counted) {
                    colors.insert(commit, Color::Black);
                    continue;
                }
            }

            let selection = select_parents(
                repo,
                &self.store,
                &self.dir,
                self.options.ignore_joins,
                commit,
            )?;

            if let Some(target) = selection.rejoin_target {
                self.store.set_cache_checked(commit, CacheValue::Commit(target))?;
                colors.insert(commit, Color::Black);
                continue;
            }

            self.indent += 1;
            colors.insert(commit, Color::Gray);
            stack.push(commit);
            for parent in selection.parents {
                if !matches!(colors.get(&parent), Some(Color::Black)) {
                    stack.push(parent);
                }
            }
        }

        Ok(())
    }

    /// Classify and rewrite a single commit whose parents have all already
    /// been processed.
    #[instrument(skip(self, repo))]
    fn process_one(&mut self, repo: &Repo, commit: crate::git::CommitId) -> Result<()> {
        let classification = classify(
            repo,
            &self.store,
            &self.dir,
            self.options.ignore_joins,
            commit,
        )?;
        let had_redo = self.store.has_attribute(commit, Attribute::Redo)?;

        let new_value = match classification {
            Classification::MainlineTree => self.process_mainline_tree(repo, commit)?,
            Classification::MainlineNoTree => {
                self.store.set_variable(Variable::LatestMainline, commit)?;
                CacheValue::NoTree
            }
            Classification::Split => {
                self.store.set_variable(Variable::LatestSplit, commit)?;
                CacheValue::Commit(commit)
            }
            Classification::Squash => {
                let record = annotation::parse_annotation(repo, commit)?.ok_or_else(|| {
                    Error::Assertion(format!(
                        "commit {commit} classified as squash but carries no annotation record"
                    ))
                })?;
                let split_value = record.split.ok_or_else(|| {
                    Error::Assertion(format!(
                        "squash commit {commit} is missing its git-subtree-split trailer"
                    ))
                })?;
                self.store.set_variable(Variable::LatestSplit, split_value)?;
                CacheValue::Commit(split_value)
            }
        };

        let previous = self.store.set_cache_checked(commit, new_value)?;
        self.split_started = true;

        if had_redo {
            self.split_redoing = true;
            if let Some(previous) = previous {
                let previous_commit = match previous {
                    CacheValue::Commit(c) => Some(c),
                    CacheValue::NoTree | CacheValue::Counted => None,
                };
                let new_commit = match new_value {
                    CacheValue::Commit(c) => Some(c),
                    CacheValue::NoTree | CacheValue::Counted => None,
                };
                if previous_commit != new_commit {
                    return Err(Error::RedoDrift {
                        commit,
                        previous: previous_commit.unwrap_or(commit),
                        recomputed: new_commit.unwrap_or(commit),
                    });
                }
            }
            self.split_redoing = false;
        }

        Ok(())
    }

    fn process_mainline_tree(&mut self, repo: &Repo, commit: crate::git::CommitId) -> Result<CacheValue> {
        let commit_obj = repo.find_commit_or_fail(commit)?;
        let tree = commit_obj.get_tree()?;
        let subdir_entry = tree.get_path(&self.dir).map_err(RepoError::from)?;
        let target_tree_oid = match subdir_entry {
            Some(entry) if entry.kind == EntryKind::Tree => entry.oid,
            _ => {
                return Err(Error::Assertion(format!(
                    "commit {commit} was classified mainline:tree but its subdirectory is now absent"
                )))
            }
        };

        let mut new_parents = Vec::new();
        for parent in commit_obj.get_parent_oids() {
            match self.store.get_cache(parent)? {
                Some(CacheValue::Commit(mapped)) => new_parents.push(mapped),
                Some(CacheValue::NoTree) => {}
                other => {
                    return Err(Error::Assertion(format!(
                        "parent {parent} of {commit} has unexpected cache state {other:?}"
                    )))
                }
            }
        }

        let target_tree = repo.find_tree(target_tree_oid)?;
        let decision = copy_or_skip::decide(repo, target_tree_oid, &new_parents)?;
        let newrev = match decision {
            Decision::Skip(existing) => existing,
            Decision::Copy(parents) => {
                let metadata = CommitMetadata::from_commit(&commit_obj);
                let original_message = commit_obj.get_message_raw().to_string();
                synth::synth_copy(
                    repo,
                    &self.effects,
                    &metadata,
                    self.options.annotate_prefix.as_deref(),
                    &original_message,
                    &target_tree,
                    &parents,
                )?
            }
        };

        self.store.set_variable(Variable::LatestMainline, commit)?;
        self.store.set_variable(Variable::LatestSplit, newrev)?;
        Ok(CacheValue::Commit(newrev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_test_repo;

    #[test]
    fn split_of_never_added_subtree_is_no_new_revisions() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("outside.txt", 1)?;
        let tip = repo.resolve("HEAD")?;

        let mut engine = Engine::new(
            Effects::new_suppress_for_test(),
            Path::new("sub"),
            EngineOptions::default(),
        )?;
        let err = engine.run(&repo, tip).unwrap_err();
        assert!(matches!(err, Error::NoNewRevisions));
        Ok(())
    }

    #[test]
    fn split_of_single_subtree_commit_maps_to_itself() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/file.txt", 1)?;
        let tip = repo.resolve("HEAD")?;

        let mut engine = Engine::new(
            Effects::new_suppress_for_test(),
            Path::new("sub"),
            EngineOptions::default(),
        )?;
        let result = engine.run(&repo, tip)?;
        let result_commit = repo.find_commit_or_fail(result)?;
        let subdir_oid = repo
            .find_commit_or_fail(tip)?
            .get_tree()?
            .get_path(Path::new("sub"))?
            .unwrap()
            .oid;
        assert_eq!(result_commit.get_tree_oid(), subdir_oid);
        Ok(())
    }

    #[test]
    fn split_twice_is_idempotent() -> eyre::Result<()> {
        let (git, repo) = make_test_repo()?;
        git.commit_file("sub/a.txt", 1)?;
        git.commit_file("sub/b.txt", 2)?;
        git.commit_file("outside.txt", 3)?;
        let tip = repo.resolve("HEAD")?;

        let first = {
            let mut engine = Engine::new(
                Effects::new_suppress_for_test(),
                Path::new("sub"),
                EngineOptions::default(),
            )?;
            engine.run(&repo, tip)?
        };
        let second = {
            let mut engine = Engine::new(
                Effects::new_suppress_for_test(),
                Path::new("sub"),
                EngineOptions::default(),
            )?;
            engine.run(&repo, tip)?
        };
        assert_eq!(first, second);
        Ok(())
    }
}
