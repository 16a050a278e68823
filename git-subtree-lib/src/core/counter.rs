//! The counter pass: a dry run over the same traversal the processor
//! will perform, used to drive an accurate progress bar. Marks each
//! visited commit `counted` in the cache so the processor's own traversal
//! gate can distinguish "not yet seen" from "already walked by this pass"
//! without re-walking parents it has already queued.
//!
//! Uses an explicit work-stack with white/gray/black coloring rather than
//! native recursion, since mainline histories can be tens of thousands of
//! commits deep and blow the native stack.

use std::collections::HashMap;
use std::path::Path;

use tracing::instrument;

use crate::core::effects::{Effects, OperationType};
use crate::core::error::Result;
use crate::core::parents::select_parents;
use crate::core::store::{CacheValue, Store};
use crate::git::{CommitId, Repo};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// Count the commits between what the cache already covers and `tip`,
/// reporting progress on `effects` as it goes. Returns the total discovered.
#[instrument(skip(repo, store, effects))]
pub fn count(
    repo: &Repo,
    store: &Store,
    effects: &Effects,
    dir: &Path,
    ignore_joins: bool,
    tip: CommitId,
) -> Result<usize> {
    let progress = effects.start_operation(OperationType::CountCommits);
    let mut colors: HashMap<CommitId, Color> = HashMap::new();
    let mut stack = vec![tip];
    let mut total = 0usize;

    while let Some(commit) = stack.pop() {
        match colors.get(&commit) {
            Some(Color::Black) => continue,
            Some(Color::Gray) => {
                colors.insert(commit, Color::Black);
                continue;
            }
            None => {}
        }

        if matches!(
            store.get_cache(commit)?,
            Some(CacheValue::Commit(_)) | Some(CacheValue::NoTree)
        ) {
            colors.insert(commit, Color::Black);
            continue;
        }

        total += 1;
        progress.notify_progress_inc(1);
        store.set_cache(commit, CacheValue::Counted)?;
        colors.insert(commit, Color::Gray);
        stack.push(commit);

        let selection = select_parents(repo, store, dir, ignore_joins, commit)?;
        for parent in selection.parents {
            if !colors.contains_key(&parent) {
                stack.push(parent);
            }
        }
    }

    Ok(total)
}
