//! Command-line argument groups shared across `git-subtree`'s sub-commands.

#![warn(missing_docs)]

use std::str::FromStr;

use clap::Args;

/// `--prefix <dir>`, required on every sub-command: the path (relative to
/// the repository root) the subtree lives at or will be added at.
#[derive(Args, Debug, Clone)]
pub struct PrefixArgs {
    /// The subdirectory this subtree lives at (or will be added at).
    #[clap(long = "prefix", value_parser)]
    pub prefix: std::path::PathBuf,
}

/// A single `--remember BEFORE:AFTER` argument, parsed eagerly so a
/// malformed value is reported by `clap` itself rather than deep inside the
/// engine.
#[derive(Debug, Clone)]
pub struct RememberArg {
    pub before: String,
    pub after: String,
}

impl FromStr for RememberArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (before, after) = s
            .split_once(':')
            .ok_or_else(|| format!("'{s}' is not of the form BEFORE:AFTER"))?;
        Ok(RememberArg {
            before: before.to_string(),
            after: after.to_string(),
        })
    }
}

/// Flags meaningful only to `split` (and to `add`/`merge`/`pull` when
/// `--rejoin` is in effect).
#[derive(Args, Debug, Clone, Default)]
pub struct SplitArgs {
    /// Prefix prepended to the commit message of every synthesized subtree
    /// commit, establishing the annotation trailers read back on later runs.
    #[clap(long = "annotate", value_parser)]
    pub annotate: Option<String>,

    /// Name of a branch to create (or update) to point at the synthesized
    /// split tip. If the branch already exists, it must be an ancestor of
    /// the new tip.
    #[clap(long = "branch", value_parser)]
    pub branch: Option<String>,

    /// Treat prior add/rejoin annotation trailers as absent, forcing the
    /// structural classifier to re-derive the commit shape from scratch.
    #[clap(action, long = "ignore-joins")]
    pub ignore_joins: bool,

    /// Treat this mainline commit as the base of the split, even if earlier
    /// history would otherwise be walked.
    #[clap(long = "onto", value_parser)]
    pub onto: Vec<String>,

    /// Treat this mainline commit as not containing the subdirectory, even
    /// if it structurally does (or does not).
    #[clap(long = "notree", value_parser)]
    pub notree: Vec<String>,

    /// After splitting, also record the mapping into the mainline with a
    /// rejoin commit.
    #[clap(action, long = "rejoin")]
    pub rejoin: bool,

    /// Assert that BEFORE maps to AFTER, reconciling a prior split's cache
    /// without recomputing it. May be repeated.
    #[clap(long = "remember", value_parser)]
    pub remember: Vec<RememberArg>,
}

/// Flags meaningful to `add`/`merge`/`pull`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddMergeArgs {
    /// Collapse the subtree history into a single commit before merging it
    /// into the mainline.
    #[clap(action, long = "squash")]
    pub squash: bool,

    /// Use this text as the synthesized merge commit's message instead of
    /// the default `Add`/`Merge` subject.
    #[clap(long = "message", short = 'm', value_parser)]
    pub message: Option<String>,
}

/// Global flags accepted by every sub-command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Suppress the progress line (warnings and errors are still printed).
    #[clap(action, long = "quiet", short = 'q')]
    pub quiet: bool,

    /// Raise the default log level to `debug` for this crate's `tracing`
    /// target.
    #[clap(action, long = "debug")]
    pub debug: bool,
}
