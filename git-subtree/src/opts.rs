//! Top-level command-line grammar: sub-commands and the flags specific to
//! each, built from the reusable argument groups in `opts` (the
//! `git-subtree-opts` crate).

use clap::{Parser, Subcommand};
use opts::{AddMergeArgs, GlobalArgs, PrefixArgs, RememberArg, SplitArgs};

/// Split and merge subdirectory history against another repository's
/// history.
#[derive(Parser, Debug)]
#[command(name = "git-subtree", version)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a remote repository's history as a subdirectory, creating the
    /// subdirectory if it doesn't already exist.
    Add {
        #[command(flatten)]
        prefix: PrefixArgs,

        /// The repository to fetch from.
        repository: String,

        /// The ref (branch, tag, or commit) to add.
        refspec: String,

        #[command(flatten)]
        add_merge: AddMergeArgs,
    },

    /// Merge a previously-fetched commit into an existing subdirectory.
    Merge {
        #[command(flatten)]
        prefix: PrefixArgs,

        /// The commit (usually the tip of a previously fetched branch) to
        /// merge into the subdirectory.
        commit: String,

        #[command(flatten)]
        add_merge: AddMergeArgs,
    },

    /// Fetch from a remote repository and merge its history into the
    /// subdirectory.
    Pull {
        #[command(flatten)]
        prefix: PrefixArgs,

        /// The repository to fetch from.
        repository: String,

        /// The ref (branch or tag) to pull.
        refspec: String,

        #[command(flatten)]
        add_merge: AddMergeArgs,
    },

    /// Split the subdirectory's history out and push it to a remote
    /// repository.
    Push {
        #[command(flatten)]
        prefix: PrefixArgs,

        /// The repository to push to.
        repository: String,

        /// The ref to push the split history to.
        refspec: String,

        /// Prefix prepended to every synthesized subtree commit's message.
        #[clap(long = "annotate", value_parser)]
        annotate: Option<String>,

        /// Treat prior add/rejoin annotation trailers as absent.
        #[clap(action, long = "ignore-joins")]
        ignore_joins: bool,

        /// Treat this mainline commit as the base of the split.
        #[clap(long = "onto", value_parser)]
        onto: Vec<String>,

        /// Treat this mainline commit as not containing the subdirectory.
        #[clap(long = "notree", value_parser)]
        notree: Vec<String>,

        /// Assert that BEFORE maps to AFTER. May be repeated.
        #[clap(long = "remember", value_parser)]
        remember: Vec<RememberArg>,
    },

    /// Project the subdirectory's history into its own independent commit
    /// history.
    Split {
        #[command(flatten)]
        prefix: PrefixArgs,

        #[command(flatten)]
        split: SplitArgs,
    },
}
