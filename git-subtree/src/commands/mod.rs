//! Sub-commands of `git-subtree`: each is a thin driver that resolves the
//! active repository state and delegates to `subtree` (the `git-subtree-lib`
//! crate) for the actual history rewriting.

pub mod add;
pub mod common;
pub mod merge;
pub mod pull;
pub mod push;
pub mod split;

use lib::core::effects::Effects;
use lib::git::{GitRunInfo, Repo};
use lib::util::ExitCode;

use crate::opts::Command;

/// Dispatch a parsed [`Command`] to its driver function.
pub fn run(
    effects: &Effects,
    git_run_info: &GitRunInfo,
    repo: &Repo,
    command: Command,
) -> eyre::Result<ExitCode> {
    match command {
        Command::Add {
            prefix,
            repository,
            refspec,
            add_merge,
        } => add::command_main(
            effects,
            git_run_info,
            repo,
            &prefix.prefix,
            &repository,
            &refspec,
            &add_merge,
        ),

        Command::Merge {
            prefix,
            commit,
            add_merge,
        } => merge::command_main(effects, repo, &prefix.prefix, &commit, &add_merge),

        Command::Pull {
            prefix,
            repository,
            refspec,
            add_merge,
        } => pull::command_main(
            effects,
            git_run_info,
            repo,
            &prefix.prefix,
            &repository,
            &refspec,
            &add_merge,
        ),

        Command::Push {
            prefix,
            repository,
            refspec,
            annotate,
            ignore_joins,
            onto,
            notree,
            remember,
        } => push::command_main(
            effects,
            git_run_info,
            repo,
            &prefix.prefix,
            &repository,
            &refspec,
            annotate.as_deref(),
            ignore_joins,
            &onto,
            &notree,
            &remember,
        ),

        Command::Split { prefix, split } => {
            split::command_main(effects, repo, &prefix.prefix, &split)
        }
    }
}
