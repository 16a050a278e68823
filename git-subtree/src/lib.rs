//! `git-subtree`: project a subdirectory of a repository into its own
//! independent commit history, and inject a subtree's history back into a
//! subdirectory.
//!
//! This crate is the binary-facing driver layer: it parses the CLI grammar
//! (see [`opts`]) and dispatches to thin command implementations (see
//! [`commands`]) that lean on the split engine and repository wrapper in
//! `subtree` (the `git-subtree-lib` crate) for everything non-trivial.

#![warn(missing_docs)]
#![warn(
    clippy::all,
    clippy::as_conversions,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro
)]
#![allow(clippy::too_many_arguments, clippy::blocks_in_conditions)]

pub mod commands;
pub mod opts;
