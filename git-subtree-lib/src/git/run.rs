//! Shelling out to the real `git` executable.
//!
//! `merge`, `fetch`, and `push` are implemented this way rather than against
//! `git2` directly: a faithful three-way merge with conflict markers, and the
//! full range of remote transports and credential helpers, are impractical to
//! reimplement against bare libgit2 primitives. Whenever an operation can be
//! done with `git2` instead (everything in [`crate::git::repo`]), it is;
//! this wrapper is reserved for the handful of operations that can't.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read, Write as WriteIo};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

use eyre::Context;
use itertools::Itertools;
use tracing::instrument;

use crate::core::effects::{Effects, OperationType};
use crate::util::ExitCode;

/// Path to the `git` executable on disk, plus the environment it should be
/// invoked with.
#[derive(Clone)]
pub struct GitRunInfo {
    /// The path to the Git executable on disk.
    pub path_to_git: PathBuf,

    /// The working directory that the Git executable should be run in.
    pub working_directory: PathBuf,

    /// The environment variables that should be passed to the Git process.
    pub env: HashMap<OsString, OsString>,
}

impl std::fmt::Debug for GitRunInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<GitRunInfo path_to_git={:?} working_directory={:?} env=not shown>",
            self.path_to_git, self.working_directory
        )
    }
}

/// The result of invoking Git.
#[must_use]
#[derive(Debug)]
pub struct GitRunResult {
    /// The exit code of the process.
    pub exit_code: i32,

    /// The stdout contents written by the invocation.
    pub stdout: Vec<u8>,

    /// The stderr contents written by the invocation.
    pub stderr: Vec<u8>,
}

impl GitRunInfo {
    /// Resolve the `git` to run: `$TEST_GIT` if set (used by the test
    /// harness), falling back to whatever `git` resolves to on `PATH`.
    pub fn guess() -> eyre::Result<Self> {
        let path_to_git = std::env::var_os(crate::core::config::env_vars::TEST_GIT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("git"));
        let working_directory = std::env::current_dir().wrap_err("getting current directory")?;
        Ok(GitRunInfo {
            path_to_git,
            working_directory,
            env: std::env::vars_os().collect(),
        })
    }

    fn spawn_writer_thread<
        InputStream: Read + Send + 'static,
        OutputStream: WriteIo + Send + 'static,
    >(
        stream: Option<InputStream>,
        mut output: OutputStream,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let stream = match stream {
                Some(stream) => stream,
                None => return,
            };
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                let line = line.expect("reading line from git subprocess");
                writeln!(output, "{line}").expect("writing line from git subprocess");
            }
        })
    }

    /// Run Git in a subprocess and stream its output live, via the supplied
    /// `Effects`. Used for `merge`, `fetch`, and `push`, which the user wants
    /// to see progress from (conflict markers, transfer progress, etc.)
    #[instrument]
    pub fn run<S: AsRef<OsStr> + std::fmt::Debug>(
        &self,
        effects: &Effects,
        args: &[S],
    ) -> eyre::Result<ExitCode> {
        let args: Vec<&OsStr> = args.iter().map(AsRef::as_ref).collect();
        let args_string = args
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect_vec()
            .join(" ");
        let _progress =
            effects.start_operation(OperationType::RunGitCommand(std::sync::Arc::new(
                args_string.clone(),
            )));
        writeln!(
            effects.get_output_stream(),
            "git-subtree: running command: git {args_string}"
        )?;

        let mut command = Command::new(&self.path_to_git);
        command.current_dir(&self.working_directory);
        command.args(&args);
        command.env_clear();
        command.envs(self.env.iter());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().wrap_err("spawning git subprocess")?;
        let stdout = child.stdout.take();
        let stdout_thread = Self::spawn_writer_thread(stdout, effects.get_output_stream());
        let stderr = child.stderr.take();
        let stderr_thread = Self::spawn_writer_thread(stderr, effects.get_error_stream());

        let exit_status = child
            .wait()
            .wrap_err("waiting for git subprocess to complete")?;
        stdout_thread.join().unwrap();
        stderr_thread.join().unwrap();

        let exit_code = exit_status.code().unwrap_or(1);
        Ok(ExitCode(exit_code as isize))
    }

    /// Run Git silently and capture its output, without displaying anything
    /// to the user. Prefer `git2` wherever possible; this exists for the
    /// plumbing queries (`rev-parse --show-toplevel`, etc.) that don't have a
    /// convenient library equivalent.
    #[instrument]
    pub fn run_silent<S: AsRef<str> + std::fmt::Debug>(
        &self,
        args: &[S],
    ) -> eyre::Result<GitRunResult> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let mut command = Command::new(&self.path_to_git);
        command.current_dir(&self.working_directory);
        command.args(&args);
        command.env_clear();
        command.envs(self.env.iter());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let child = command.spawn().wrap_err("spawning git subprocess")?;
        let output = child
            .wait_with_output()
            .wrap_err("waiting for git subprocess to complete")?;
        Ok(GitRunResult {
            exit_code: output.status.code().unwrap_or(1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
