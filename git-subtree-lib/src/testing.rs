//! Testing utilities.
//!
//! This is inside `src` rather than `tests` since we use this code in unit
//! tests throughout `core`.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use eyre::Context;
use tempfile::TempDir;

use crate::core::config::env_vars::TEST_GIT;
use crate::git::{GitRunInfo, Repo};

const DUMMY_NAME: &str = "Testy McTestface";
const DUMMY_EMAIL: &str = "test@example.com";
const DUMMY_DATE: &str = "Wed 29 Oct 12:34:56 2020 PDT";

/// Wrapper around the Git executable, for testing. Shells out to the real
/// `git` named by `$TEST_GIT` (or `git` on `PATH`) rather than using `git2`
/// directly, so the fixtures exercise the same on-disk format the production
/// code reads.
pub struct Git {
    /// The path to the repository on disk.
    pub repo_path: PathBuf,

    /// The path to the Git executable used to set up fixtures.
    pub path_to_git: PathBuf,

    // Keeps the backing temporary directory alive for the lifetime of the
    // fixture.
    _temp_dir: TempDir,
}

impl Git {
    /// Create a fresh, empty temporary directory to hold the repository.
    pub fn new() -> eyre::Result<Self> {
        let temp_dir = tempfile::tempdir().wrap_err("creating temporary directory")?;
        let repo_path = temp_dir.path().to_path_buf();
        let path_to_git = std::env::var_os(TEST_GIT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("git"));
        Ok(Git {
            repo_path,
            path_to_git,
            _temp_dir: temp_dir,
        })
    }

    /// Environment variables needed for deterministic, hermetic `git`
    /// invocations: a fixed identity and commit timestamp (offset by `time`,
    /// so a sequence of fixture commits get distinct, increasing timestamps),
    /// and `GIT_CONFIG_NOSYSTEM` to keep the host's global config out of it.
    fn base_env(&self, time: isize) -> Vec<(OsString, OsString)> {
        let date: OsString = format!("{DUMMY_DATE} -{time:0>2}").into();
        vec![
            ("GIT_CONFIG_NOSYSTEM".into(), "1".into()),
            ("GIT_AUTHOR_NAME".into(), DUMMY_NAME.into()),
            ("GIT_AUTHOR_EMAIL".into(), DUMMY_EMAIL.into()),
            ("GIT_AUTHOR_DATE".into(), date.clone()),
            ("GIT_COMMITTER_NAME".into(), DUMMY_NAME.into()),
            ("GIT_COMMITTER_EMAIL".into(), DUMMY_EMAIL.into()),
            ("GIT_COMMITTER_DATE".into(), date),
            ("HOME".into(), self.repo_path.as_os_str().into()),
        ]
    }

    /// Run `git` with the given arguments, failing the test on a non-zero
    /// exit code.
    pub fn run(&self, time: isize, args: &[&str]) -> eyre::Result<()> {
        let mut command = Command::new(&self.path_to_git);
        command
            .current_dir(&self.repo_path)
            .args(args)
            .env_clear()
            .envs(self.base_env(time))
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let output = command
            .output()
            .wrap_err_with(|| format!("running git {args:?}"))?;
        if !output.status.success() {
            eyre::bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    /// Initialize a repository with a single empty root commit.
    pub fn init_repo(&self) -> eyre::Result<()> {
        self.run(0, &["init", "-q", "-b", "master"])?;
        self.run(
            0,
            &["commit", "-q", "-m", "initial commit", "--allow-empty"],
        )?;
        Ok(())
    }

    /// Write `name` with deterministic contents, relative to `self.repo_path`
    /// (creating any leading directories), and commit it.
    pub fn commit_file(&self, name: &str, time: isize) -> eyre::Result<()> {
        let path = self.repo_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, format!("{name} contents\n"))?;
        self.run(time, &["add", name])?;
        self.run(time, &["commit", "-q", "-m", &format!("add {name}")])?;
        Ok(())
    }

    /// Open a [`Repo`] onto the fixture's repository.
    pub fn get_repo(&self) -> eyre::Result<Repo> {
        Ok(Repo::from_dir(&self.repo_path)?)
    }

    /// Build a [`GitRunInfo`] pointed at the fixture's repository and Git
    /// executable, for exercising `merge`/`fetch`/`push`.
    pub fn get_git_run_info(&self) -> GitRunInfo {
        GitRunInfo {
            path_to_git: self.path_to_git.clone(),
            working_directory: self.repo_path.clone(),
            env: self.base_env(0).into_iter().collect(),
        }
    }
}

/// Convenience constructor: a fresh repository with one commit. The returned
/// [`Git`] must be kept alive for as long as `Repo` is used, since dropping
/// it removes the backing temporary directory.
pub fn make_test_repo() -> eyre::Result<(Git, Repo)> {
    let git = Git::new()?;
    git.init_repo()?;
    let repo = git.get_repo()?;
    Ok((git, repo))
}
