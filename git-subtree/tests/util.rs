//! Shared fixture helpers for the integration tests: build two on-disk
//! repositories (a "main" repo and an "upstream" repo to fetch from) and
//! drive the compiled `git-subtree` binary against them with `assert_cmd`.

use std::path::Path;

use assert_cmd::Command;
use lib::testing::Git;

/// A pair of fixture repositories: `main` is where commands run, `upstream`
/// is the remote `add`/`merge`/`pull` fetch from.
pub struct Fixture {
    pub main: Git,
    pub upstream: Git,
}

pub fn make_fixture() -> eyre::Result<Fixture> {
    let main = Git::new()?;
    main.init_repo()?;
    let upstream = Git::new()?;
    upstream.init_repo()?;
    upstream.commit_file("README.md", 1)?;
    Ok(Fixture { main, upstream })
}

/// Build an `assert_cmd::Command` for the compiled binary, rooted at
/// `repo_path`, with `TEST_GIT` and a clean environment so fixture commits
/// stay deterministic.
pub fn subtree_cmd(repo_path: &Path, path_to_git: &Path) -> eyre::Result<Command> {
    let mut cmd = Command::cargo_bin("git-subtree")?;
    cmd.current_dir(repo_path)
        .env_clear()
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("TEST_GIT", path_to_git)
        .env("HOME", repo_path)
        .env("GIT_AUTHOR_NAME", "Testy McTestface")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Testy McTestface")
        .env("GIT_COMMITTER_EMAIL", "test@example.com");
    Ok(cmd)
}
