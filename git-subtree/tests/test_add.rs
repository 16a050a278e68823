//! `git subtree add`: creating a subdirectory from another repository's
//! history.

mod util;

use util::{make_fixture, subtree_cmd};

#[test]
fn add_creates_prefix_with_exact_subject() -> eyre::Result<()> {
    let fixture = make_fixture()?;
    let upstream_tip = {
        let repo = fixture.upstream.get_repo()?;
        repo.resolve("HEAD")?
    };

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "add",
            "--prefix=vendor",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .success();

    assert!(fixture.main.repo_path.join("vendor/README.md").exists());

    let repo = fixture.main.get_repo()?;
    let head = repo.resolve("HEAD")?;
    let commit = repo.find_commit_or_fail(head)?;
    assert_eq!(
        commit.get_summary()?.to_string(),
        format!("Add 'vendor/' from commit '{upstream_tip}'")
    );

    Ok(())
}

#[test]
fn add_squash_uses_squash_subject() -> eyre::Result<()> {
    let fixture = make_fixture()?;

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "add",
            "--prefix=vendor",
            "--squash",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .success();

    let repo = fixture.main.get_repo()?;
    let head = repo.resolve("HEAD")?;
    let commit = repo.find_commit_or_fail(head)?;
    let summary = commit.get_summary()?.to_string();
    assert!(summary.starts_with("Merge commit '"));
    assert!(summary.ends_with("' as 'vendor'"));

    Ok(())
}

#[test]
fn add_fails_if_prefix_already_exists() -> eyre::Result<()> {
    let fixture = make_fixture()?;
    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "add",
            "--prefix=vendor",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .success();

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "add",
            "--prefix=vendor",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .failure();

    Ok(())
}
