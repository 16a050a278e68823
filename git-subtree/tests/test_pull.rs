//! `git subtree pull`: fetch-then-merge in one step.

mod util;

use util::{make_fixture, subtree_cmd};

#[test]
fn pull_fetches_and_merges_in_one_step() -> eyre::Result<()> {
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

    fixture.upstream.commit_file("CHANGES.md", 2)?;
    let new_upstream_tip = {
        let repo = fixture.upstream.get_repo()?;
        repo.resolve("HEAD")?
    };

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "pull",
            "--prefix=vendor",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .success();

    assert!(fixture
        .main
        .repo_path
        .join("vendor/CHANGES.md")
        .exists());

    let repo = fixture.main.get_repo()?;
    let head = repo.resolve("HEAD")?;
    let commit = repo.find_commit_or_fail(head)?;
    assert_eq!(
        commit.get_summary()?.to_string(),
        format!("Merge 'vendor/' changes from commit '{new_upstream_tip}'")
    );

    Ok(())
}

#[test]
fn pull_requires_existing_prefix() -> eyre::Result<()> {
    let fixture = make_fixture()?;

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "pull",
            "--prefix=vendor",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ])
        .assert()
        .failure();

    Ok(())
}
