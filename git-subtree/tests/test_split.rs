//! `git subtree split`: projecting a subdirectory's history into its own
//! independent commit history.

mod util;

use util::{make_fixture, subtree_cmd};

#[test]
fn split_projects_only_prefix_contents() -> eyre::Result<()> {
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

    fixture.main.commit_file("top-level.md", 3)?;
    fixture.main.commit_file("vendor/extra.md", 4)?;

    let assert = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let split_tip: lib::git::CommitId = stdout.trim().parse()?;

    let repo = fixture.main.get_repo()?;
    let tree = repo.find_commit_or_fail(split_tip)?.get_tree()?;
    assert!(tree.get_path(std::path::Path::new("README.md"))?.is_some());
    assert!(tree.get_path(std::path::Path::new("extra.md"))?.is_some());
    assert!(tree
        .get_path(std::path::Path::new("top-level.md"))?
        .is_none());

    Ok(())
}

#[test]
fn split_chains_one_synthesized_commit_per_subdirectory_touch() -> eyre::Result<()> {
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

    // One subtree-only change, then two mainline-only changes that don't
    // touch `vendor` at all.
    fixture.main.commit_file("vendor/extra.md", 3)?;
    fixture.main.commit_file("top1.md", 4)?;
    fixture.main.commit_file("top2.md", 5)?;

    let assert = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let split_tip: lib::git::CommitId = stdout.trim().parse()?;

    let repo = fixture.main.get_repo()?;
    let tip_commit = repo.find_commit_or_fail(split_tip)?;

    // Exactly one parent chain: the `add` boundary and the one subtree
    // touch each got their own synthesized commit; the two mainline-only
    // commits were skipped (their rewritten tree matched an existing one).
    let parents = tip_commit.get_parent_oids();
    assert_eq!(parents.len(), 1, "expected a single parent chain");
    let root = repo.find_commit_or_fail(parents[0])?;
    assert_eq!(root.get_parent_count(), 0, "expected exactly two synthesized commits");

    let tree = tip_commit.get_tree()?;
    assert!(tree.get_path(std::path::Path::new("README.md"))?.is_some());
    assert!(tree.get_path(std::path::Path::new("extra.md"))?.is_some());
    assert!(tree.get_path(std::path::Path::new("top1.md"))?.is_none());
    assert!(tree.get_path(std::path::Path::new("top2.md"))?.is_none());

    Ok(())
}

#[test]
fn split_branch_rejects_non_ancestor() -> eyre::Result<()> {
    let fixture = make_fixture()?;
    let initial_commit = {
        let repo = fixture.main.get_repo()?;
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

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor", "--branch=exported"])
        .assert()
        .success();

    // Point `exported` at a commit unrelated to any split tip, so the next
    // split's ancestor check fails.
    fixture
        .main
        .run(5, &["branch", "-f", "exported", &initial_commit.to_string()])?;
    fixture.main.commit_file("vendor/more.md", 6)?;

    let assert = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor", "--branch=exported"])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone())?;
    assert!(stderr.contains("is not an ancestor of commit"));

    Ok(())
}
