//! `git subtree merge`: merging a previously fetched commit into an
//! existing subdirectory.

mod util;

use util::{make_fixture, subtree_cmd};

#[test]
fn merge_requires_existing_prefix() -> eyre::Result<()> {
    let fixture = make_fixture()?;
    let upstream_tip = {
        let repo = fixture.upstream.get_repo()?;
        repo.resolve("HEAD")?
    };

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["merge", "--prefix=vendor", &upstream_tip.to_string()])
        .assert()
        .failure();

    Ok(())
}

#[test]
fn merge_applies_exact_subject() -> eyre::Result<()> {
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

    fixture.main.run(
        2,
        &[
            "fetch",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ],
    )?;

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["merge", "--prefix=vendor", &new_upstream_tip.to_string()])
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
fn merge_squash_chains_onto_prior_squash_commit_through_unrelated_commits() -> eyre::Result<()> {
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
    let first_squash = repo
        .find_commit_or_fail(head)?
        .get_parent_oids()
        .into_iter()
        .nth(1)
        .expect("wrapper commit has a squash second parent");

    // An ordinary mainline commit, unrelated to `vendor`, lands on top of
    // the `add --squash` wrapper commit before the next merge.
    fixture.main.commit_file("unrelated.md", 2)?;

    fixture.upstream.commit_file("CHANGES.md", 3)?;
    let new_upstream_tip = {
        let upstream_repo = fixture.upstream.get_repo()?;
        upstream_repo.resolve("HEAD")?
    };
    fixture.main.run(
        3,
        &[
            "fetch",
            fixture.upstream.repo_path.to_str().unwrap(),
            "master",
        ],
    )?;

    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args([
            "merge",
            "--prefix=vendor",
            "--squash",
            &new_upstream_tip.to_string(),
        ])
        .assert()
        .success();

    let repo = fixture.main.get_repo()?;
    let head = repo.resolve("HEAD")?;
    let second_squash = repo
        .find_commit_or_fail(head)?
        .get_parent_oids()
        .into_iter()
        .nth(1)
        .expect("wrapper commit has a squash second parent");

    let second_squash_commit = repo.find_commit_or_fail(second_squash)?;
    assert_eq!(
        second_squash_commit.get_parent_oids(),
        vec![first_squash],
        "second squash commit should chain onto the first, even though an \
         unrelated mainline commit sits between the two merges"
    );

    Ok(())
}
