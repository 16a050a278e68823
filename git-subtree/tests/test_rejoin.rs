//! `git subtree split --rejoin`: recording a split's result back into the
//! mainline so later splits resume from it instead of starting fresh.

mod util;

use util::{make_fixture, subtree_cmd};

#[test]
fn rejoin_records_split_tip_on_mainline() -> eyre::Result<()> {
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

    fixture.main.commit_file("vendor/extra.md", 3)?;

    let assert = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor", "--rejoin"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let split_tip: lib::git::CommitId = stdout.trim().parse()?;

    let repo = fixture.main.get_repo()?;
    let head = repo.resolve("HEAD")?;
    let commit = repo.find_commit_or_fail(head)?;
    assert_eq!(
        commit.get_summary()?.to_string(),
        format!("Split 'vendor/' into commit '{split_tip}'")
    );

    // A second split with nothing new to contribute sees the rejoin record
    // and makes no further progress.
    let second = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor"])
        .assert()
        .success();
    let second_stdout = String::from_utf8(second.get_output().stdout.clone())?;
    assert_eq!(second_stdout.trim(), split_tip.to_string());

    Ok(())
}

#[test]
fn rejoin_loop_produces_clean_subtree_history_on_third_split() -> eyre::Result<()> {
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

    // Cycle 1: one commit in each tree, then rejoin.
    fixture.main.commit_file("vendor/a.md", 3)?;
    fixture.main.commit_file("top1.md", 4)?;
    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor", "--rejoin"])
        .assert()
        .success();

    // Cycle 2: another commit in each tree, then rejoin again.
    fixture.main.commit_file("vendor/b.md", 6)?;
    fixture.main.commit_file("top2.md", 7)?;
    subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor", "--rejoin"])
        .assert()
        .success();

    // One more commit in each tree, then a plain (non-rejoin) third split.
    fixture.main.commit_file("vendor/c.md", 9)?;
    fixture.main.commit_file("top3.md", 10)?;
    let third = subtree_cmd(&fixture.main.repo_path, &fixture.main.path_to_git)?
        .args(["split", "--prefix=vendor"])
        .assert()
        .success();
    let third_stdout = String::from_utf8(third.get_output().stdout.clone())?;
    let split_tip: lib::git::CommitId = third_stdout.trim().parse()?;

    let repo = fixture.main.get_repo()?;

    // Walk the synthesized chain back to its root, collecting each commit's
    // message along the way.
    let mut chain = Vec::new();
    let mut cursor = split_tip;
    loop {
        let commit = repo.find_commit_or_fail(cursor)?;
        chain.push(commit.get_message_raw().to_string());
        let parents = commit.get_parent_oids();
        match parents.as_slice() {
            [] => break,
            [only] => cursor = *only,
            _ => panic!("synthesized subtree commit {cursor} has more than one parent"),
        }
    }

    // Exactly the four subdirectory-touching commits (the initial `add` and
    // the three `vendor/*.md` commits), none of them a rejoin marker.
    assert_eq!(chain.len(), 4);
    for message in &chain {
        assert!(
            !message.starts_with("Split 'vendor/' into commit"),
            "rejoin marker leaked into subtree history: {message}"
        );
    }

    let tip_tree = repo.find_commit_or_fail(split_tip)?.get_tree()?;
    for present in ["README.md", "a.md", "b.md", "c.md"] {
        assert!(
            tip_tree.get_path(std::path::Path::new(present))?.is_some(),
            "expected {present} in the split tip's tree"
        );
    }
    for absent in ["top1.md", "top2.md", "top3.md"] {
        assert!(
            tip_tree.get_path(std::path::Path::new(absent))?.is_none(),
            "did not expect {absent} in the split tip's tree"
        );
    }

    Ok(())
}
