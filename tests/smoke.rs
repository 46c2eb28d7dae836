use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("tardis").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn enrich_requires_both_relations() {
    let mut cmd = Command::cargo_bin("tardis").expect("binary exists");
    cmd.args(["enrich", "--label", "x", "--adr", "a.tsv"])
        .assert()
        .failure();
}
