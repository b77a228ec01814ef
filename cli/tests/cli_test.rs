use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::process::Command;

fn statebench() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("statebench")?;
    cmd.env_remove("STATEBENCH_TRACE");
    Ok(cmd)
}

#[test]
fn table_lists_every_phase() -> Result<(), Box<dyn Error>> {
    let mut cmd = statebench()?;
    cmd.args(["200", "--strategy", "mutable,reducer"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("statebench: 200 items"))
        .stdout(predicate::str::contains("BULK_SET"))
        .stdout(predicate::str::contains("APPEND"))
        .stdout(predicate::str::contains("REMOVE"))
        .stdout(predicate::str::contains("reducer"))
        .stdout(predicate::str::contains("persistent").not());
    Ok(())
}

#[test]
fn json_reports_every_strategy_completed() -> Result<(), Box<dyn Error>> {
    let output = statebench()?
        .args(["5", "--remove-index", "1", "--repeat", "2", "--format", "json"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["config"]["size"], 5);
    assert_eq!(value["completed"].as_array().map(Vec::len), Some(6));
    assert_eq!(value["measurements"].as_array().map(Vec::len), Some(6 * 3 * 2));
    assert!(value["generated_at"].as_str().is_some());
    Ok(())
}

#[test]
fn removal_out_of_range_fails_run() -> Result<(), Box<dyn Error>> {
    let mut cmd = statebench()?;
    cmd.args(["5", "--remove-index", "10", "-s", "mutable,observable"]);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED: IndexOutOfRange"))
        .stderr(predicate::str::contains("no strategy completed every phase"));
    Ok(())
}

#[test]
fn csv_has_header() -> Result<(), Box<dyn Error>> {
    let mut cmd = statebench()?;
    cmd.args(["50", "--format", "csv", "-s", "tree-snapshot"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("strategy,operation,samples"))
        .stdout(predicate::str::contains("tree-snapshot,REMOVE,1,"));
    Ok(())
}

#[test]
fn unknown_strategy_is_usage_error() -> Result<(), Box<dyn Error>> {
    let mut cmd = statebench()?;
    cmd.args(["--strategy", "btree"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("unknown strategy 'btree'"));
    Ok(())
}

#[test]
fn list_prints_registry() -> Result<(), Box<dyn Error>> {
    let mut cmd = statebench()?;
    cmd.arg("--list");
    let mut assert = cmd.assert().success();
    for name in [
        "mutable",
        "copy-on-write",
        "persistent",
        "tree-snapshot",
        "observable",
        "reducer",
    ] {
        assert = assert.stdout(predicate::str::contains(name));
    }
    Ok(())
}
