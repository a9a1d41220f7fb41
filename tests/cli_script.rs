mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("expense_tracker_cli").unwrap();
    cmd.env("EXPENSE_TRACKER_CLI_SCRIPT", "1")
        .env("EXPENSE_TRACKER_HOME", home)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = common::temp_base_dir();
    let input = "add Coffee 3.5 Food 2024-01-01\n\
                 add Bus 1.2 Transport 2024-01-02\n\
                 total\n\
                 filter food all\n\
                 list\n\
                 chart\n\
                 exit\n";

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: ₹4.70"))
        .stdout(predicate::str::contains("Total: ₹3.50"))
        .stdout(predicate::str::contains("100.0%"));

    let json = std::fs::read_to_string(home.join("data").join("expenses_v1.json")).unwrap();
    assert!(json.starts_with(r#"[{"id":"#));
    assert!(json.contains(r#""title":"Bus""#));
    assert!(json.contains(r#""date":"2024-01-01T00:00:00.000Z""#));
}

#[test]
fn saved_expenses_are_reloaded_on_start() {
    let home = common::temp_base_dir();
    cli(&home)
        .write_stdin("add Rent 900 Bills 2024-03-01\n")
        .assert()
        .success();

    cli(&home)
        .write_stdin("filter bills\ntotal\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 saved expense(s)."))
        .stdout(predicate::str::contains("Total: ₹900.00"));
}

#[test]
fn empty_chart_says_so() {
    let home = common::temp_base_dir();
    cli(&home)
        .write_stdin("chart\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No expenses match the current filters."));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = common::temp_base_dir();
    cli(&home)
        .write_stdin("totl\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown command `totl`"))
        .stdout(predicate::str::contains("Did you mean `total`?"));
}
