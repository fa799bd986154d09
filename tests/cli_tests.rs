use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains as str_contains;
use tempfile::{NamedTempFile, tempdir};

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("lawncare").expect("lawncare binary");
    cmd.env_remove("LAWNCARE_LOG").env("LAWNCARE_TODAY", "2024-01-01");
    cmd
}

fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    cli().write_stdin(script.to_string()).assert()
}

#[test]
fn demo_mode_books_fortnightly_mowing_from_today() {
    cli()
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(str_contains("Demo mode"))
        .stdout(str_contains("Jane Doe"))
        .stdout(str_contains("2024-01-01, 2024-01-15, 2024-01-29"))
        .stdout(str_contains("Done."));
}

#[test]
fn unknown_flag_fails() {
    cli().arg("--bogus").assert().failure();
}

#[test]
fn bad_log_level_fails() {
    cli()
        .env("LAWNCARE_LOG", "chatty")
        .arg("--help")
        .assert()
        .failure()
        .stderr(str_contains("LAWNCARE_LOG"));
}

#[test]
fn add_booking_and_show_occurrences() {
    run_cli("booking add 2 edge 2024-01-01 monthly 3\noccurrences 1\nquit\n")
        .success()
        .stdout(str_contains("Added booking #1 for client 2 on 2024-01-01"))
        .stdout(str_contains(
            "Booking #1 occurrences: 2024-01-01, 2024-01-31, 2024-03-01",
        ));
}

#[test]
fn unknown_repeat_falls_back_to_none() {
    run_cli("booking add 1 MOW 2024-01-01 yearly 5\noccurrences 1\nquit\n")
        .success()
        .stdout(str_contains("Booking #1 occurrences: 2024-01-01\n"));
}

#[test]
fn input_errors_are_reported_and_loop_continues() {
    run_cli("booking add x MOW 2024-01-01\nbooking add 1 MOW 2024-13-01\nbooking add 9 MOW 2024-01-01\nclients\nquit\n")
        .success()
        .stdout(str_contains("Error: invalid id 'x'"))
        .stdout(str_contains("Error: invalid date '2024-13-01'"))
        .stdout(str_contains("Error: no client with id 9"))
        .stdout(str_contains("John Smith"));
}

#[test]
fn expand_previews_dates() {
    run_cli("expand 2024-01-01 weekly 0\nexpand 2024-01-01 fortnightly 3\n")
        .success()
        .stdout(str_contains("> 2024-01-01\n"))
        .stdout(str_contains("2024-01-01, 2024-01-15, 2024-01-29"));
}

#[test]
fn expand_with_huge_count_shows_a_bounded_preview() {
    run_cli("expand 2024-01-01 weekly 9223372036854775807\nquit\n")
        .success()
        .stdout(str_contains("2024-12-16, 2024-12-23, ...\n"))
        .stdout(str_contains("2024-12-30").not());
}

#[test]
fn client_delete_cascades() {
    run_cli("booking add 1 MOW 2024-01-01\nbooking add 2 MOW 2024-01-02\nclient delete 1\nbookings\nquit\n")
        .success()
        .stdout(str_contains("Deleted client 1 (1 booking(s) removed)."))
        .stdout(str_contains("John Smith"))
        .stdout(str_contains("Jane Doe").not());
}

#[test]
fn agenda_lists_visits_in_window() {
    run_cli("booking add 1 MOW 2024-01-01 weekly 4\nbooking status 1 completed\nbooking add 2 TRIM 2024-01-10\nagenda 2024-01-01 2024-01-31\nquit\n")
        .success()
        .stdout(str_contains("Booking #1 is now completed."))
        .stdout(str_contains("| 2024-01-10 | 2          | John Smith"));
}

#[test]
fn save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "client add Pat Kim pat@example.com 555-3333 9 Birch Rd\nsave json {path}\nclient add Temp Person t@example.com 1 Nowhere\nload json {path}\nclients\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains(&format!("Ledger saved to {path} (json)")));
    assert!(output.contains(&format!("Ledger loaded from {path} (json)")));
    let after_reload = output.split("Ledger loaded from").last().unwrap_or_default();
    assert!(after_reload.contains("Pat Kim"));
    assert!(after_reload.contains("9 Birch Rd"));
    assert!(
        !after_reload.contains("Temp Person"),
        "temporary client should not appear after reload:\n{after_reload}"
    );
}

#[test]
fn configured_storage_is_loaded_at_startup() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.json");
    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        serde_json::json!({
            "profile": { "business_name": "Green Acres" },
            "seed_demo_data": true,
            "storage": { "backend": "json", "path": ledger_path }
        })
        .to_string(),
    )
    .unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .write_stdin("booking add 1 MOW 2024-02-02 weekly 2\nsave\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("Green Acres (CLI)"));

    cli()
        .arg("--config")
        .arg(&config_path)
        .write_stdin("occurrences 1\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("Booking #1 occurrences: 2024-02-02, 2024-02-09"));
}

#[test]
fn no_seed_starts_empty() {
    cli()
        .arg("--no-seed")
        .write_stdin("booking add 1 MOW 2024-01-01\nquit\n")
        .assert()
        .success()
        .stdout(str_contains("Error: no client with id 1"));
}
