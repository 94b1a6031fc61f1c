//! Black-box tests for the cadence binary: every command runs against a fresh
//! SQLite database in a temporary directory.

use predicates::prelude::*;
use uuid::Uuid;

mod helpers;
use helpers::{assertions, extract_id, CliTestHarness};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("recurring workouts"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));

    harness
        .run_failure(None, &["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_preview_clamps_day_of_month() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "preview",
            "--rule",
            "monthly:31",
            "--start",
            "2025-01-31",
            "--until",
            "2025-04-30",
        ])
        .stdout(predicate::str::contains("Monthly on day 31"))
        .stdout(predicate::str::contains("2025-01-31"))
        .stdout(predicate::str::contains("2025-02-28"))
        .stdout(predicate::str::contains("2025-03-31"))
        .stdout(predicate::str::contains("2025-04-30"));
}

#[test]
fn test_preview_reports_truncation() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "preview", "--rule", "daily", "--start", "2025-01-01", "--count", "3",
        ])
        .stdout(predicate::str::contains("2025-01-03"))
        .stdout(predicate::str::contains("2025-01-04").not())
        .stdout(predicate::str::contains("Stopped at 3 instances"));
}

#[test]
fn test_invalid_rule_is_rejected() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(None, &["preview", "--rule", "fortnightly"])
        .stderr(predicate::str::contains("Invalid recurrence rule"));

    harness
        .run_failure(None, &["preview", "--rule", "weekly:"])
        .stderr(assertions::has_error());
}

#[test]
fn test_schedule_requires_user() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(None, &["schedule", "Fran", "--start", "2025-03-10"])
        .stderr(predicate::str::contains("no user configured"));
}

#[test]
fn test_schedule_series_and_list() {
    let harness = CliTestHarness::new();
    let athlete = Uuid::now_v7();

    let output = harness.stdout_as(
        athlete,
        &[
            "schedule",
            "Back squat 5x5",
            "--type",
            "lift",
            "--rule",
            "weekly:mon,wed",
            "--start",
            "2025-01-06",
            "--count",
            "4",
        ],
    );
    assert!(output.contains("Scheduled 4 workout(s)"));
    assert!(output.contains("Weekly: Mon, Wed"));
    extract_id(&output, "Series ID:");

    harness
        .run_as(athlete, &["list", "--from", "2025-01-01", "--to", "2025-01-31"])
        .stdout(assertions::has_schedule_table_headers())
        .stdout(predicate::str::contains("Back squat 5x5"))
        .stdout(predicate::str::contains("2025-01-15"))
        .stdout(predicate::str::contains("Personal"));

    // Another user sees nothing
    harness
        .run_as(Uuid::now_v7(), &["list", "--from", "2025-01-01", "--to", "2025-01-31"])
        .stdout(predicate::str::contains("No workouts scheduled"));
}

#[test]
fn test_group_workouts_reach_members() {
    let harness = CliTestHarness::new();
    let coach = Uuid::now_v7();
    let athlete = Uuid::now_v7();

    harness
        .run_as(coach, &["group", "add", "Barbell Club"])
        .stdout(predicate::str::contains("Created group 'Barbell Club'"));
    harness
        .run_as(athlete, &["group", "join", "Barbell Club"])
        .stdout(predicate::str::contains("joined 'Barbell Club'"));
    harness
        .run_success(&["group", "list"])
        .stdout(predicate::str::contains("Barbell Club"));

    harness.run_as(
        coach,
        &[
            "schedule",
            "Grace",
            "--group",
            "Barbell Club",
            "--rule",
            "monthly:last-fri",
            "--start",
            "2025-01-01",
            "--until",
            "2025-03-31",
        ],
    );

    harness
        .run_as(athlete, &["list", "--from", "2025-01-01", "--to", "2025-03-31"])
        .stdout(predicate::str::contains("Grace"))
        .stdout(predicate::str::contains("2025-01-31"))
        .stdout(predicate::str::contains("2025-02-28"))
        .stdout(predicate::str::contains("2025-03-28"))
        .stdout(predicate::str::contains("Barbell Club"));

    harness.run_as(athlete, &["group", "leave", "Barbell Club"]);
    harness
        .run_as(athlete, &["list", "--from", "2025-01-01", "--to", "2025-03-31"])
        .stdout(predicate::str::contains("No workouts scheduled"));
}

#[test]
fn test_schedule_to_unknown_group_fails() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(
            Some(Uuid::now_v7()),
            &["schedule", "Fran", "--group", "Nobody", "--start", "2025-03-10"],
        )
        .stderr(predicate::str::contains("Group 'Nobody' not found"));
}

#[test]
fn test_hidden_details_are_redacted_for_members() {
    let harness = CliTestHarness::new();
    let coach = Uuid::now_v7();
    let athlete = Uuid::now_v7();

    harness.run_as(coach, &["group", "add", "Competitors"]);
    harness.run_as(athlete, &["group", "join", "Competitors"]);
    harness.run_as(
        coach,
        &[
            "schedule",
            "Open 26.1",
            "--description",
            "Secret chipper",
            "--group",
            "Competitors",
            "--hide-details",
            "--start",
            "2099-02-26",
        ],
    );

    harness
        .run_as(athlete, &["list", "--from", "2099-02-01", "--to", "2099-02-28", "--json"])
        .stdout(predicate::str::contains("Hidden workout"))
        .stdout(predicate::str::contains("Open 26.1").not())
        .stdout(predicate::str::contains("Secret chipper").not());

    harness
        .run_as(athlete, &["list", "--from", "2099-02-01", "--to", "2099-02-28"])
        .stdout(predicate::str::contains("Hidden until 2099-02-26"))
        .stdout(predicate::str::contains("Open 26.1").not());

    harness
        .run_as(coach, &["group", "join", "Competitors"])
        .stdout(predicate::str::contains("joined"));
    harness
        .run_as(coach, &["list", "--from", "2099-02-01", "--to", "2099-02-28", "--json"])
        .stdout(predicate::str::contains("Secret chipper"));
}

#[test]
fn test_edit_and_delete_single_workout() {
    let harness = CliTestHarness::new();
    let athlete = Uuid::now_v7();

    let output = harness.stdout_as(athlete, &["schedule", "Row 5k", "--start", "2025-04-02"]);
    let id = extract_id(&output, "ID:");
    let prefix = &id.simple().to_string()[..12];

    harness
        .run_as(athlete, &["edit", prefix, "--title", "Row 10k", "--date", "2025-04-03"])
        .stdout(predicate::str::contains("Updated 'Row 10k' on 2025-04-03"));

    harness
        .run_failure(Some(athlete), &["edit", prefix])
        .stderr(predicate::str::contains("nothing to change"));

    // No terminal to confirm on, so the prompt declines
    harness
        .run_as(athlete, &["delete", prefix])
        .stdout(predicate::str::contains("Deletion cancelled"));

    harness
        .run_as(athlete, &["delete", &id.to_string(), "--force"])
        .stdout(predicate::str::contains("Deleted workout"));

    harness
        .run_failure(Some(athlete), &["delete", &id.to_string(), "--force"])
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_delete_series() {
    let harness = CliTestHarness::new();
    let athlete = Uuid::now_v7();

    let output = harness.stdout_as(
        athlete,
        &[
            "schedule",
            "Mobility",
            "--rule",
            "daily",
            "--start",
            "2025-02-01",
            "--until",
            "2025-02-05",
        ],
    );
    let series_id = extract_id(&output, "Series ID:");

    harness
        .run_as(athlete, &["delete-series", &series_id.to_string(), "--force"])
        .stdout(predicate::str::contains("Deleted 5 workout(s)"));

    harness
        .run_as(athlete, &["list", "--from", "2025-02-01", "--to", "2025-02-28"])
        .stdout(predicate::str::contains("No workouts scheduled"));

    harness
        .run_failure(Some(athlete), &["delete-series", &series_id.to_string(), "--force"])
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_rule_with_no_dates_schedules_nothing() {
    let harness = CliTestHarness::new();

    harness
        .run_as(
            Uuid::now_v7(),
            &[
                "schedule", "Test day", "--rule", "monthly:5", "--start", "2025-02-10", "--until",
                "2025-02-28",
            ],
        )
        .stdout(predicate::str::contains("nothing was scheduled"));
}
