use assert_cmd::Command;
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing, acting as `user` when given
    pub fn command(&self, user: Option<Uuid>) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");

        // Run inside the temp dir so no stray cadence.toml is picked up
        cmd.current_dir(self.temp_dir.path());
        cmd.env("CADENCE_DATABASE_PATH", self.temp_dir.path().join("test.db"));
        cmd.env_remove("CADENCE_USER_ID");
        cmd.env_remove("CADENCE_LOG");
        cmd.env_remove("RUST_LOG");
        if let Some(user) = user {
            cmd.env("CADENCE_USER_ID", user.to_string());
        }

        cmd
    }

    /// Helper to run a command as `user` and assert success
    pub fn run_as(&self, user: Uuid, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command(Some(user)).args(args).assert().success()
    }

    /// Helper to run a command without a user and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command(None).args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, user: Option<Uuid>, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command(user).args(args).assert().failure()
    }

    /// Runs a command as `user` and returns its stdout
    pub fn stdout_as(&self, user: Uuid, args: &[&str]) -> String {
        let output = self.run_as(user, args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout was not UTF-8")
    }
}

/// Pulls the UUID that follows `label` (e.g. "Series ID:") out of command output.
pub fn extract_id(output: &str, label: &str) -> Uuid {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .and_then(|rest| Uuid::parse_str(rest.trim()).ok())
        .unwrap_or_else(|| panic!("no '{}' line in output:\n{}", label, output))
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains schedule table headers
    pub fn has_schedule_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Date")
            .and(predicate::str::contains("Workout"))
            .and(predicate::str::contains("Group"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
