#![cfg(feature = "cli")]

use assert_cmd::Command;
use chrono::NaiveDate;
use comic_workflow::{Project, load_steps_from_csv};
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("COMIC_WORKFLOW_HTTP_ADDR")
        .write_stdin(script.to_string())
        .assert()
}

fn project_file() -> (NamedTempFile, String) {
    let tmp = NamedTempFile::new().expect("create temp file");
    let project = Project::new(1, "Night Shift #1", NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    std::fs::write(tmp.path(), serde_json::to_string(&project).unwrap()).unwrap();
    let path = tmp.path().to_string_lossy().to_string();
    (tmp, path)
}

#[test]
fn cli_initializes_and_lists_workflow() {
    let (_tmp, path) = project_file();
    run_cli(&format!("project load {path}\ninit 1\nsteps 1\nquit\n"))
        .success()
        .stdout(str_contains("Loaded projects: [1]"))
        .stdout(str_contains("Initialized workflow for project 1 (9 steps)."))
        .stdout(str_contains("| pencils"))
        .stdout(str_contains("2025-03-03"));
}

#[test]
fn cli_requires_confirmation_to_rebuild() {
    let (_tmp, path) = project_file();
    run_cli(&format!(
        "project load {path}\ninit 1\ninit 1\ninit 1 confirm\nquit\n"
    ))
    .success()
    .stdout(str_contains("re-initialization must be confirmed"))
    .stdout(str_contains("Initialized workflow for project 1 (9 steps)."));
}

#[test]
fn cli_updates_step_status() {
    let (_tmp, path) = project_file();
    run_cli(&format!(
        "project load {path}\ninit 1\nstatus 1 in_progress\nprogress 1 60\nstatus 1 approved\nquit\n"
    ))
    .success()
    .stdout(str_contains("Step 1 is now in_progress."))
    .stdout(str_contains("Step 1 progress 60%."))
    .stdout(str_contains("cannot move a step from in_progress to approved"));
}

#[test]
fn cli_calculates_timeline() {
    run_cli("timeline forward 2025-01-01 distributor\ntimeline backward 2025-02-03 direct 7 14 5\nquit\n")
        .success()
        .stdout(str_contains("In store          : 2025-02-03"))
        .stdout(str_contains("Completion        : 2025-01-08"));
}

#[test]
fn cli_exports_csv() {
    let (_tmp, path) = project_file();
    let out = NamedTempFile::new().expect("create temp file");
    let out_path = out.path().to_string_lossy().to_string();
    run_cli(&format!(
        "project load {path}\ninit 1\nsave csv 1 {out_path}\nquit\n"
    ))
    .success()
    .stdout(str_contains("Workflow saved to"));

    let steps = load_steps_from_csv(out.path()).unwrap();
    assert_eq!(steps.len(), 9);
}

#[test]
fn cli_reports_unknown_commands_and_projects() {
    run_cli("frobnicate\nsteps 5\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."))
        .stdout(str_contains("Error: project 5 not found"));
}
