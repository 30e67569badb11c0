use predicates::prelude::*;
use wrapkit_cli::test_utils::ProjectFixture;

use crate::common::{run_wrapkit, wrapkit_command};

#[test]
fn test_skip_version_without_force_is_rejected() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["--update", "--skipVersion"]).unwrap();
    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("--forceUpdate"));
    assert_eq!(fixture.manifest_content().unwrap(), wrapkit_manifest("1.2.3"));
}

#[test]
fn test_force_without_update_flag_is_rejected() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["--forceUpdate"]).unwrap();
    assert_eq!(output.code, Some(2));
}

#[test]
fn test_update_flag_with_subcommand_is_rejected() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["--update", "status"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("cannot be combined with a subcommand"));
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["--verbose", "--quiet"]).unwrap();
    assert_eq!(output.code, Some(2));
}

#[test]
fn test_missing_config_file_is_rejected() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();

    let output = run_wrapkit(&fixture, &["status"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("does not exist"), "stderr: {}", output.stderr);
}

#[test]
fn test_help_lists_update_flags_and_hides_handoff() {
    let temp = tempfile::TempDir::new().unwrap();
    wrapkit_command(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--updateMinor"))
        .stdout(predicate::str::contains("--forceUpdate"))
        .stdout(predicate::str::contains("integrate"))
        .stdout(predicate::str::contains("handoff").not())
        .stdout(predicate::str::contains("updater-pid-file").not());
}

#[test]
fn test_version_flag() {
    let temp = tempfile::TempDir::new().unwrap();
    wrapkit_command(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("wrapkit "));
}

fn wrapkit_manifest(version: &str) -> String {
    wrapkit_cli::test_utils::ManifestFixture::tool(version).content
}
