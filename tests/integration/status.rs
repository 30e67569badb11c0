use sha2::{Digest, Sha256};
use wrapkit_cli::test_utils::ProjectFixture;

use crate::common::run_wrapkit;

#[test]
fn test_status_reports_version_and_installed_package() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();
    fixture.install_package("1.2.3", b"installed package").unwrap();

    let output = run_wrapkit(&fixture, &["status"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("1.2.3"));
    assert!(output.stdout.contains("Wrapkit.1.2.3.nupkg"));
    assert!(output.stdout.contains(&hex::encode(Sha256::digest(b"installed package"))));
    assert!(output.stdout.contains("integration disabled"));
}

#[test]
fn test_status_is_the_default_command() {
    let fixture = ProjectFixture::new("2.0.1").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &[]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("2.0.1"));
}

#[test]
fn test_status_degrades_without_installed_package() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["status"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("No installed package found"));
}

#[test]
fn test_status_reports_unversioned_manifest() {
    let fixture = ProjectFixture::with_manifest(
        &wrapkit_cli::test_utils::ManifestFixture::unversioned(),
    )
    .unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["status"]).unwrap();
    assert!(output.success);
    assert!(output.stdout.contains("No <Version> element"));
}
