#[cfg(unix)]
use std::fs::File;
#[cfg(unix)]
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::process::{ExitStatus, Stdio};
#[cfg(unix)]
use std::time::{Duration, Instant};
use wrapkit_cli::test_utils::{ManifestFixture, ProjectFixture};

use crate::common::{packing_toolchain, run_wrapkit};

#[test]
fn test_unchanged_package_is_up_to_date() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config(&packing_toolchain("same bytes")).unwrap();
    fixture.install_package("1.2.3", b"same bytes").unwrap();

    let output = run_wrapkit(&fixture, &["--update"]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Already up to date"));
    assert_eq!(fixture.manifest_content().unwrap(), ManifestFixture::tool("1.2.3").content);

    let probe = fixture.project_dir().join("bin/Release/nupkg/Wrapkit.nupkg");
    assert!(!probe.exists(), "probe package should be discarded");
}

#[test]
fn test_repeated_runs_stay_up_to_date() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config(&packing_toolchain("same bytes")).unwrap();
    fixture.install_package("1.2.3", b"same bytes").unwrap();

    for _ in 0..3 {
        let output = run_wrapkit(&fixture, &["--updateMajor"]).unwrap();
        assert!(output.success, "stderr: {}", output.stderr);
    }
    assert!(fixture.manifest_content().unwrap().contains("<Version>1.2.3</Version>"));
}

#[test]
fn test_missing_installed_package_fails_without_bump() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config(&packing_toolchain("fresh")).unwrap();

    let output = run_wrapkit(&fixture, &["--update"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("No installed package found"), "stderr: {}", output.stderr);
    assert_eq!(fixture.manifest_content().unwrap(), ManifestFixture::tool("1.2.3").content);
}

#[test]
fn test_failed_release_build_restores_manifest() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture
        .write_config(
            r#"[toolchain]
program = "sh"
build_args = ["-c", "exit 3"]
pack_args = ["-c", "true"]
"#,
        )
        .unwrap();

    let output = run_wrapkit(&fixture, &["--update", "--forceUpdate"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Build step 'build' failed"), "stderr: {}", output.stderr);
    assert_eq!(fixture.manifest_content().unwrap(), ManifestFixture::tool("1.2.3").content);
}

#[test]
fn test_failed_release_keeps_crlf_manifest_bytes() {
    let manifest = ManifestFixture::tool_crlf("4.5.6");
    let fixture = ProjectFixture::with_manifest(&manifest).unwrap();
    fixture
        .write_config(
            r#"[toolchain]
program = "sh"
build_args = ["-c", "true"]
pack_args = ["-c", "exit 1"]
"#,
        )
        .unwrap();

    let output = run_wrapkit(&fixture, &["--updateMinor", "--forceUpdate"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert_eq!(std::fs::read(fixture.manifest_path()).unwrap(), manifest.content.as_bytes());
}

#[test]
fn test_unversioned_manifest_is_rejected() {
    let fixture = ProjectFixture::with_manifest(&ManifestFixture::unversioned()).unwrap();
    fixture.write_config(&packing_toolchain("fresh")).unwrap();

    let output = run_wrapkit(&fixture, &["--update", "--forceUpdate"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("No <Version> element"), "stderr: {}", output.stderr);
}

/// Write a config whose install step copies the package into `dest`.
#[cfg(unix)]
fn write_handoff_config(fixture: &ProjectFixture, dest: &Path) {
    let config = format!(
        r#"[project]
project_dir = {project:?}
search_home = false

{toolchain}
[install]
installed_root = {tools:?}
command = ["sh", "-c", 'mkdir -p "$1" && cp "$0"/*.nupkg "$1"/', "{{source}}", {dest:?}]
poll_interval_ms = 20
wait_timeout_secs = 60

[shell]
integration = false
"#,
        project = fixture.project_dir().display().to_string(),
        toolchain = packing_toolchain("new bytes"),
        tools = fixture.installed_root().display().to_string(),
        dest = dest.display().to_string(),
    );
    std::fs::write(fixture.config_path(), config).unwrap();
}

/// Run `wrapkit --update` and return its exit status and stdout.
///
/// Output goes to files so the parent is reaped as soon as it exits; the
/// successor treats an unreaped zombie as still running.
#[cfg(unix)]
fn run_update_detached(fixture: &ProjectFixture, extra_args: &[&str]) -> (ExitStatus, PathBuf) {
    let log = fixture.root().join("wrapkit.log");
    let status = std::process::Command::new(assert_cmd::cargo::cargo_bin("wrapkit"))
        .arg("--config")
        .arg(fixture.config_path())
        .arg("--no-shell-integration")
        .args(extra_args)
        .arg("--update")
        .env("HOME", fixture.home_dir())
        .env("NO_COLOR", "1")
        .env_remove("WRAPKIT_SHELL_INTEGRATED")
        .stdin(Stdio::null())
        .stdout(File::create(&log).unwrap())
        .stderr(File::create(fixture.root().join("wrapkit.err")).unwrap())
        .status()
        .unwrap();
    (status, log)
}

/// Wait for the successor to leave the installed package at `path`.
#[cfg(unix)]
fn wait_for_install(path: &Path) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !path.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    // The copy may still be in progress when the file first appears
    std::thread::sleep(Duration::from_millis(200));
    std::fs::read(path).unwrap()
}

/// Full flow: bump, release, hand off, and let the successor install after
/// the original process exits.
#[cfg(unix)]
#[test]
fn test_changed_package_is_installed_by_successor() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.install_package("1.2.3", b"old bytes").unwrap();
    let installed_to = fixture.root().join("installed");
    write_handoff_config(&fixture, &installed_to);

    let (status, log) = run_update_detached(&fixture, &[]);
    assert!(status.success());
    assert!(fixture.manifest_content().unwrap().contains("<Version>1.2.4</Version>"));
    assert_eq!(wait_for_install(&installed_to.join("Wrapkit.nupkg")), b"new bytes");

    let stdout = std::fs::read_to_string(&log).unwrap();
    assert!(stdout.contains("1.2.3 -> 1.2.4"), "stdout: {stdout}");
}

/// Once the successor runs, a PID file that cannot be written must not turn
/// the update into a failure that restores the old version.
#[cfg(unix)]
#[test]
fn test_unwritable_pid_file_keeps_bumped_version() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.install_package("1.2.3", b"old bytes").unwrap();
    let installed_to = fixture.root().join("installed");
    write_handoff_config(&fixture, &installed_to);

    let blocker = fixture.root().join("blocker");
    std::fs::write(&blocker, "regular file").unwrap();
    let pid_file = blocker.join("pid");

    let (status, _) =
        run_update_detached(&fixture, &["--updater-pid-file", pid_file.to_str().unwrap()]);
    assert!(status.success());
    assert_eq!(wait_for_install(&installed_to.join("Wrapkit.nupkg")), b"new bytes");
    assert!(fixture.manifest_content().unwrap().contains("<Version>1.2.4</Version>"));
}
