use wrapkit_cli::test_utils::ProjectFixture;

use crate::common::run_wrapkit;

#[cfg(unix)]
const START_MARKER: &str = "# >>> wrapkit shell integration >>>";

#[cfg(unix)]
fn bash() -> Option<String> {
    which::which("bash").ok().map(|p| p.display().to_string())
}

#[cfg(unix)]
#[test]
fn test_integrate_install_is_idempotent_and_removable() {
    let Some(bash) = bash() else {
        return;
    };
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();
    let bashrc = fixture.home_dir().join(".bashrc");
    std::fs::write(&bashrc, "alias ll='ls -l'\n").unwrap();

    let output = run_wrapkit(&fixture, &["integrate", "--shell", &bash]).unwrap();
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Installed bash integration"));
    let installed = std::fs::read_to_string(&bashrc).unwrap();
    assert!(installed.starts_with("alias ll='ls -l'\n"));
    assert_eq!(installed.matches(START_MARKER).count(), 1);

    let output = run_wrapkit(&fixture, &["integrate", "--shell", &bash]).unwrap();
    assert!(output.success);
    assert!(output.stdout.contains("already current"));
    assert_eq!(std::fs::read_to_string(&bashrc).unwrap(), installed);

    let backups = std::fs::read_dir(fixture.home_dir())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(".bashrc.bak."))
        .count();
    assert_eq!(backups, 1);

    let output = run_wrapkit(&fixture, &["integrate", "--remove", "--shell", &bash]).unwrap();
    assert!(output.success);
    assert!(output.stdout.contains("Removed integration"));
    assert_eq!(std::fs::read_to_string(&bashrc).unwrap(), "alias ll='ls -l'\n");
}

#[test]
fn test_integrate_rejects_unsupported_shell() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();

    let output = run_wrapkit(&fixture, &["integrate", "--shell", "/usr/bin/fish"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Shell integration failed"), "stderr: {}", output.stderr);
}
