use wrapkit_cli::test_utils::ProjectFixture;

use crate::common::run_wrapkit;

#[test]
fn test_handoff_rejects_invalid_request() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();
    let request = fixture.root().join("request.json");
    std::fs::write(&request, "{ not json").unwrap();

    let output = run_wrapkit(&fixture, &["handoff", "--request", request.to_str().unwrap()]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Handoff failed"), "stderr: {}", output.stderr);
    assert!(fixture.manifest_content().unwrap().contains("<Version>1.2.3</Version>"));
}

#[test]
fn test_handoff_with_missing_request_fails() {
    let fixture = ProjectFixture::new("1.2.3").unwrap();
    fixture.write_config("").unwrap();
    let request = fixture.root().join("missing.json");

    let output = run_wrapkit(&fixture, &["handoff", "--request", request.to_str().unwrap()]).unwrap();
    assert!(!output.success);
}
