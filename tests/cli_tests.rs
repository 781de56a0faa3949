//! Binary smoke tests: startup diagnostics without a reachable database.

use assert_cmd::Command;
use std::io::Write;

#[test]
fn malformed_config_fails_with_a_diagnostic() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server").unwrap();

    Command::cargo_bin("oralab")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to load configuration"));
}

#[cfg(not(feature = "oracle"))]
#[test]
fn default_build_reports_the_missing_backend() {
    // With a valid (defaulted) configuration the default build stops at
    // driver construction rather than binding a socket.
    Command::cargo_bin("oralab")
        .unwrap()
        .arg("/nonexistent/oralab.toml")
        .assert()
        .failure()
        .stderr(predicates::str::contains("oracle"));
}
