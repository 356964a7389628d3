//! End-to-end tests for the `validate` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_valid_config() {
    let fixture = TestFixture::new().with_config(configs::MULTI_FORMAT);
    fixture
        .command_with_config("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Repositories: 1"))
        .stdout(predicate::str::contains("Rules: 4"))
        .stdout(predicate::str::contains("package.json (json): 1 change(s)"))
        .stdout(predicate::str::contains(".env (env): 2 change(s)"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_default_config_path() {
    let fixture = TestFixture::new().with_config(configs::JENKINS_BUMP);
    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("bulk-pr.yaml"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_invalid_yaml() {
    let fixture = TestFixture::new().with_config(configs::INVALID_YAML);
    fixture
        .command_with_config("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration parsing failed"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_invalid_regex_pattern() {
    let fixture = TestFixture::new().with_config(configs::INVALID_REGEX);
    fixture.command_with_config("validate").assert().failure();
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_rejects_conflicting_types() {
    let fixture = TestFixture::new().with_config(
        r#"
rules:
  - file: settings.json
    type: json
    changes:
      - action: update_key
        path: a
        value: 1
  - file: settings.json
    type: yaml
    changes:
      - action: delete_key
        path: b
"#,
    );
    fixture
        .command_with_config("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Conflicting rules for settings.json"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_bad_key_path() {
    let fixture = TestFixture::new().with_config(
        r#"
rules:
  - file: package.json
    type: json
    changes:
      - action: update_key
        path: "deps..react"
        value: x
"#,
    );
    fixture
        .command_with_config("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid path syntax"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_missing_repos_file() {
    let fixture = TestFixture::new().with_config(
        r#"
repos_file: nowhere.txt
rules: []
"#,
    );
    fixture
        .command_with_config("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to read repos file"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_validate_warns_without_rules() {
    let fixture = TestFixture::new().with_config("repos: [acme/api]\nrules: []\n");
    fixture
        .command_with_config("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules configured"));
}
