//! End-to-end tests for the `apply` command against a local checkout.

#[allow(dead_code)]
mod common;
use common::prelude::*;

const PACKAGE: &str = "{\n  \"name\": \"web\",\n  \"dependencies\": {\n    \"react\": \"^17.0.0\"\n  }\n}\n";
const WORKFLOW: &str = "name: CI\njobs:\n  build:\n    # pinned runner\n    runs-on: ubuntu-20.04\n";

fn multi_format_fixture() -> TestFixture {
    TestFixture::new()
        .with_config(configs::MULTI_FORMAT)
        .with_file("repo/Jenkinsfile", "@Library('lib@2.2.5') _\n")
        .with_file("repo/package.json", PACKAGE)
        .with_file("repo/.github/workflows/ci.yml", WORKFLOW)
        .with_file("repo/.env", "NODE_VERSION=16\nLEGACY_FLAG=true\nPORT=8080\n")
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_all_document_types() {
    let fixture = multi_format_fixture();

    fixture
        .command_with_config("apply")
        .arg("repo")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 file(s) modified"));

    assert_eq!(fixture.read("repo/Jenkinsfile"), "@Library('lib@2.2.6') _\n");
    assert_eq!(
        fixture.read("repo/package.json"),
        PACKAGE.replace("^17.0.0", "^18.0.0")
    );
    assert_eq!(
        fixture.read("repo/.github/workflows/ci.yml"),
        WORKFLOW.replace("ubuntu-20.04", "ubuntu-latest")
    );
    assert_eq!(fixture.read("repo/.env"), "NODE_VERSION=20\nPORT=8080\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_dry_run_writes_nothing() {
    let fixture = multi_format_fixture();

    fixture
        .command_with_config("apply")
        .arg("repo")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN MODE"))
        .stdout(predicate::str::contains("4 file(s) would be modified"));

    assert_eq!(fixture.read("repo/package.json"), PACKAGE);
    fixture
        .child("repo/Jenkinsfile")
        .assert("@Library('lib@2.2.5') _\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_twice_is_idempotent() {
    let fixture = multi_format_fixture();
    fixture.command_with_config("apply").arg("repo").assert().success();

    fixture
        .command_with_config("apply")
        .arg("repo")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 file(s) modified"))
        .stdout(predicate::str::contains("pattern_absent"))
        .stdout(predicate::str::contains("value_unchanged"))
        .stdout(predicate::str::contains("key_absent"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_missing_files_are_skipped() {
    let fixture = TestFixture::new()
        .with_config(configs::MULTI_FORMAT)
        .with_file("repo/Jenkinsfile", "lib@2.2.5\n");

    fixture
        .command_with_config("apply")
        .arg("repo")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) modified"));
    fixture.child("repo/package.json").assert(predicate::path::missing());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_reports_unparseable_file() {
    let fixture = TestFixture::new()
        .with_config(configs::MULTI_FORMAT)
        .with_file("repo/Jenkinsfile", "lib@2.2.5\n")
        .with_file("repo/package.json", "{ not json");

    fixture
        .command_with_config("apply")
        .arg("repo")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERR] package.json"))
        .stderr(predicate::str::contains("1 file(s) could not be processed"));

    // The other file is still written
    assert_eq!(fixture.read("repo/Jenkinsfile"), "lib@2.2.6\n");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_logs_modified_files() {
    let fixture = multi_format_fixture();
    fixture
        .command_with_config("apply")
        .arg("repo")
        .assert()
        .success()
        .stderr(predicate::str::contains("Modified: Jenkinsfile"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_config_from_env() {
    let fixture = TestFixture::new()
        .with_config(configs::JENKINS_BUMP)
        .with_file("repo/Jenkinsfile", configs::JENKINSFILE);

    fixture
        .command()
        .env("BULK_PR_CONFIG", fixture.config_path())
        .arg("apply")
        .arg("repo")
        .assert()
        .success();
    assert!(fixture
        .read("repo/Jenkinsfile")
        .starts_with("@Library('gcp-jenkins-library@2.2.6')"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_apply_not_a_directory() {
    let fixture = TestFixture::new().with_config(configs::JENKINS_BUMP);
    fixture
        .command_with_config("apply")
        .arg("nowhere")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}
