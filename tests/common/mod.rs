//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new()
//!     .with_config(configs::JENKINS_BUMP)
//!     .with_file("repo/Jenkinsfile", configs::JENKINSFILE);
//! fixture.command_with_config("apply").arg("repo").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::configs;
    pub use super::TestFixture;
}

/// Configuration and file snippets shared by the tests.
#[allow(dead_code)]
pub mod configs {
    /// Bumps the shared Jenkins library in a Jenkinsfile.
    pub const JENKINS_BUMP: &str = r#"
repos:
  - acme/service-a
branch: update-jenkins-library-2.2.6
rules:
  - file: Jenkinsfile
    type: text
    changes:
      - action: replace
        pattern: "@Library\\('gcp-jenkins-library@2\\.2\\.5'\\)"
        replacement: "@Library('gcp-jenkins-library@2.2.6')"
"#;

    pub const JENKINSFILE: &str = "@Library('gcp-jenkins-library@2.2.5') _\n\npipeline {\n  agent any\n}\n";

    /// One rule per document type.
    pub const MULTI_FORMAT: &str = r#"
repos: [acme/web]
rules:
  - file: Jenkinsfile
    changes:
      - action: replace
        pattern: "lib@2\\.2\\.5"
        replacement: "lib@2.2.6"
  - file: package.json
    type: json
    changes:
      - action: update_key
        path: dependencies.react
        value: "^18.0.0"
  - file: .github/workflows/ci.yml
    type: yml
    changes:
      - action: update_key
        path: jobs.build.runs-on
        value: ubuntu-latest
  - file: .env
    type: env
    changes:
      - action: update_key
        path: NODE_VERSION
        value: "20"
      - action: delete_key
        path: LEGACY_FLAG
"#;

    /// A rule whose pattern does not compile.
    pub const INVALID_REGEX: &str = r#"
rules:
  - file: Jenkinsfile
    changes:
      - action: replace
        pattern: "[unclosed"
        replacement: x
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "rules: [unclosed";
}

/// A temporary directory with an optional `bulk-pr.yaml` and repository
/// files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `bulk-pr.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("bulk-pr.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("bulk-pr.yaml")
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("bulk-pr");
        cmd.current_dir(self.path())
            .env_remove("BULK_PR_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// A command with `--config` pointing at the fixture's config file.
    pub fn command_with_config(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg(subcommand).arg("--config").arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
