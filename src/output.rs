//! # Output
//!
//! Formatting of run reports for the terminal, with colors and emoji
//! markers that follow terminal capabilities and user preferences.
//!
//! Colors are controlled by:
//! - `--color=never|always|auto`
//! - `NO_COLOR` (any value disables colors, see https://no-color.org/)
//! - `CLICOLOR=0` disables, `CLICOLOR_FORCE=1` forces colors in a non-TTY
//! - `TERM=dumb`
//!
//! ```
//! use bulk_pr::output::{emoji, OutputConfig};
//!
//! let config = OutputConfig::from_env_and_flag("never");
//! assert_eq!(emoji(&config, "✅", "[OK]"), "[OK]");
//! ```

use std::env;
use std::fmt::Write;

use console::style;

use crate::orchestrator::{RepoReport, RepoStatus, RunSummary};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // Check NO_COLOR first (https://no-color.org/)
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        // Check CLICOLOR=0 disables colors
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        // Check CLICOLOR_FORCE=1 forces colors
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        // Check TERM=dumb
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        // Use console crate's detection for TTY and color support
        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
///
/// # Arguments
/// * `config` - The output configuration
/// * `emoji` - The emoji to use when colors are enabled
/// * `plain` - The plain text to use when colors are disabled
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

fn status_marker(config: &OutputConfig, status: &RepoStatus) -> String {
    let (icon, plain) = match status {
        RepoStatus::Success { .. } => ("✅", "[OK]"),
        RepoStatus::Skipped(_) => ("⏭️", "[SKIP]"),
        RepoStatus::Failed(_) => ("❌", "[FAIL]"),
        RepoStatus::DryRun => ("🔎", "[DRY]"),
    };
    let marker = emoji(config, icon, plain);
    if !config.use_color {
        return marker.to_string();
    }
    match status {
        RepoStatus::Success { .. } => style(marker).green().to_string(),
        RepoStatus::Failed(_) => style(marker).red().to_string(),
        _ => style(marker).yellow().to_string(),
    }
}

/// One repository's line in the summary, followed by its file details.
pub fn format_report(config: &OutputConfig, report: &RepoReport) -> String {
    let mut out = format!(
        "{} {}: {}\n",
        status_marker(config, &report.status),
        report.repo,
        report.status
    );
    for path in &report.modified_files {
        let _ = writeln!(out, "    modified {}", path);
    }
    for failure in &report.file_failures {
        let _ = writeln!(out, "    failed   {}: {}", failure.path, failure.message);
    }
    out
}

/// The end-of-run summary report.
pub fn format_summary(config: &OutputConfig, summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Summary", emoji(config, "📋", "=="));
    for report in &summary.reports {
        out.push_str(&format_report(config, report));
    }
    let _ = writeln!(out);

    let mut counts = vec![
        format!("{} succeeded", summary.succeeded()),
        format!("{} skipped", summary.skipped()),
        format!("{} failed", summary.failed()),
    ];
    if summary.dry_run() > 0 {
        counts.push(format!("{} dry run", summary.dry_run()));
    }
    let _ = writeln!(
        out,
        "{} repositories: {}",
        summary.reports.len(),
        counts.join(", ")
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper_with_color() {
        let config = OutputConfig::with_color();
        assert_eq!(emoji(&config, "✅", "[OK]"), "✅");
    }

    #[test]
    fn test_emoji_helper_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(emoji(&config, "✅", "[OK]"), "[OK]");
    }

    fn summary() -> RunSummary {
        RunSummary {
            reports: vec![
                RepoReport {
                    repo: "acme/api".to_string(),
                    status: RepoStatus::Success {
                        pr_url: "https://github.com/acme/api/pull/3".to_string(),
                        existing: false,
                    },
                    modified_files: vec!["Jenkinsfile".to_string()],
                    file_failures: vec![],
                },
                RepoReport {
                    repo: "acme/web".to_string(),
                    status: RepoStatus::Skipped("No changes were made".to_string()),
                    modified_files: vec![],
                    file_failures: vec![],
                },
                RepoReport {
                    repo: "acme/db".to_string(),
                    status: RepoStatus::Failed("clone failed".to_string()),
                    modified_files: vec![],
                    file_failures: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_format_summary_plain() {
        let out = format_summary(&OutputConfig::without_color(), &summary());
        assert!(out.contains("[OK] acme/api: created PR https://github.com/acme/api/pull/3"));
        assert!(out.contains("    modified Jenkinsfile"));
        assert!(out.contains("[SKIP] acme/web: skipped: No changes were made"));
        assert!(out.contains("[FAIL] acme/db: failed: clone failed"));
        assert!(out.contains("3 repositories: 1 succeeded, 1 skipped, 1 failed"));
        assert!(!out.contains("dry run"));
    }

    #[test]
    fn test_format_report_file_failures() {
        let report = RepoReport {
            repo: "acme/api".to_string(),
            status: RepoStatus::DryRun,
            modified_files: vec![],
            file_failures: vec![crate::orchestrator::FileFailureReport {
                path: "package.json".to_string(),
                message: "bad json".to_string(),
            }],
        };
        let out = format_report(&OutputConfig::without_color(), &report);
        assert!(out.starts_with("[DRY] acme/api"));
        assert!(out.contains("failed   package.json: bad json"));
    }

    #[test]
    fn test_format_summary_with_color_uses_emoji() {
        let out = format_summary(&OutputConfig::with_color(), &summary());
        assert!(out.contains("✅"));
        assert!(out.contains("❌"));
    }
}
