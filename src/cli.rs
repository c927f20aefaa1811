// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::resource::{MAX_PROJECT_NAME_LEN, is_dns_label};
use crate::types::BuildMode;

/// Command-line arguments for `podrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "podrun",
    version,
    about = "Deploy a runtime pod, sync the project into it and run its build task.",
    long_about = None
)]
pub struct CliArgs {
    /// Project name; the runtime is called `<project>-runtime` (lowercased).
    #[arg(long, short = 'p', value_name = "NAME", value_parser = parse_project_name)]
    pub project: String,

    /// Which task script to run after syncing.
    #[arg(long, value_enum, value_name = "MODE", default_value = "full")]
    pub build_mode: BuildMode,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Podrun.toml` in the current directory is used when it
    /// exists, and built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Namespace to work in, overriding config and kubeconfig.
    #[arg(long, short = 'n', value_name = "NS")]
    pub namespace: Option<String>,

    /// Local directory to sync. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub source: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PODRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve everything and print the resources, but create and run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Accept names whose lowercased runtime name is a valid DNS label.
fn parse_project_name(s: &str) -> Result<String, String> {
    if s.len() > MAX_PROJECT_NAME_LEN {
        return Err(format!(
            "project name is {} characters long (max {MAX_PROJECT_NAME_LEN})",
            s.len()
        ));
    }
    if !is_dns_label(&s.to_lowercase()) {
        return Err(format!(
            "invalid project name '{s}': use letters, digits and inner dashes"
        ));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_validation() {
        assert_eq!(parse_project_name("MyApp"), Ok("MyApp".to_string()));
        assert!(parse_project_name("my_app").is_err());
        assert!(parse_project_name("-app").is_err());
        assert!(parse_project_name(&"a".repeat(MAX_PROJECT_NAME_LEN)).is_ok());
        assert!(parse_project_name(&"a".repeat(MAX_PROJECT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn parses_minimal_invocation() {
        let args = CliArgs::try_parse_from(["podrun", "--project", "MyApp"]).unwrap();
        assert_eq!(args.project, "MyApp");
        assert_eq!(args.build_mode, BuildMode::Full);
        assert!(args.config.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_incremental_mode() {
        let args = CliArgs::try_parse_from([
            "podrun",
            "-p",
            "svc",
            "--build-mode",
            "incremental",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.build_mode, BuildMode::Incremental);
        assert!(args.dry_run);
    }
}
