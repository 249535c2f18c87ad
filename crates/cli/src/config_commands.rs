use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use threadline_config::{
    Severity,
    validate::{self, ValidationResult},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration as TOML.
    Show,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => show(path),
        ConfigAction::Check { verbose } => check(path, verbose),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn show(path: Option<&Path>) -> Result<()> {
    let config = crate::load_config(path)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let lines = render(&result, verbose);
    for line in &lines {
        eprintln!("  {line}");
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !lines.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn render(result: &ValidationResult, verbose: bool) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let (color, label) = match d.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning => (YELLOW, "warning"),
                Severity::Info => (CYAN, "info"),
            };
            if d.path.is_empty() {
                format!("{BOLD}{color}{label}{RESET} {}", d.message)
            } else {
                format!("{BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
            }
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_is_hidden_unless_verbose() {
        let result = validate::validate_toml_str("[thread]\nmax_depth = 0\n");
        assert_eq!(result.count(Severity::Info), 1);

        let quiet = render(&result, false);
        let loud = render(&result, true);
        assert_eq!(loud.len(), quiet.len() + 1);
        assert!(loud.iter().any(|l| l.contains("thread.max_depth")));
    }
}
