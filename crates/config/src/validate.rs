//! Configuration validation.
//!
//! Checks a TOML, YAML or JSON config against the known schema, flags unknown or
//! misspelled fields, and reports values the publisher and retry loop
//! cannot work with.

use std::{collections::HashMap, path::Path};

use serde_json::{Map, Value};

use crate::{loader::ConfigFormat, schema::ThreadlineConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "semantic", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "publish.delay_min_ms"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Expected shape of the configuration.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let fields = |names: &[&'static str]| Struct(names.iter().map(|n| (*n, Leaf)).collect());

    Struct(HashMap::from([
        ("agent", fields(&["name", "username", "profile_id"])),
        (
            "platform",
            fields(&["source", "post_limit", "permalink_base"]),
        ),
        ("thread", fields(&["max_depth"])),
        ("publish", fields(&["delay_min_ms", "delay_max_ms"])),
        (
            "retry",
            fields(&["base_delay_ms", "multiplier", "max_attempts"]),
        ),
        ("memory", fields(&["database_path"])),
    ]))
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

/// Validate a config file at the given path, or the discovered config file
/// when `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let syntax_error = |message: String| ValidationResult {
        diagnostics: vec![Diagnostic {
            severity: Severity::Error,
            category: "syntax",
            path: String::new(),
            message,
        }],
        config_path: Some(actual_path.clone()),
    };

    let format = match ConfigFormat::from_path(actual_path) {
        Ok(format) => format,
        Err(e) => return syntax_error(e.to_string()),
    };

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = validate_str(&content, format);
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => syntax_error(format!("failed to read config file: {e}")),
    }
}

/// Validate a TOML string without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    validate_str(toml_str, ConfigFormat::Toml)
}

/// Validate config text in the given format without touching the filesystem.
#[must_use]
pub fn validate_str(content: &str, format: ConfigFormat) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match parse_value(content, format) {
        Ok(v) => v,
        Err(message) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message,
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    match serde_json::from_value::<ThreadlineConfig>(value) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Parse into a format-neutral tree. An empty document is an empty table.
fn parse_value(content: &str, format: ConfigFormat) -> Result<Value, String> {
    let value = match format {
        ConfigFormat::Toml => toml::from_str::<toml::Value>(content)
            .map_err(|e| format!("TOML syntax error: {e}"))
            .and_then(|v| serde_json::to_value(v).map_err(|e| format!("TOML syntax error: {e}")))?,
        ConfigFormat::Yaml => serde_yaml::from_str::<Value>(content)
            .map_err(|e| format!("YAML syntax error: {e}"))?,
        ConfigFormat::Json => {
            serde_json::from_str::<Value>(content).map_err(|e| format!("JSON syntax error: {e}"))?
        },
    };
    Ok(if value.is_null() {
        Value::Object(Map::new())
    } else {
        value
    })
}

fn check_unknown_fields(
    value: &Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_semantics(config: &ThreadlineConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut push = |severity, path: &str, message: &str| {
        diagnostics.push(Diagnostic {
            severity,
            category: "semantic",
            path: path.into(),
            message: message.into(),
        });
    };

    if config.platform.post_limit == 0 {
        push(
            Severity::Error,
            "platform.post_limit",
            "post_limit must be greater than zero",
        );
    }
    if config.publish.delay_min_ms > config.publish.delay_max_ms {
        push(
            Severity::Error,
            "publish.delay_min_ms",
            "delay_min_ms must not exceed delay_max_ms",
        );
    }
    if config.retry.multiplier == 0 {
        push(
            Severity::Error,
            "retry.multiplier",
            "multiplier must be at least 1",
        );
    }
    match config.retry.max_attempts {
        None => push(
            Severity::Warning,
            "retry.max_attempts",
            "unset: structured generation retries forever on permanent failures",
        ),
        Some(0) => push(
            Severity::Error,
            "retry.max_attempts",
            "max_attempts must be at least 1 when set",
        ),
        Some(_) => {},
    }
    if config.thread.max_depth == 0 {
        push(
            Severity::Info,
            "thread.max_depth",
            "max_depth = 0 keeps only the seed message",
        );
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("", "", 0)]
    #[case("abc", "", 3)]
    #[case("max_depth", "max_depht", 2)]
    #[case("retry", "retyr", 2)]
    #[case("agent", "agents", 1)]
    fn levenshtein_distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn empty_config_only_warns_about_unbounded_retry() {
        let result = validate_toml_str("");
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.diagnostics[0].path, "retry.max_attempts");
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_toml_str("[publsh]\ndelay_min_ms = 1\n");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .expect("unknown-field diagnostic");
        assert_eq!(d.path, "publsh");
        assert!(d.message.contains("\"publish\""));
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let result = validate_toml_str("[thread]\nmax_dept = 4\n");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .expect("unknown-field diagnostic");
        assert_eq!(d.path, "thread.max_dept");
        assert!(d.message.contains("max_depth"));
    }

    #[test]
    fn inverted_delay_range_is_error() {
        let result = validate_toml_str(
            "[publish]\ndelay_min_ms = 500\ndelay_max_ms = 100\n[retry]\nmax_attempts = 3\n",
        );
        assert!(result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "publish.delay_min_ms")
        );
    }

    #[test]
    fn zero_post_limit_is_error() {
        let result = validate_toml_str("[platform]\npost_limit = 0\n");
        assert!(result.has_errors());
    }

    #[test]
    fn type_error_detected() {
        let result = validate_toml_str("[thread]\nmax_depth = \"ten\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn syntax_error_detected() {
        let result = validate_toml_str("[thread\nmax_depth = 1");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn yaml_config_is_checked_as_yaml() {
        let result = validate_str(
            "agent:\n  name: scout\nplatform:\n  post_limit: 140\nretry:\n  max_attempts: 3\n",
            ConfigFormat::Yaml,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let result = validate_str("thread:\n  max_dept: 4\n", ConfigFormat::Yaml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "unknown-field" && d.path == "thread.max_dept")
        );
    }

    #[test]
    fn json_config_is_checked_as_json() {
        let result = validate_str(
            r#"{"publish": {"delay_min_ms": 10, "delay_max_ms": 20}, "retry": {"max_attempts": 2}}"#,
            ConfigFormat::Json,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let result = validate_str(r#"{"platform": {"post_limit": 0}}"#, ConfigFormat::Json);
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().all(|d| d.category != "syntax"));
    }

    #[test]
    fn yaml_file_found_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threadline.yaml");
        std::fs::write(&path, "agent:\n  name: scout\nretry:\n  max_attempts: 5\n").unwrap();

        let result = validate(Some(&path));
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn unsupported_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threadline.ini");
        std::fs::write(&path, "x=1").unwrap();

        let result = validate(Some(&path));
        assert!(result.has_errors());
        assert!(result.diagnostics[0].message.contains(".ini"));
    }

    #[test]
    fn bounded_valid_config_is_clean() {
        let result = validate_toml_str(
            r#"
            [agent]
            name = "scout"
            username = "scout_bot"

            [platform]
            post_limit = 279

            [retry]
            max_attempts = 8
            "#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }
}
