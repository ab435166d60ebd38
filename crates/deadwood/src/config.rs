//! Analysis configuration document (JSON).
//!
//! Unknown keys are tolerated; unknown *values* (plugin names, malformed
//! globs) are fatal `ConfigError`s surfaced before any file is touched.

use crate::EngineError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::Path;

/// Default include pattern: every Python file under the root.
const DEFAULT_INCLUDE: &[&str] = &["**/*.py"];

/// Default excludes: tests, caches, virtualenvs, build output.
const DEFAULT_EXCLUDE: &[&str] = &[
    "**/__pycache__/**",
    "**/.git/**",
    "**/.venv/**",
    "**/venv/**",
    "**/.tox/**",
    "**/.pytest_cache/**",
    "**/node_modules/**",
    "**/build/**",
    "**/dist/**",
    "**/tests/**",
    "**/test_*.py",
    "**/*_test.py",
    "**/conftest.py",
];

/// Built-in entrypoint plugin identifiers (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginId {
    Flask,
    Celery,
    FlaskRestplus,
    Sqlalchemy,
    Pydantic,
    Pytest,
    Click,
    Typer,
}

impl PluginId {
    pub const ALL: [PluginId; 8] = [
        PluginId::Flask,
        PluginId::Celery,
        PluginId::FlaskRestplus,
        PluginId::Sqlalchemy,
        PluginId::Pydantic,
        PluginId::Pytest,
        PluginId::Click,
        PluginId::Typer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PluginId::Flask => "flask",
            PluginId::Celery => "celery",
            PluginId::FlaskRestplus => "flask-restplus",
            PluginId::Sqlalchemy => "sqlalchemy",
            PluginId::Pydantic => "pydantic",
            PluginId::Pytest => "pytest",
            PluginId::Click => "click",
            PluginId::Typer => "typer",
        }
    }

    fn parse(s: &str) -> Option<PluginId> {
        match s {
            "flask" => Some(PluginId::Flask),
            "celery" => Some(PluginId::Celery),
            // Both spellings seen in the wild.
            "flask-restplus" | "flask-restx" => Some(PluginId::FlaskRestplus),
            "sqlalchemy" => Some(PluginId::Sqlalchemy),
            "pydantic" => Some(PluginId::Pydantic),
            "pytest" => Some(PluginId::Pytest),
            "click" => Some(PluginId::Click),
            "typer" => Some(PluginId::Typer),
            _ => None,
        }
    }
}

/// Raw configuration document shape as deserialized from JSON.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawConfig {
    analysis: RawAnalysis,
    linting: RawLinting,
    entrypoints: RawEntrypoints,
    plugins: RawPlugins,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    parse_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawLinting {
    respect_noqa: bool,
    noqa_patterns: Vec<String>,
    ignore_decorators: Vec<String>,
    ignore_names: Vec<String>,
}

impl Default for RawLinting {
    fn default() -> Self {
        Self {
            respect_noqa: true,
            noqa_patterns: Vec::new(),
            ignore_decorators: Vec::new(),
            ignore_names: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawEntrypoints {
    extra: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
struct RawPlugins {
    enabled: Option<Vec<String>>,
}

/// Validated analysis configuration.
///
/// Construction compiles every glob and resolves every plugin name, so a
/// `Config` in hand means no configuration error can occur later.
#[derive(Debug, Clone)]
pub struct Config {
    pub include: GlobSet,
    pub exclude: GlobSet,
    pub parse_timeout_ms: Option<u64>,
    pub respect_noqa: bool,
    /// Extra suppression comment markers beyond `# noqa` / `# type: ignore`.
    pub noqa_patterns: Vec<String>,
    /// Decorator patterns that force a −50 scoring discount.
    pub ignore_decorators: Vec<String>,
    /// Name globs that force a −50 scoring discount.
    pub ignore_names: GlobSet,
    /// Raw `ignore_names` patterns, kept for reason strings.
    pub ignore_name_patterns: Vec<String>,
    /// Qualified names merged into the entrypoint set (infrastructure scan).
    pub extra_entrypoints: Vec<String>,
    pub plugins: Vec<PluginId>,
}

impl Config {
    /// Built-in defaults: all plugins, default include/exclude, noqa honored.
    pub fn default_config() -> Config {
        // The default document is well-formed by construction.
        Self::from_raw(RawConfig::default()).expect("default configuration must validate")
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Config, EngineError> {
        let raw: RawConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::Config(format!("malformed JSON: {e}")))?;
        Self::from_raw(raw)
    }

    /// Reads a configuration file. A missing file is fatal: the caller asked
    /// for a specific document.
    pub fn from_json_file(path: &Path) -> Result<Config, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    fn from_raw(raw: RawConfig) -> Result<Config, EngineError> {
        let include_patterns = raw
            .analysis
            .include
            .unwrap_or_else(|| DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect());
        let exclude_patterns = raw
            .analysis
            .exclude
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());

        let include = build_globset(&include_patterns, "analysis.include")?;
        let exclude = build_globset(&exclude_patterns, "analysis.exclude")?;
        let ignore_names = build_globset(&raw.linting.ignore_names, "linting.ignore_names")?;

        let plugins = match raw.plugins.enabled {
            None => PluginId::ALL.to_vec(),
            Some(names) => {
                let mut ids = Vec::with_capacity(names.len());
                for name in &names {
                    let id = PluginId::parse(name).ok_or_else(|| {
                        EngineError::Config(format!("unknown plugin: {name:?}"))
                    })?;
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids
            }
        };

        Ok(Config {
            include,
            exclude,
            parse_timeout_ms: raw.analysis.parse_timeout_ms,
            respect_noqa: raw.linting.respect_noqa,
            noqa_patterns: raw.linting.noqa_patterns,
            ignore_decorators: raw.linting.ignore_decorators,
            ignore_names,
            ignore_name_patterns: raw.linting.ignore_names,
            extra_entrypoints: raw.entrypoints.extra,
            plugins,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

fn build_globset(patterns: &[String], key: &str) -> Result<GlobSet, EngineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| EngineError::Config(format!("{key}: bad glob {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default_config();
        assert!(config.respect_noqa);
        assert_eq!(config.plugins.len(), 8);
        assert!(config.include.is_match("pkg/app.py"));
        assert!(config.exclude.is_match("pkg/tests/test_app.py"));
        assert!(config.exclude.is_match("proj/.venv/lib/site.py"));
        assert!(!config.exclude.is_match("pkg/app.py"));
    }

    #[test]
    fn test_parse_full_document() {
        let config = Config::from_json(
            r##"{
                "analysis": {"include": ["src/**/*.py"], "exclude": ["src/vendor/**"]},
                "linting": {
                    "respect_noqa": false,
                    "noqa_patterns": ["# pragma: keep"],
                    "ignore_decorators": ["*.register"],
                    "ignore_names": ["legacy_*"]
                },
                "entrypoints": {"extra": ["app.main.run"]},
                "plugins": {"enabled": ["flask", "celery"]}
            }"##,
        )
        .unwrap();

        assert!(!config.respect_noqa);
        assert_eq!(config.plugins, vec![PluginId::Flask, PluginId::Celery]);
        assert_eq!(config.extra_entrypoints, vec!["app.main.run"]);
        assert!(config.include.is_match("src/app.py"));
        assert!(!config.include.is_match("scripts/run.py"));
        assert!(config.ignore_names.is_match("legacy_handler"));
    }

    #[test]
    fn test_unknown_plugin_is_fatal() {
        let err = Config::from_json(r#"{"plugins": {"enabled": ["django"]}}"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("django"));
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_bad_glob_is_fatal() {
        let err = Config::from_json(r#"{"analysis": {"include": ["[unclosed"]}}"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_restx_alias() {
        let config = Config::from_json(r#"{"plugins": {"enabled": ["flask-restx"]}}"#).unwrap();
        assert_eq!(config.plugins, vec![PluginId::FlaskRestplus]);
    }
}
