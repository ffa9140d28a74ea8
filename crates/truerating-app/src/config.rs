// Configuration loading (run.toml, engine.toml) with defaults copied on first run.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use truerating_engine::EngineConfig;

/// Run settings: target year, data paths, output.
pub const RUN_FILE: &str = "run.toml";
/// Model constants handed to the engine.
pub const ENGINE_FILE: &str = "engine.toml";
/// Every file `load_config_from` reads from `config/`.
const CONFIG_FILES: [&str; 2] = [RUN_FILE, ENGINE_FILE];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("invalid engine configuration: {0}")]
    Engine(#[from] truerating_engine::ConfigError),

    #[error("no {file} in config/ and no default at {path}")]
    MissingDefault { file: &'static str, path: PathBuf },

    #[error("failed to copy default config to {path}: {source}")]
    DefaultsCopyError {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub run: RunSettings,
    pub data_paths: DataPaths,
    pub output: OutputSettings,
    pub engine: EngineConfig,
}

// ---------------------------------------------------------------------------
// run.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire run.toml file.
#[derive(Debug, Clone, Deserialize)]
struct RunFile {
    run: RunSettings,
    data_paths: DataPaths,
    #[serde(default)]
    output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    pub target_year: i32,
    /// Context year. When omitted, the latest year in the stat files is used.
    #[serde(default)]
    pub base_year: Option<i32>,
}

/// Input files. Relative paths are resolved against the base directory
/// the config was loaded from.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub pitching_stats: PathBuf,
    pub batting_stats: PathBuf,
    pub pitcher_scouting_primary: PathBuf,
    pub pitcher_scouting_fallback: PathBuf,
    pub batter_scouting_primary: PathBuf,
    pub batter_scouting_fallback: PathBuf,
}

impl DataPaths {
    fn resolve_against(self, base_dir: &Path) -> Self {
        let abs = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };
        Self {
            pitching_stats: abs(self.pitching_stats),
            batting_stats: abs(self.batting_stats),
            pitcher_scouting_primary: abs(self.pitcher_scouting_primary),
            pitcher_scouting_fallback: abs(self.pitcher_scouting_fallback),
            batter_scouting_primary: abs(self.batter_scouting_primary),
            batter_scouting_fallback: abs(self.batter_scouting_fallback),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub json: Option<PathBuf>,
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            json: None,
            top: default_top(),
        }
    }
}

fn default_top() -> usize {
    25
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/run.toml` and `config/engine.toml` relative to
/// `base_dir`. Does not copy defaults; see `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- run.toml (required) ---
    let run_path = config_dir.join(RUN_FILE);
    let run_text = read_file(&run_path)?;
    let run_file: RunFile = toml::from_str(&run_text).map_err(|e| ConfigError::ParseError {
        path: run_path.clone(),
        source: e,
    })?;

    // --- engine.toml (required) ---
    let engine_path = config_dir.join(ENGINE_FILE);
    let engine_text = read_file(&engine_path)?;
    let engine: EngineConfig =
        toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
            path: engine_path.clone(),
            source: e,
        })?;
    engine.validate()?;

    let output = OutputSettings {
        json: run_file.output.json.map(|p| {
            if p.is_absolute() {
                p
            } else {
                base_dir.join(p)
            }
        }),
        top: run_file.output.top,
    };

    let config = Config {
        run: run_file.run,
        data_paths: run_file.data_paths.resolve_against(base_dir),
        output,
        engine,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `run.toml` and `engine.toml` from `defaults/` into `config/` when
/// they are missing there. A file already in `config/` is left alone, and
/// nothing else in `defaults/` is copied. Returns the files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    let mut copied = Vec::new();
    for file in CONFIG_FILES {
        let target = config_dir.join(file);
        if target.is_file() {
            continue;
        }
        let source = defaults_dir.join(file);
        if !source.is_file() {
            return Err(ConfigError::MissingDefault {
                file,
                path: source,
            });
        }

        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            path: config_dir.clone(),
            source: e,
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            path: target.clone(),
            source: e,
        })?;
        info!("copied default {} to {}", file, target.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(base) = config.run.base_year {
        if config.run.target_year < base {
            return Err(ConfigError::ValidationError {
                field: "run.target_year".into(),
                message: format!(
                    "must not precede base_year ({} < {})",
                    config.run.target_year, base
                ),
            });
        }
    }

    if config.output.top == 0 {
        return Err(ConfigError::ValidationError {
            field: "output.top".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The repository's `defaults/` directory, two levels above this crate.
    fn repo_defaults() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../defaults")
    }

    /// Fresh scratch directory with `config/` holding copies of the defaults.
    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("truerating_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        for file in ["run.toml", "engine.toml"] {
            fs::copy(repo_defaults().join(file), config_dir.join(file)).unwrap();
        }
        tmp
    }

    #[test]
    fn loads_shipped_defaults() {
        let tmp = scratch("defaults");
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.run.target_year, 2025);
        assert!(config.run.base_year.is_none());
        assert_eq!(config.output.top, 25);
        assert_eq!(
            config.data_paths.pitching_stats,
            tmp.join("data/stats/pitching.csv")
        );
        assert_eq!(
            config.output.json.as_deref(),
            Some(tmp.join("output/projections.json").as_path())
        );
        assert_eq!(config.engine.aggregation.recency_weights, vec![1.0, 0.6, 0.4]);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_run_toml_is_file_not_found() {
        let tmp = scratch("missing_run");
        fs::remove_file(tmp.join("config/run.toml")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("run.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_reports_path() {
        let tmp = scratch("malformed");
        fs::write(tmp.join("config/run.toml"), "[run\ntarget_year = ").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("run.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn engine_validation_errors_are_fatal() {
        let tmp = scratch("bad_engine");
        let engine = fs::read_to_string(tmp.join("config/engine.toml")).unwrap();
        let broken = engine.replace("recency_weights = [1.0, 0.6, 0.4]", "recency_weights = []");
        assert_ne!(engine, broken);
        fs::write(tmp.join("config/engine.toml"), broken).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::Engine(truerating_engine::ConfigError::ValidationError {
                field, ..
            }) => assert_eq!(field, "aggregation.recency_weights"),
            other => panic!("expected engine ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_target_before_base() {
        let tmp = scratch("target_before_base");
        let run = r#"
[run]
target_year = 2023
base_year = 2024

[data_paths]
pitching_stats = "p.csv"
batting_stats = "b.csv"
pitcher_scouting_primary = "pp.csv"
pitcher_scouting_fallback = "pf.csv"
batter_scouting_primary = "bp.csv"
batter_scouting_fallback = "bf.csv"
"#;
        fs::write(tmp.join("config/run.toml"), run).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "run.target_year"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn output_section_is_optional() {
        let tmp = scratch("no_output");
        let run = r#"
[run]
target_year = 2025

[data_paths]
pitching_stats = "/abs/p.csv"
batting_stats = "b.csv"
pitcher_scouting_primary = "pp.csv"
pitcher_scouting_fallback = "pf.csv"
batter_scouting_primary = "bp.csv"
batter_scouting_fallback = "bf.csv"
"#;
        fs::write(tmp.join("config/run.toml"), run).unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert!(config.output.json.is_none());
        assert_eq!(config.output.top, 25);
        assert_eq!(config.data_paths.pitching_stats, PathBuf::from("/abs/p.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    /// Scratch directory with `defaults/` holding the named repo defaults.
    fn with_defaults(name: &str, files: &[&str]) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("truerating_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        let defaults = tmp.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        for file in files {
            fs::copy(repo_defaults().join(file), defaults.join(file)).unwrap();
        }
        tmp
    }

    #[test]
    fn ensure_config_files_copies_missing_and_keeps_existing() {
        let tmp = with_defaults("ensure", &[RUN_FILE, ENGINE_FILE]);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/run.toml"), "# user edited\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/engine.toml")]);
        assert_eq!(
            fs::read_to_string(tmp.join("config/run.toml")).unwrap(),
            "# user edited\n"
        );

        let again = ensure_config_files(&tmp).unwrap();
        assert!(again.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_creates_config_dir_and_loads() {
        let tmp = with_defaults("first_run", &[RUN_FILE, ENGINE_FILE]);

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(
            copied,
            vec![tmp.join("config/run.toml"), tmp.join("config/engine.toml")]
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.run.target_year, 2025);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_ignores_other_defaults() {
        let tmp = with_defaults("other_defaults", &[RUN_FILE, ENGINE_FILE]);
        fs::write(tmp.join("defaults/notes.toml"), "x = 1\n").unwrap();
        fs::write(tmp.join("defaults/run.toml.bak"), "x = 1\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 2);
        assert!(!tmp.join("config/notes.toml").exists());
        assert!(!tmp.join("config/run.toml.bak").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_needs_no_defaults_when_config_is_complete() {
        let tmp = scratch("complete");

        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert!(!tmp.join("defaults").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_names_the_missing_default() {
        let tmp = with_defaults("missing_engine", &[RUN_FILE]);

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::MissingDefault { file, path } => {
                assert_eq!(file, ENGINE_FILE);
                assert_eq!(path, tmp.join("defaults/engine.toml"));
            }
            other => panic!("expected MissingDefault, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_directory_fails() {
        let tmp = std::env::temp_dir().join("truerating_config_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        assert!(matches!(
            ensure_config_files(&tmp).unwrap_err(),
            ConfigError::MissingDefault { file: RUN_FILE, .. }
        ));
        assert!(!tmp.join("config").exists());

        let _ = fs::remove_dir_all(&tmp);
    }
}
