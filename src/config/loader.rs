//! Configuration loading and merging logic.

use std::path::{Path, PathBuf};

use crate::repository::util::validate_database_url;

use super::{Config, Settings};

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--data flag).
    pub data: Option<PathBuf>,
}

/// Look for a config file in the data directory.
fn find_config_in_data_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = ["thumbsense", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Split a `--data` value into a directory and an optional database filename.
fn resolve_data_path(path: &Path) -> (PathBuf, Option<String>) {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir().join(path)
    };

    let is_db_file = path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");

    if is_db_file {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, None)
    }
}

async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Result<Config, String> {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path).await;
    }

    // Priority 2: Config in the data dir
    if let Some(config_path) = data_dir.and_then(find_config_in_data_dir) {
        tracing::debug!("Found config in data dir: {}", config_path.display());
        return Config::load_from_path(&config_path).await;
    }

    // Priority 3: Auto-discover via prefer
    Ok(Config::load().await)
}

/// Non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String> {
    match env_var(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid value for {}: {}", name, raw)),
        None => Ok(None),
    }
}

/// Apply environment overrides, which take precedence over config files.
fn apply_env_overrides(settings: &mut Settings) -> Result<(), String> {
    if let Some(url) = env_var("DATABASE_URL") {
        validate_database_url(&url)?;
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        settings.database_url = Some(url);
    }
    if let Some(url) = env_var("LIBRETRANSLATE_URL") {
        settings.libretranslate_url = url;
    }
    if let Some(key) = env_var("LIBRETRANSLATE_API_KEY") {
        settings.libretranslate_api_key = Some(key);
    }
    if let Some(max) = env_parse("THUMBSENSE_MAX_COMMENTS")? {
        settings.max_comments = max;
    }
    if let Some(hours) = env_parse("THUMBSENSE_REPROCESS_AFTER_HOURS")? {
        settings.reprocess_after_hours = hours;
    }
    if let Some(minutes) = env_parse("THUMBSENSE_SWEEP_INTERVAL_MINUTES")? {
        settings.sweep_interval_minutes = minutes;
    }
    if let Some(workers) = env_parse::<usize>("THUMBSENSE_WORKERS")? {
        settings.workers = workers.max(1);
    }
    Ok(())
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), String> {
    let data = options.data.as_deref().map(resolve_data_path);
    let data_dir = data.as_ref().map(|(dir, _)| dir.as_path());

    let config = load_file_config(&options, data_dir).await?;

    let mut settings = Settings::default();
    let base_dir = config.base_dir().unwrap_or_else(current_dir);
    config.apply_to_settings(&mut settings, &base_dir);

    // --data override takes precedence over the config file
    if let Some((dir, filename)) = data {
        settings.data_dir = dir;
        if let Some(filename) = filename {
            settings.database_filename = filename;
        }
    }

    apply_env_overrides(&mut settings)?;
    settings.validate()?;

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_path() {
        let (dir, file) = resolve_data_path(Path::new("/srv/ts/videos.db"));
        assert_eq!(dir, PathBuf::from("/srv/ts"));
        assert_eq!(file.as_deref(), Some("videos.db"));

        let (dir, file) = resolve_data_path(Path::new("/srv/ts"));
        assert_eq!(dir, PathBuf::from("/srv/ts"));
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn test_config_in_data_dir_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("thumbsense.json"),
            r#"{"max_comments": 12, "canonical_language": "fr"}"#,
        )
        .unwrap();

        let (settings, config) = load_settings_with_options(LoadOptions {
            config_path: None,
            data: Some(dir.path().to_path_buf()),
        })
        .await
        .unwrap();

        assert!(config.source_path.is_some());
        assert_eq!(settings.data_dir, dir.path());
        assert_eq!(settings.max_comments, 12);
        assert_eq!(settings.canonical_language, "fr");
    }

    #[tokio::test]
    async fn test_out_of_range_reprocess_hours_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("thumbsense.json");
        std::fs::write(
            &config_path,
            format!(r#"{{"reprocess_after_hours": {}}}"#, i64::MAX),
        )
        .unwrap();

        let err = load_settings_with_options(LoadOptions {
            config_path: Some(config_path),
            data: None,
        })
        .await
        .unwrap_err();
        assert!(err.contains("reprocess_after_hours"));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings_with_options(LoadOptions {
            config_path: Some(dir.path().join("missing.toml")),
            data: None,
        })
        .await;
        assert!(result.is_err());
    }
}
