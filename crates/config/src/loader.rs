use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::StorefrontConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "storefront.toml",
    "storefront.yaml",
    "storefront.yml",
    "storefront.json",
];

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "storefront")
}

/// Returns the user-global config directory (`~/.config/storefront/`).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the default SQLite database.
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load config from `path` (format chosen by extension), substituting
/// `${ENV_VAR}` placeholders first.
pub fn load_config(path: &Path) -> Result<StorefrontConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations, then apply
/// `STOREFRONT_*` environment overrides.
///
/// Search order:
/// 1. `./storefront.{toml,yaml,yml,json}`
/// 2. `<config dir>/storefront.{toml,yaml,yml,json}`
///
/// Falls back to defaults when no file is found or the file is invalid.
pub fn discover_and_load() -> StorefrontConfig {
    let config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                StorefrontConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            StorefrontConfig::default()
        },
    };
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Override file values with `STOREFRONT_BIND`, `STOREFRONT_PORT` and
/// `STOREFRONT_DATABASE_URL`. Unparseable values are ignored with a warning.
pub fn apply_env_overrides(
    mut config: StorefrontConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> StorefrontConfig {
    if let Some(bind) = lookup("STOREFRONT_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("STOREFRONT_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid STOREFRONT_PORT"),
        }
    }
    if let Some(url) = lookup("STOREFRONT_DATABASE_URL") {
        config.database.url = Some(url);
    }
    config
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> Result<StorefrontConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_partial_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "[server]\nport = 8080\n\n[graphql]\ngraphiql = false\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert!(cfg.graphql.enabled);
        assert!(!cfg.graphql.graphiql);
        assert_eq!(cfg.database.max_connections, 5);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("storefront.yaml");
        std::fs::write(&yaml, "database:\n  url: \"sqlite::memory:\"\n").unwrap();
        assert_eq!(
            load_config(&yaml).unwrap().database.url.as_deref(),
            Some("sqlite::memory:")
        );

        let json = dir.path().join("storefront.json");
        std::fs::write(&json, r#"{"graphql": {"subscriber_queue": 8}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().graphql.subscriber_queue, 8);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/storefront.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/storefront.toml"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let lookup = |name: &str| match name {
            "STOREFRONT_PORT" => Some("9000".to_string()),
            "STOREFRONT_DATABASE_URL" => Some("sqlite:other.db".to_string()),
            _ => None,
        };
        let cfg = apply_env_overrides(StorefrontConfig::default(), lookup);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.database.url.as_deref(), Some("sqlite:other.db"));
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let cfg = apply_env_overrides(StorefrontConfig::default(), |name| {
            (name == "STOREFRONT_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(cfg.server.port, 4000);
    }
}
