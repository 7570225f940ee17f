//! Configuration for khanviewer paths and network settings.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (KHANVIEWER_HOME, KHANVIEWER_CATALOG, KHANVIEWER_CACHE)
//! 2. Config file (.khanviewer/config.yaml)
//! 3. Defaults (~/.khanviewer)
//!
//! Config file discovery:
//! - Searches current directory and parents for .khanviewer/config.yaml
//! - Paths in config file are relative to the .khanviewer/ directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_DIR: &str = ".khanviewer";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory
    pub home: Option<String>,
    /// Catalog document
    pub catalog: Option<String>,
    /// Video cache directory
    pub cache: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Where `sync` downloads the catalog from
    pub catalog_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Catalog document path
    pub catalog_path: PathBuf,
    /// Video cache directory
    pub cache_dir: PathBuf,
    /// Default catalog download URL
    pub catalog_url: Option<String>,
    /// HTTP request timeout
    pub http_timeout: Duration,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            catalog_path: home.join("catalog.json"),
            cache_dir: home.join("cache"),
            home,
            catalog_url: None,
            http_timeout: Duration::from_secs(default_timeout_seconds()),
            config_file: None,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Combine defaults, an optional config file and environment overrides
fn resolve(
    default_home: PathBuf,
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let (config_path, config) = match file {
        Some((path, config)) => (Some(path), Some(config)),
        None => (None, None),
    };

    // Relative paths in the file are anchored at the .khanviewer/ directory
    let base = config_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    let from_file = |pick: fn(&PathsConfig) -> Option<&String>| -> Option<PathBuf> {
        let config = config.as_ref()?;
        let base = base.as_deref()?;
        pick(&config.paths).map(|p| resolve_path(base, p))
    };

    let home = env("KHANVIEWER_HOME")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.home.as_ref()))
        .unwrap_or(default_home);

    let mut resolved = ResolvedConfig::with_home(home);

    if let Some(catalog) = env("KHANVIEWER_CATALOG")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.catalog.as_ref()))
    {
        resolved.catalog_path = catalog;
    }

    if let Some(cache) = env("KHANVIEWER_CACHE")
        .map(PathBuf::from)
        .or_else(|| from_file(|p| p.cache.as_ref()))
    {
        resolved.cache_dir = cache;
    }

    if let Some(network) = config.as_ref().and_then(|c| c.network.as_ref()) {
        resolved.catalog_url = network.catalog_url.clone();
        if let Some(secs) = network.timeout_seconds {
            resolved.http_timeout = Duration::from_secs(secs);
        }
    }

    resolved.config_file = config_path;
    resolved
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let file = match find_config_file(&cwd) {
        Some(path) => {
            let config = load_config_file(&path)?;
            tracing::debug!("Using config file {}", path.display());
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(default_home, file, |key| std::env::var(key).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(PathBuf::from("/home/u/.khanviewer"), None, no_env);

        assert_eq!(config.home, PathBuf::from("/home/u/.khanviewer"));
        assert_eq!(config.catalog_path, PathBuf::from("/home/u/.khanviewer/catalog.json"));
        assert_eq!(config.cache_dir, PathBuf::from("/home/u/.khanviewer/cache"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing_and_discovery() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  cache: /var/cache/khanviewer
network:
  catalog_url: https://example.com/catalog.json
  timeout_seconds: 5
"#
        )
        .unwrap();

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_config_file(&nested), Some(config_path.clone()));

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");

        let config = resolve(PathBuf::from("/default"), Some((config_path.clone(), parsed)), no_env);
        assert_eq!(config.home, config_dir.join("./state"));
        assert_eq!(config.catalog_path, config_dir.join("./state").join("catalog.json"));
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/khanviewer"));
        assert_eq!(config.catalog_url.as_deref(), Some("https://example.com/catalog.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                home: Some("home-from-file".to_string()),
                catalog: Some("catalog-from-file.json".to_string()),
                cache: None,
            },
            network: None,
        };

        let env = |key: &str| match key {
            "KHANVIEWER_HOME" => Some("/env/home".to_string()),
            "KHANVIEWER_CACHE" => Some("/env/cache".to_string()),
            _ => None,
        };

        let config = resolve(
            PathBuf::from("/default"),
            Some((PathBuf::from("/proj/.khanviewer/config.yaml"), file)),
            env,
        );

        assert_eq!(config.home, PathBuf::from("/env/home"));
        assert_eq!(
            config.catalog_path,
            PathBuf::from("/proj/.khanviewer/catalog-from-file.json")
        );
        assert_eq!(config.cache_dir, PathBuf::from("/env/cache"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
