//! Configuration management for quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `github.api_url`
//! - `github.token`

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override GitHub token.
    pub token: Option<String>,
    /// Override local data directory.
    pub data_dir: Option<PathBuf>,
    /// Select the active repository by id.
    pub repository: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API configuration.
    pub github: GithubConfig,
    /// Local storage configuration (paths are relative strings from TOML).
    storage: StorageConfigRaw,
    /// Configured repositories, in declaration order.
    pub repositories: Vec<RepositoryConfig>,

    /// Resolved storage configuration (set after loading).
    #[serde(skip)]
    pub storage_resolved: StorageConfig,
    /// Repository selected on the command line, if any.
    #[serde(skip)]
    pub active_repository: Option<String>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// GitHub API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Personal access or OAuth token.
    pub token: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_owned(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Raw storage configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StorageConfigRaw {
    data_dir: Option<String>,
    cache_debounce_ms: Option<u64>,
    autosave_debounce_ms: Option<u64>,
}

/// Resolved local storage configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the durable store.
    pub data_dir: PathBuf,
    /// Debounce window for mirroring the cache to disk.
    pub cache_debounce: Duration,
    /// Debounce window for autosave writes.
    pub autosave_debounce: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".quire"),
            cache_debounce: Duration::from_millis(500),
            autosave_debounce: Duration::from_millis(1000),
        }
    }
}

impl StorageConfig {
    /// Directory of the key-value store (`{data_dir}/store`).
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}

/// A remote repository the client manages.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Local identifier (used as the cache and draft namespace).
    pub id: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch to read and write.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Where content and assets live inside the repository.
    #[serde(flatten)]
    pub layout: SiteLayout,
}

fn default_branch() -> String {
    "main".to_owned()
}

/// Directory layout of a static site inside its repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Root of the documents tree (e.g. `content`, `_posts`).
    pub content_dir: String,
    /// Root of static files. `None` or empty means assets live at the
    /// repository root.
    pub static_dir: Option<String>,
    /// Asset directory below the static root (e.g. `images`).
    pub assets_dir: String,
    /// Marker file that keeps otherwise empty directories alive.
    pub placeholder: String,
    /// Extension given to published drafts.
    pub draft_extension: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            content_dir: "content".to_owned(),
            static_dir: None,
            assets_dir: "images".to_owned(),
            placeholder: ".gitkeep".to_owned(),
            draft_extension: "md".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`github.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(token) = &settings.token {
            self.github.token = Some(token.clone());
        }
        if let Some(data_dir) = &settings.data_dir {
            self.storage_resolved.data_dir.clone_from(data_dir);
        }
        if let Some(repository) = &settings.repository {
            self.active_repository = Some(repository.clone());
        }
    }

    /// Get a repository by id, or the active/first one when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no repository matches.
    pub fn repository(&self, id: Option<&str>) -> Result<&RepositoryConfig, ConfigError> {
        let wanted = id.or(self.active_repository.as_deref());
        match wanted {
            Some(id) => self
                .repositories
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| ConfigError::Validation(format!("unknown repository '{id}'"))),
            None => self.repositories.first().ok_or_else(|| {
                ConfigError::Validation("at least one [[repositories]] entry required".to_owned())
            }),
        }
    }

    /// Get the GitHub token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no token is configured.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        let token = self.github.token.as_deref().ok_or_else(|| {
            ConfigError::Validation("github.token required (config or --token)".to_owned())
        })?;
        require_non_empty(token, "github.token")?;
        Ok(token)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            github: GithubConfig::default(),
            storage: StorageConfigRaw::default(),
            repositories: Vec::new(),
            storage_resolved: StorageConfig {
                data_dir: base.join(".quire"),
                ..StorageConfig::default()
            },
            active_repository: None,
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.github.api_url, "github.api_url")?;
        require_http_url(&self.github.api_url, "github.api_url")?;
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "github.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.storage_resolved.cache_debounce.is_zero() {
            return Err(ConfigError::Validation(
                "storage.cache_debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if self.storage_resolved.autosave_debounce.is_zero() {
            return Err(ConfigError::Validation(
                "storage.autosave_debounce_ms must be greater than 0".to_owned(),
            ));
        }
        self.validate_repositories()
    }

    fn validate_repositories(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for repo in &self.repositories {
            require_non_empty(&repo.id, "repositories.id")?;
            if !seen.insert(repo.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate repository id '{}'",
                    repo.id
                )));
            }
            require_non_empty(&repo.owner, "repositories.owner")?;
            require_non_empty(&repo.repo, "repositories.repo")?;
            require_non_empty(&repo.branch, "repositories.branch")?;
            let placeholder = &repo.layout.placeholder;
            require_non_empty(placeholder, "repositories.placeholder")?;
            if placeholder.contains('/') {
                return Err(ConfigError::Validation(
                    "repositories.placeholder must be a file name".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.github.api_url = expand::expand_env(&self.github.api_url, "github.api_url")?;
        if let Some(ref token) = self.github.token {
            self.github.token = Some(expand::expand_env(token, "github.token")?);
        }
        Ok(())
    }

    /// Resolve relative paths and durations based on the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = StorageConfig::default();
        self.storage_resolved = StorageConfig {
            data_dir: config_dir.join(self.storage.data_dir.as_deref().unwrap_or(".quire")),
            cache_debounce: self
                .storage
                .cache_debounce_ms
                .map_or(defaults.cache_debounce, Duration::from_millis),
            autosave_debounce: self
                .storage
                .autosave_debounce_ms
                .map_or(defaults.autosave_debounce, Duration::from_millis),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TWO_REPOS: &str = r#"
[github]
token = "secret"

[[repositories]]
id = "blog"
owner = "alice"
repo = "alice.github.io"
content_dir = "_posts"
static_dir = "static"

[[repositories]]
id = "docs"
owner = "acme"
repo = "handbook"
branch = "trunk"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.timeout_secs, 30);
        assert!(config.github.token.is_none());
        assert!(config.repositories.is_empty());
        assert_eq!(
            config.storage_resolved.data_dir,
            PathBuf::from("/test/.quire")
        );
        assert_eq!(
            config.storage_resolved.store_dir(),
            PathBuf::from("/test/.quire/store")
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_parse_repositories_with_layout_defaults() {
        let config: Config = toml::from_str(TWO_REPOS).unwrap();

        let blog = &config.repositories[0];
        assert_eq!(blog.branch, "main");
        assert_eq!(blog.layout.content_dir, "_posts");
        assert_eq!(blog.layout.static_dir.as_deref(), Some("static"));
        assert_eq!(blog.layout.assets_dir, "images");

        let docs = &config.repositories[1];
        assert_eq!(docs.branch, "trunk");
        assert_eq!(docs.layout, SiteLayout::default());
    }

    #[test]
    fn test_repository_selection() {
        let mut config: Config = toml::from_str(TWO_REPOS).unwrap();

        assert_eq!(config.repository(None).unwrap().id, "blog");
        assert_eq!(config.repository(Some("docs")).unwrap().id, "docs");
        assert!(config.repository(Some("nope")).is_err());

        config.apply_cli_settings(&CliSettings {
            repository: Some("docs".to_owned()),
            ..Default::default()
        });
        assert_eq!(config.repository(None).unwrap().id, "docs");
    }

    #[test]
    fn test_repository_required() {
        let config = Config::default_with_base(Path::new("/test"));

        let err = config.repository(None).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_duplicate_repository_ids_rejected() {
        let toml = r#"
[[repositories]]
id = "blog"
owner = "a"
repo = "b"

[[repositories]]
id = "blog"
owner = "c"
repo = "d"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("duplicate repository id"));
    }

    #[test]
    fn test_placeholder_must_be_file_name() {
        let toml = r#"
[[repositories]]
id = "blog"
owner = "a"
repo = "b"
placeholder = "keep/.gitkeep"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_url_must_be_http() {
        let toml = r#"
[github]
api_url = "ftp://example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("github.api_url"));
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[storage]
data_dir = "state"
cache_debounce_ms = 250
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.storage_resolved.data_dir,
            PathBuf::from("/project/state")
        );
        assert_eq!(
            config.storage_resolved.cache_debounce,
            Duration::from_millis(250)
        );
        assert_eq!(
            config.storage_resolved.autosave_debounce,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let toml = r#"
[storage]
autosave_debounce_ms = 0
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings {
            token: Some("cli-token".to_owned()),
            data_dir: Some(PathBuf::from("/tmp/quire")),
            repository: None,
        });

        assert_eq!(config.require_token().unwrap(), "cli-token");
        assert_eq!(config.storage_resolved.data_dir, PathBuf::from("/tmp/quire"));
        assert!(config.active_repository.is_none());
    }

    #[test]
    fn test_require_token_missing() {
        let config = Config::default_with_base(Path::new("/test"));

        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/quire.toml")), None);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, TWO_REPOS).unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.storage_resolved.data_dir, tmp.path().join(".quire"));
        assert_eq!(config.require_token().unwrap(), "secret");
    }
}
