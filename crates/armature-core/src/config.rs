//! Project configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File names searched for when discovering a project config.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["armature.toml", ".armature.toml", "armature.json"];

/// Top-level armature configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Source and output directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Route file conventions.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Route and build cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Bundler settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Hot module reload settings.
    #[serde(default)]
    pub hmr: HmrConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArmatureConfig {
    /// Load config from a TOML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        // A relative root is relative to the directory holding the config file.
        if config.project.root.is_relative() {
            if let Some(parent) = path.parent() {
                config.project.root = parent.join(&config.project.root);
            }
        }

        Ok(config)
    }

    /// Find a config file in `start` or any of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Default config rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.project.root = root.into();
        config
    }

    /// Serialize as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Check the config for values that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "routes.extensions must list at least one extension".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_entries must be greater than zero".to_string(),
            ));
        }
        if !self.hmr.endpoint.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "hmr.endpoint must start with '/': {}",
                self.hmr.endpoint
            )));
        }
        self.build.mount_target()?;
        if !self.build.public_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "build.public_prefix must start with '/': {}",
                self.build.public_prefix
            )));
        }
        Ok(())
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        &self.project.root
    }

    /// Directory holding all sources.
    pub fn src_dir(&self) -> PathBuf {
        self.project.root.join(&self.paths.src_dir)
    }

    /// Routes root directory.
    pub fn routes_dir(&self) -> PathBuf {
        self.project.root.join(&self.paths.routes_dir)
    }

    /// Public assets directory.
    pub fn public_dir(&self) -> PathBuf {
        self.project.root.join(&self.paths.public_dir)
    }

    /// Build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.project.root.join(&self.paths.build_dir)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Project root; other paths are relative to it.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_project_name() -> String {
    "armature-app".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            root: default_root(),
        }
    }
}

/// Source and output directories, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source directory watched for changes.
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// Routes root directory.
    #[serde(default = "default_routes_dir")]
    pub routes_dir: PathBuf,

    /// Public assets directory.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Build output directory.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

fn default_src_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_routes_dir() -> PathBuf {
    PathBuf::from("src/routes")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from(".armature")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            routes_dir: default_routes_dir(),
            public_dir: default_public_dir(),
            build_dir: default_build_dir(),
        }
    }
}

/// Route file conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Route module extensions, in lookup order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// File stem of layout modules.
    #[serde(default = "default_layout_name")]
    pub layout_name: String,

    /// File stem of directory index modules.
    #[serde(default = "default_index_name")]
    pub index_name: String,
}

fn default_extensions() -> Vec<String> {
    ["tsx", "jsx", "ts", "js"].iter().map(|s| s.to_string()).collect()
}

fn default_layout_name() -> String {
    "layout".to_string()
}

fn default_index_name() -> String {
    "index".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            layout_name: default_layout_name(),
            index_name: default_index_name(),
        }
    }
}

impl RoutesConfig {
    /// Whether `ext` is a route module extension.
    pub fn is_route_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Route and build cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Route resolution TTL in seconds.
    #[serde(default = "default_route_ttl")]
    pub route_ttl_secs: u64,

    /// Build result TTL in seconds.
    #[serde(default = "default_build_ttl")]
    pub build_ttl_secs: u64,

    /// Maximum entries per cache.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_route_ttl() -> u64 {
    300
}

fn default_build_ttl() -> u64 {
    1800
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            route_ttl_secs: default_route_ttl(),
            build_ttl_secs: default_build_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// Route resolution TTL.
    pub fn route_ttl(&self) -> Duration {
        Duration::from_secs(self.route_ttl_secs)
    }

    /// Build result TTL.
    pub fn build_ttl(&self) -> Duration {
        Duration::from_secs(self.build_ttl_secs)
    }
}

/// Bundler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Bundler executable.
    #[serde(default = "default_bundler")]
    pub bundler: String,

    /// Minify bundles.
    #[serde(default = "default_true")]
    pub minify: bool,

    /// Enable code splitting.
    #[serde(default = "default_true")]
    pub splitting: bool,

    /// CSS selector of the hydration mount container.
    #[serde(default = "default_mount_selector")]
    pub mount_selector: String,

    /// URL prefix under which build artifacts are served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_bundler() -> String {
    "esbuild".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mount_selector() -> String {
    "div[app]".to_string()
}

fn default_public_prefix() -> String {
    "/.armature".to_string()
}

impl BuildConfig {
    /// The element the mount selector describes.
    pub fn mount_target(&self) -> Result<MountTarget, ConfigError> {
        MountTarget::parse(&self.mount_selector)
    }
}

/// Mount container element, as described by `build.mount_selector`.
///
/// Supported selectors are a tag name optionally followed by one of
/// `[attr]`, `#id` or `.class`; a missing tag means `div`. The server renders
/// this element and the hydration bootstrap queries it with the same selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    /// Element name.
    pub tag: String,
    /// Bare attribute, from `tag[attr]`.
    pub attribute: Option<String>,
    /// Element id, from `tag#id`.
    pub id: Option<String>,
    /// Class name, from `tag.class`.
    pub class: Option<String>,
}

impl MountTarget {
    /// Parse a mount selector.
    pub fn parse(selector: &str) -> Result<Self, ConfigError> {
        let invalid = || {
            ConfigError::Invalid(format!(
                "build.mount_selector must be `tag`, `tag[attr]`, `tag#id` or `tag.class`: {}",
                selector
            ))
        };

        let selector = selector.trim();
        let split = selector
            .find(|c: char| !is_name_char(c))
            .unwrap_or(selector.len());
        let (tag, rest) = selector.split_at(split);

        let mut target = Self {
            tag: if tag.is_empty() { "div" } else { tag }.to_ascii_lowercase(),
            attribute: None,
            id: None,
            class: None,
        };

        let name = |name: &str| -> Result<String, ConfigError> {
            if !name.is_empty() && name.chars().all(is_name_char) {
                Ok(name.to_string())
            } else {
                Err(invalid())
            }
        };

        if let Some(attr) = rest.strip_prefix('[') {
            target.attribute = Some(name(attr.strip_suffix(']').ok_or_else(invalid)?)?);
        } else if let Some(id) = rest.strip_prefix('#') {
            target.id = Some(name(id)?);
        } else if let Some(class) = rest.strip_prefix('.') {
            target.class = Some(name(class)?);
        } else if !rest.is_empty() {
            return Err(invalid());
        }

        if tag.is_empty() && rest.is_empty() {
            return Err(invalid());
        }
        Ok(target)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            bundler: default_bundler(),
            minify: true,
            splitting: true,
            mount_selector: default_mount_selector(),
            public_prefix: default_public_prefix(),
        }
    }
}

/// Hot module reload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmrConfig {
    /// Enable the watcher and event stream.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Event stream endpoint.
    #[serde(default = "default_hmr_endpoint")]
    pub endpoint: String,

    /// Server-sent event name.
    #[serde(default = "default_hmr_event")]
    pub event_name: String,

    /// Debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Client reconnect delay in milliseconds.
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,
}

fn default_hmr_endpoint() -> String {
    "/__hmr_stream__".to_string()
}

fn default_hmr_event() -> String {
    "hmr".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_retry_ms() -> u64 {
    10_000
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_hmr_endpoint(),
            event_name: default_hmr_event(),
            debounce_ms: default_debounce_ms(),
            retry_ms: default_retry_ms(),
        }
    }
}

impl HmrConfig {
    /// Debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default document title.
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_title() -> String {
    "Armature".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            title: default_title(),
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Human,
        }
    }
}
