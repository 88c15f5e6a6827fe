//! Configuration management for rcrebuild using the prefer crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp::format_timestamp;
use crate::permissions::GroupPermissions;
use crate::repository::util::{redact_url_password, validate_database_url};
use crate::repository::DbContext;

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "wiki.db";

/// Default lookback window: 90 days.
pub const DEFAULT_MAX_AGE_SECS: u64 = 90 * 24 * 3600;

/// Default cap on rows seeded per source.
pub const DEFAULT_BATCH_LIMIT: i64 = 5000;

const SECS_PER_DAY: u64 = 24 * 3600;

type PermissionTable = BTreeMap<String, BTreeMap<String, bool>>;

/// Parameters of one rebuild run.
///
/// Passed explicitly to every pass; nothing reads it from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Lookback window in seconds.
    pub max_age: u64,
    /// Maximum rows seeded from each source table.
    pub batch_limit: i64,
    /// Every log type the wiki knows about.
    pub log_types: Vec<String>,
    /// Log types readable only with a right, keyed by type. Never fed.
    pub log_restrictions: BTreeMap<String, String>,
    pub use_rc_patrol: bool,
    /// Skips the autopatrol pass, which is expensive on large wikis.
    pub miser_mode: bool,
    /// Syndication feeds whose cached timestamps are purged, name to handler.
    pub feed_classes: BTreeMap<String, String>,
    pub group_permissions: PermissionTable,
    pub revoke_permissions: PermissionTable,
    /// Cache backend: `none`, `memory`, `database` or a `redis://` URL.
    pub cache: String,
    /// Namespace for cache keys, usually the wiki's database name.
    pub key_prefix: String,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        let defaults = crate::permissions::default_group_permissions();
        Self {
            max_age: DEFAULT_MAX_AGE_SECS,
            batch_limit: DEFAULT_BATCH_LIMIT,
            log_types: default_log_types(),
            log_restrictions: BTreeMap::from([(
                "suppress".to_string(),
                "suppressionlog".to_string(),
            )]),
            use_rc_patrol: true,
            miser_mode: false,
            feed_classes: BTreeMap::from([
                ("rss".to_string(), "RSSFeed".to_string()),
                ("atom".to_string(), "AtomFeed".to_string()),
            ]),
            group_permissions: defaults.grants,
            revoke_permissions: defaults.revokes,
            cache: "none".to_string(),
            key_prefix: "wiki".to_string(),
        }
    }
}

fn default_log_types() -> Vec<String> {
    [
        "", "block", "protect", "rights", "delete", "upload", "move", "import", "patrol",
        "merge", "suppress", "tag", "managetags", "contentmodel",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl RebuildConfig {
    /// Log types that may appear in the feed, in configured order.
    pub fn eligible_log_types(&self) -> Vec<String> {
        self.log_types
            .iter()
            .filter(|t| !self.log_restrictions.contains_key(t.as_str()))
            .cloned()
            .collect()
    }

    /// Oldest timestamp (exclusive) eligible for seeding, relative to `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> String {
        let max_age = i64::try_from(self.max_age).unwrap_or(i64::MAX);
        let start = Duration::try_seconds(max_age)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        format_timestamp(start)
    }

    /// `max_age=N (d days)`, or `(approx. d days)` when not a whole number of days.
    pub fn max_age_description(&self) -> String {
        let days = self.max_age / SECS_PER_DAY;
        if self.max_age % SECS_PER_DAY == 0 {
            format!("max_age={} ({} days)", self.max_age, days)
        } else {
            format!("max_age={} (approx. {} days)", self.max_age, days)
        }
    }

    /// Group permission table for role classification.
    pub fn permissions(&self) -> GroupPermissions {
        GroupPermissions {
            grants: self.group_permissions.clone(),
            revokes: self.revoke_permissions.clone(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Supports sqlite: URLs. Set via DATABASE_URL env var, config or CLI.
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rcrebuild");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            let path = self.data_dir.join(&self.database_filename);
            format!("sqlite:{}", path.display())
        }
    }

    /// Database URL safe for display.
    pub fn display_database_url(&self) -> String {
        redact_url_password(&self.database_url())
    }

    /// Create a database context.
    pub fn create_db_context(&self) -> Result<DbContext, diesel::result::Error> {
        DbContext::from_url(&self.database_url())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Rebuild parameters.
    #[serde(flatten)]
    pub rebuild: RebuildConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers rcrebuild config files in standard locations.
    ///
    /// Defaults apply only when no file is found; a discovered file that
    /// fails to load is an error.
    pub async fn load() -> Result<Self, String> {
        // Use prefer for file discovery, then parse with serde
        let discovered = match prefer::load("rcrebuild").await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            // No config file found
            Err(_) => None,
        };
        Self::load_discovered(discovered.as_deref()).await
    }

    async fn load_discovered(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::load_from_path(path)
                .await
                .map_err(|e| format!("{}: {}", path.display(), e)),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            if database.contains("://") || database.starts_with("sqlite:") {
                settings.database_url = Some(database.clone());
            } else {
                settings.database_filename = database.clone();
            }
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides discovery).
    pub config_path: Option<PathBuf>,
    /// Explicit database URL or path (overrides config and environment).
    pub database: Option<String>,
}

/// Load settings and config, applying overrides in priority order:
/// CLI database, `DATABASE_URL`, config file, defaults.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment");
        settings.database_url = Some(url);
    }

    if let Some(database) = options.database {
        settings.database_url = Some(database);
    }

    validate_database_url(&settings.database_url())?;

    Ok((settings, config))
}
