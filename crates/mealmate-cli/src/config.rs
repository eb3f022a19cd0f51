//! Configuration file management for mealmate.
//!
//! Provides a TOML-based config file at `~/.config/mealmate/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mealmate_core::catalog::StaticCatalog;
use mealmate_core::share::{DEFAULT_APP_URL, ShareConfig};
use mealmate_db::config::DbConfig;

pub const USER_ID_ENV: &str = "MEALMATE_USER_ID";
pub const SHARE_SECRET_ENV: &str = "MEALMATE_SHARE_SECRET";
pub const APP_URL_ENV: &str = "MEALMATE_APP_URL";
pub const CATALOG_ENV: &str = "MEALMATE_CATALOG";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub user: UserSection,
    pub share: ShareSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSection {
    /// The local user every command acts as.
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareSection {
    /// Hex-encoded share link secret (64 hex chars = 32 bytes).
    pub secret: String,
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Recipe catalog TOML replacing the built-in one.
    pub path: PathBuf,
}

fn default_app_url() -> String {
    DEFAULT_APP_URL.to_string()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealmate config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealmate` or
/// `~/.config/mealmate`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealmate");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealmate")
}

/// Return the path to the mealmate config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Secret generation
// -----------------------------------------------------------------------

/// Generate a random share secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_share_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Catalog
// -----------------------------------------------------------------------

/// Catalog override: `MEALMATE_CATALOG` env > `[catalog].path` > none.
pub fn resolve_catalog_path(file_config: Option<&ConfigFile>) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CATALOG_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    file_config
        .and_then(|cfg| cfg.catalog.as_ref())
        .map(|c| c.path.clone())
}

/// Load the configured catalog, or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<StaticCatalog> {
    let catalog = StaticCatalog::load_or_builtin(path)?;
    Ok(catalog)
}

/// Load the catalog for commands that need no database.
pub fn catalog_from_env() -> Result<StaticCatalog> {
    let file_config = load_config().ok();
    load_catalog(resolve_catalog_path(file_config.as_ref()).as_deref())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MealmateConfig {
    pub db_config: DbConfig,
    pub user_id: Uuid,
    pub share_config: ShareConfig,
    pub catalog_path: Option<PathBuf>,
}

impl MealmateConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `MEALMATE_DATABASE_URL` > `[database].url` > `DbConfig::DEFAULT_URL`
    /// - User ID: `MEALMATE_USER_ID` > `[user].id` > error
    /// - Share secret: `MEALMATE_SHARE_SECRET` > `[share].secret` > error
    /// - App URL: `MEALMATE_APP_URL` > `[share].app_url` > `http://localhost:3000`
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let user_id = if let Ok(raw) = std::env::var(USER_ID_ENV) {
            Uuid::parse_str(raw.trim())
                .with_context(|| format!("{USER_ID_ENV} is not a valid UUID: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.user.id
        } else {
            bail!("user id not found; set {USER_ID_ENV} or run `mealmate init` to create a config file");
        };

        let app_url = if let Ok(url) = std::env::var(APP_URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.share.app_url.clone()
        } else {
            DEFAULT_APP_URL.to_string()
        };

        let share_config = if let Ok(secret_hex) = std::env::var(SHARE_SECRET_ENV) {
            ShareConfig::from_hex(&secret_hex, app_url)
                .with_context(|| format!("{SHARE_SECRET_ENV} env var is invalid"))?
        } else if let Some(ref cfg) = file_config {
            ShareConfig::from_hex(&cfg.share.secret, app_url)
                .context("invalid share secret in config file")?
        } else {
            bail!(
                "share secret not found; set {SHARE_SECRET_ENV} or run `mealmate init` to create a config file"
            );
        };

        Ok(Self {
            db_config,
            user_id,
            share_config,
            catalog_path: resolve_catalog_path(file_config.as_ref()),
        })
    }

    pub fn catalog(&self) -> Result<StaticCatalog> {
        load_catalog(self.catalog_path.as_deref())
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
