//! Configuration loading and root folder resolution
//!
//! Every field of the TOML file is optional; a missing file produces a warning
//! and compiled defaults so a fresh checkout starts without setup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable overriding the root folder (highest env priority)
pub const ROOT_FOLDER_ENV: &str = "PKV_ROOT_FOLDER";
/// Alternative, shorter root folder variable
pub const ROOT_ENV: &str = "PKV_ROOT";

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/pkv (or /var/lib/pkv for system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("pkv"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/pkv"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("pkv"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/pkv"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("pkv"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\pkv"))
        } else {
            PathBuf::from("./pkv_data")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            host: defaults.host,
            port: defaults.port,
        }
    }
}

/// Logging settings; `RUST_LOG` takes precedence when set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// How generated image paths are checked for existence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Look keys up in the object manifest exported from the bucket
    #[default]
    Manifest,
    /// Send HEAD requests to the image host
    Http,
    /// Skip path probing entirely
    Off,
}

/// Image resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Public URL of the bucket holding venue photos, without trailing slash
    pub base_url: String,
    pub placeholder_url: String,
    /// Placeholder per category slug, overriding `placeholder_url`
    pub category_placeholders: HashMap<String, String>,
    /// Mapping table file inside the data directory
    pub mapping_file: String,
    /// Directory of additional mapping tables inside the data directory
    pub mappings_dir: String,
    /// Object key listing used by the manifest probe
    pub manifest_file: String,
    /// Minimum similarity for a fuzzy name match (0..=1)
    pub fuzzy_threshold: f64,
    pub probe: ProbeMode,
    /// File names tried inside each candidate folder
    pub probe_files: Vec<String>,
    /// Upper bound on probes per venue
    pub max_probes: usize,
    pub probe_timeout_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pkv-venue-images.s3.ap-south-1.amazonaws.com".to_string(),
            placeholder_url: "/static/placeholder.svg".to_string(),
            category_placeholders: HashMap::new(),
            mapping_file: "image-mapping.json".to_string(),
            mappings_dir: "image-mappings".to_string(),
            manifest_file: "image-manifest.json".to_string(),
            fuzzy_threshold: 0.88,
            probe: ProbeMode::Manifest,
            probe_files: vec!["1.jpg".to_string()],
            max_probes: 24,
            probe_timeout_ms: 1500,
        }
    }
}

/// Listing page sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: crate::pagination::DEFAULT_PAGE_SIZE,
            max_page_size: 60,
        }
    }
}

impl ListingConfig {
    /// Requested page size clamped to `[1, max_page_size]`, default when absent
    pub fn clamp_page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

/// Recommendation scoring weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub count: usize,
    pub max_count: usize,
    pub city_weight: f64,
    pub diversity_weight: f64,
    pub rating_weight: f64,
    /// Upper bound of the random term added to every score
    pub jitter: f64,
    pub min_rating: f32,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            count: 6,
            max_count: 24,
            city_weight: 3.0,
            diversity_weight: 2.0,
            rating_weight: 1.0,
            jitter: 0.5,
            min_rating: 0.0,
        }
    }
}

/// Site identity used for page titles and SEO tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Canonical origin, without trailing slash
    pub base_url: String,
    pub description: String,
    pub default_image: String,
    pub locale: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Discover Pakistan".to_string(),
            base_url: "https://discoverpakistan.example".to_string(),
            description: "Find the best restaurants, cafes, shopping, entertainment, arts, \
                          fitness and wellness venues across Pakistan."
                .to_string(),
            default_image: "/static/og-default.jpg".to_string(),
            locale: "en_PK".to_string(),
        }
    }
}

/// Contact form settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// When false, `POST /api/contact` answers 503
    pub enabled: bool,
    /// Inbox directory; defaults to `<root>/contact`
    pub dir: Option<PathBuf>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    /// Dataset directory; relative paths are resolved against the root folder
    pub data_dir: Option<PathBuf>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub images: ImageConfig,
    pub listing: ListingConfig,
    pub recommend: RecommendConfig,
    pub site: SiteConfig,
    pub contact: ContactConfig,
}

impl TomlConfig {
    /// Reject values that would make the service misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        if self.listing.page_size == 0 {
            return Err(Error::Config("listing.page_size must be at least 1".to_string()));
        }
        if self.listing.max_page_size < self.listing.page_size {
            return Err(Error::Config(format!(
                "listing.max_page_size ({}) is smaller than listing.page_size ({})",
                self.listing.max_page_size, self.listing.page_size
            )));
        }
        if !(self.images.fuzzy_threshold > 0.0 && self.images.fuzzy_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "images.fuzzy_threshold must be in (0, 1], got {}",
                self.images.fuzzy_threshold
            )));
        }
        if self.images.probe != ProbeMode::Off && self.images.probe_files.is_empty() {
            return Err(Error::Config("images.probe_files must not be empty".to_string()));
        }
        let r = &self.recommend;
        if [r.city_weight, r.diversity_weight, r.rating_weight, r.jitter]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(Error::Config("recommend weights must be non-negative".to_string()));
        }
        Ok(())
    }

    /// Dataset directory for the given root folder
    pub fn data_dir(&self, root_folder: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root_folder.join(dir),
            None => root_folder.join("data"),
        }
    }

    /// Contact inbox directory for the given root folder
    pub fn contact_dir(&self, root_folder: &Path) -> PathBuf {
        match &self.contact.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root_folder.join(dir),
            None => RootFolderInitializer::new(root_folder.to_path_buf()).contact_dir(),
        }
    }
}

/// Find the config file: explicit path, then user config, then system config
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let user_config = dirs::config_dir().map(|d| d.join("pkv").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/pkv/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Load TOML config, falling back to defaults when the file is missing
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        warn!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write config atomically (temp file + rename), mode 0600 on unix
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Root folder resolution in priority order:
/// 1. Command-line argument
/// 2. `PKV_ROOT_FOLDER`, then `PKV_ROOT`
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent compiled default
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    info!(module = %self.module_name, "Root folder from {}: {}", var, value);
                    return PathBuf::from(value);
                }
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder from config: {}", path.display());
            return path.clone();
        }

        let path = CompiledDefaults::for_current_platform().root_folder;
        info!(module = %self.module_name, "Root folder from compiled default: {}", path.display());
        path
    }
}

/// Creates the root folder layout on first start
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Directory holding submitted contact messages
    pub fn contact_dir(&self) -> PathBuf {
        self.root_folder.join("contact")
    }
}
