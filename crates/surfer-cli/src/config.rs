//! Configuration Vault – reads/writes `~/.surfer/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use surfer_client::SurferConfig;

/// Persisted operator configuration stored in `~/.surfer/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Bridge endpoint and instance name.
    #[serde(default)]
    pub surfer: SurferConfig,

    /// `compact` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            surfer: SurferConfig::default(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Return the path to `~/.surfer/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".surfer").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

/// Load the config from a specific path, exactly as written.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `SURFER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SURFER_HOST` | `surfer.host` |
/// | `SURFER_PORT` | `surfer.port` |
/// | `SURFER_NAME` | `surfer.name` |
/// | `SURFER_SERVICE_TIMEOUT_MS` | `surfer.service_timeout_ms` |
/// | `SURFER_LOG_FORMAT` | `log_format` |
///
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Apply overrides looked up through `var`.
pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SURFER_HOST") {
        cfg.surfer.host = v;
    }
    if let Some(v) = var("SURFER_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.surfer.port = port;
    }
    if let Some(v) = var("SURFER_NAME") {
        cfg.surfer.name = v;
    }
    if let Some(v) = var("SURFER_SERVICE_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.surfer.service_timeout_ms = ms;
    }
    if let Some(v) = var("SURFER_LOG_FORMAT") {
        cfg.log_format = v;
    }
}

/// Save the config to disk, creating `~/.surfer/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner only (rwx------).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
