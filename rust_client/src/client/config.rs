//! Client configuration from TOML files and environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::ClientError;
use super::factory::ServiceType;

/// Maximum number of files in one batch.
pub const DEFAULT_MAX_FILES: usize = 55;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Where and how to reach the merge service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// `http` or `local`
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Per-request timeout in seconds; none when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Batch admission settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

/// Presentation settings that affect derived data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// POSIX-style locale used for date labels (e.g. `es_ES`, `en_US`)
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_bin_count")]
    pub default_bin_count: usize,
}

fn default_service_type() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/py".to_string()
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_locale() -> String {
    "es_ES".to_string()
}

fn default_bin_count() -> usize {
    20
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: None,
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            default_bin_count: default_bin_count(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            upload: UploadSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` if successful
    /// * `Err(ClientError)` if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: ClientConfig = toml::from_str(&content).map_err(|e| {
            ClientError::configuration(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration the way the command-line driver does.
    ///
    /// 1. `DH_CONFIG`, if set, names the file to read
    /// 2. otherwise the first `data-handler.toml` found in the current
    ///    directory, `rust_client/` or the parent directory
    /// 3. otherwise [`ClientConfig::from_env`]
    pub fn load() -> Result<Self, ClientError> {
        Self::load_from(Path::new("."))
    }

    fn load_from(base: &Path) -> Result<Self, ClientError> {
        if let Ok(path) = env::var("DH_CONFIG") {
            return Self::from_file(path);
        }
        match Self::find_default_file(base) {
            Some(path) => {
                log::debug!("Reading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Self::from_env(),
        }
    }

    fn find_default_file(base: &Path) -> Option<PathBuf> {
        [
            base.join("data-handler.toml"),
            base.join("rust_client").join("data-handler.toml"),
            base.join("..").join("data-handler.toml"),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    /// Create a configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Environment Variables
    /// - `DH_SERVICE_TYPE` (optional, default: http): `http` | `local`
    /// - `DH_BASE_URL` (optional, default: http://127.0.0.1:8000)
    /// - `DH_API_PREFIX` (optional, default: /api/py)
    /// - `DH_TIMEOUT_SECS` (optional): per-request timeout
    /// - `DH_MAX_FILES` (optional, default: 55)
    /// - `DH_LOCALE` (optional, default: es_ES)
    ///
    /// # Errors
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Ok(service_type) = env::var("DH_SERVICE_TYPE") {
            config.service.service_type = service_type;
        }
        if let Ok(base_url) = env::var("DH_BASE_URL") {
            config.service.base_url = base_url;
        }
        if let Ok(prefix) = env::var("DH_API_PREFIX") {
            config.service.api_prefix = prefix;
        }
        if let Ok(timeout) = env::var("DH_TIMEOUT_SECS") {
            let secs = timeout.parse().map_err(|_| {
                ClientError::configuration("DH_TIMEOUT_SECS must be a whole number of seconds")
            })?;
            config.service.timeout_secs = Some(secs);
        }
        if let Ok(max_files) = env::var("DH_MAX_FILES") {
            config.upload.max_files = max_files.parse().map_err(|_| {
                ClientError::configuration("DH_MAX_FILES must be a positive integer")
            })?;
        }
        if let Ok(locale) = env::var("DH_LOCALE") {
            config.display.locale = locale;
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the service type from configuration.
    pub fn service_type(&self) -> Result<ServiceType, ClientError> {
        self.service
            .service_type
            .parse()
            .map_err(|e: String| ClientError::configuration(e))
    }

    /// Full URL of an endpoint, e.g. `endpoint_url("/merge-csvs")`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.service.base_url.trim_end_matches('/'),
            self.service.api_prefix.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.service.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), ClientError> {
        self.service_type()?;
        if self.upload.max_files == 0 {
            return Err(ClientError::configuration(
                "upload.max_files must be at least 1",
            ));
        }
        if self.display.default_bin_count == 0 {
            return Err(ClientError::configuration(
                "display.default_bin_count must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.upload.max_files, 55);
        assert_eq!(config.display.locale, "es_ES");
        assert_eq!(config.display.default_bin_count, 20);
        assert_eq!(config.service_type().unwrap(), ServiceType::Http);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_endpoint_url_joins_slashes() {
        let mut config = ClientConfig::default();
        config.service.base_url = "http://localhost:9000/".into();
        assert_eq!(
            config.endpoint_url("/merge-csvs"),
            "http://localhost:9000/api/py/merge-csvs"
        );
        config.service.api_prefix = "api/py/".into();
        assert_eq!(
            config.endpoint_url("available-dates"),
            "http://localhost:9000/api/py/available-dates"
        );
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
type = "local"
timeout_secs = 15

[display]
locale = "en_US"
"#
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.service_type().unwrap(), ServiceType::Local);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.display.locale, "en_US");
        // untouched sections keep their defaults
        assert_eq!(config.upload.max_files, 55);
        assert_eq!(config.service.api_prefix, "/api/py");
    }

    #[test]
    fn test_from_file_rejects_unknown_service_type() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\ntype = \"ftp\"").unwrap();
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Configuration { .. }));
    }

    #[test]
    fn test_from_file_rejects_zero_max_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upload]\nmax_files = 0").unwrap();
        assert!(ClientConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_find_default_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ClientConfig::find_default_file(dir.path()), None);

        let nested = dir.path().join("rust_client");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("data-handler.toml"), "").unwrap();
        assert_eq!(
            ClientConfig::find_default_file(dir.path()),
            Some(nested.join("data-handler.toml"))
        );

        // the current directory wins over rust_client/
        fs::write(dir.path().join("data-handler.toml"), "").unwrap();
        assert_eq!(
            ClientConfig::find_default_file(dir.path()),
            Some(dir.path().join("data-handler.toml"))
        );
    }

    #[test]
    fn test_load_reads_found_file() {
        if env::var("DH_CONFIG").is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("data-handler.toml"),
            "[upload]\nmax_files = 7\n",
        )
        .unwrap();

        let config = ClientConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.upload.max_files, 7);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ClientConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
