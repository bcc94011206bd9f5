use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::CategorySet;

/// Configuration for one provisioning or harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the SonarQube server
    pub sonar_url: String,

    /// Username for HTTP basic auth
    pub username: String,

    /// Password for HTTP basic auth
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Branch whose results are harvested
    pub branch: String,

    /// Comma separated metric keys (bugs, vulnerabilities, code_smells, security_hotspots)
    pub metric_keys: String,

    /// Directory holding the `sonar-scanner` executable, `PATH` lookup when unset
    pub scanner_path: Option<PathBuf>,

    /// Directory with the sources to scan
    pub source_path: PathBuf,

    /// Whether newly created projects are scanned right away
    pub scan: bool,

    /// Visibility of created projects (public, private)
    pub project_visibility: String,

    /// Days until an issued analysis token expires
    pub token_expiration_days: u32,

    /// Registry of provisioned projects
    pub registry_file: PathBuf,

    /// Output file for the harvested dataset
    pub dataset_file: PathBuf,

    /// Timeout in seconds for each HTTP request
    pub timeout_seconds: u64,

    /// Page size for list endpoints (1 to 500)
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sonar_url: crate::defaults::SONAR_URL.to_string(),
            username: crate::defaults::USERNAME.to_string(),
            password: String::new(),
            branch: crate::defaults::BRANCH.to_string(),
            metric_keys: crate::defaults::METRIC_KEYS.to_string(),
            scanner_path: None,
            source_path: PathBuf::from("."),
            scan: true,
            project_visibility: crate::defaults::PROJECT_VISIBILITY.to_string(),
            token_expiration_days: crate::defaults::TOKEN_EXPIRATION_DAYS,
            registry_file: PathBuf::from(crate::defaults::REGISTRY_FILE),
            dataset_file: PathBuf::from(crate::defaults::DATASET_FILE),
            timeout_seconds: crate::defaults::TIMEOUT_SECONDS,
            page_size: crate::defaults::PAGE_SIZE,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let defaults = Config::default();

        let scanner_path = std::env::var("SCANNER_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            sonar_url: env_or("SONAR_URL", &defaults.sonar_url),
            username: env_or("SONAR_USERNAME", &defaults.username),
            password: env_or("SONAR_PASSWORD", &defaults.password),
            branch: env_or("SONAR_BRANCH", &defaults.branch),
            metric_keys: env_or("METRIC_KEYS", &defaults.metric_keys),
            scanner_path,
            source_path: PathBuf::from(env_or("SOURCE_PATH", ".")),
            scan: env_parse("SCAN", defaults.scan),
            project_visibility: env_or("PROJECT_VISIBILITY", &defaults.project_visibility),
            token_expiration_days: env_parse(
                "TOKEN_EXPIRATION_DAYS",
                defaults.token_expiration_days,
            ),
            registry_file: PathBuf::from(env_or("REGISTRY_FILE", crate::defaults::REGISTRY_FILE)),
            dataset_file: PathBuf::from(env_or("DATASET_FILE", crate::defaults::DATASET_FILE)),
            timeout_seconds: env_parse("TIMEOUT_SECONDS", defaults.timeout_seconds),
            page_size: env_parse("PAGE_SIZE", defaults.page_size),
        })
    }

    /// Requested categories parsed from `metric_keys`
    pub fn categories(&self) -> crate::Result<CategorySet> {
        CategorySet::from_metric_keys(&self.metric_keys)
    }

    /// Validates the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.sonar_url.is_empty() {
            return Err(crate::HarvestError::Config(
                "SonarQube URL is required".to_string(),
            ));
        }

        if !self.sonar_url.starts_with("http://") && !self.sonar_url.starts_with("https://") {
            return Err(crate::HarvestError::Config(format!(
                "SonarQube URL must start with http:// or https://: {}",
                self.sonar_url
            )));
        }

        if self.username.is_empty() {
            return Err(crate::HarvestError::Config(
                "Username is required".to_string(),
            ));
        }

        if self.branch.is_empty() {
            return Err(crate::HarvestError::Config(
                "Branch is required".to_string(),
            ));
        }

        if self.categories()?.is_empty() {
            return Err(crate::HarvestError::Config(
                "At least one metric key is required".to_string(),
            ));
        }

        if !matches!(self.project_visibility.as_str(), "public" | "private") {
            return Err(crate::HarvestError::Config(format!(
                "Project visibility must be public or private, got {}",
                self.project_visibility
            )));
        }

        if self.token_expiration_days == 0 {
            return Err(crate::HarvestError::Config(
                "Token expiration days must be greater than 0".to_string(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(crate::HarvestError::Config(
                "Timeout seconds must be greater than 0".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > crate::defaults::MAX_PAGE_SIZE {
            return Err(crate::HarvestError::Config(format!(
                "Page size must be between 1 and {}",
                crate::defaults::MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }
}
