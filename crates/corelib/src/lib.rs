//! Sonar Harvest - SonarQube results as a per-file dataset
//!
//! This library provisions projects on a SonarQube server, runs the
//! `sonar-scanner` on them and harvests the resulting issues and security
//! hotspots into a dataset with one record per source file.
//!
//! ## Features
//!
//! - **Provisioning**: create projects and issue project analysis tokens
//! - **Scanning**: run `sonar-scanner` with captured output and exit code
//! - **Grouping**: deduplicate findings by rule within each category and file
//! - **Dataset**: source text, language and grouped findings per file, with a stable id
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sonar_corelib::{Config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> sonar_corelib::Result<()> {
//!     let config = Config::from_env()?;
//!     let harvester = Harvester::new(config)?;
//!
//!     let dataset = harvester.harvest().await?;
//!     println!("{} records", dataset.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Grouping
//!
//! The aggregation functions are plain and synchronous:
//!
//! ```rust
//! use sonar_corelib::{grouping, Category, CategorySet, RawIssue};
//!
//! let issues = vec![
//!     RawIssue {
//!         issue_type: "CODE_SMELL".to_string(),
//!         rule: "python:S1481".to_string(),
//!         message: "Remove the unused local variable.".to_string(),
//!         component: "demo:app.py".to_string(),
//!         text_range: None,
//!     },
//! ];
//! let allowed = CategorySet::from_metric_keys("code_smells,bugs").unwrap();
//! let measures = grouping::group(&issues, &allowed);
//! assert_eq!(measures.get(Category::CodeSmell).unwrap().len(), 1);
//! ```
//!
//! ## Configuration
//!
//! Settings come from environment variables (`SONAR_URL`, `SONAR_USERNAME`,
//! `SONAR_PASSWORD`, `SONAR_BRANCH`, `METRIC_KEYS`, ...) or are set
//! programmatically:
//!
//! ```rust
//! use sonar_corelib::Config;
//!
//! let config = Config {
//!     sonar_url: "http://sonar.internal:9000".to_string(),
//!     branch: "develop".to_string(),
//!     metric_keys: "bugs,vulnerabilities".to_string(),
//!     ..Config::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod assembler;
pub mod batch;
pub mod config;
pub mod error;
pub mod grouping;
pub mod harvester;
pub mod identity;
pub mod logging;
pub mod provisioning;
pub mod scanner;
pub mod service;
pub mod sonarqube;
pub mod store;
pub mod types;

pub use assembler::DatasetAssembler;
pub use batch::ProjectBatchRunner;
pub use config::Config;
pub use error::{HarvestError, Result};
pub use harvester::Harvester;
pub use provisioning::ProjectProvisioner;
pub use scanner::{ScanCommand, ScanOutcome};
pub use service::AnalysisService;
pub use sonarqube::SonarQubeClient;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    /// Default SonarQube server
    pub const SONAR_URL: &str = "http://localhost:9000";

    /// Default user for basic auth
    pub const USERNAME: &str = "admin";

    /// Default branch to harvest
    pub const BRANCH: &str = "main";

    /// Default metric keys
    pub const METRIC_KEYS: &str = "bugs,vulnerabilities,security_hotspots,code_smells";

    /// Default visibility of created projects
    pub const PROJECT_VISIBILITY: &str = "private";

    /// Default token lifetime in days
    pub const TOKEN_EXPIRATION_DAYS: u32 = 30;

    /// Default registry file name
    pub const REGISTRY_FILE: &str = "AnalysisProjects.json";

    /// Default dataset file name
    pub const DATASET_FILE: &str = "AnalysisReport.json";

    /// Default timeout in seconds
    pub const TIMEOUT_SECONDS: u64 = 120;

    /// Default page size for list endpoints
    pub const PAGE_SIZE: u32 = 500;

    /// Largest page size the web API accepts
    pub const MAX_PAGE_SIZE: u32 = 500;
}
