//! Project creation, token issuance and the optional scan that follows

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::scanner::ScanCommand;
use crate::service::AnalysisService;
use crate::types::{ProjectRegistration, ProjectRegistry};

/// Expiration date `days` after `today`, formatted as the API expects.
pub fn expiration_date(today: NaiveDate, days: u32) -> String {
    (today + Duration::days(i64::from(days)))
        .format("%Y-%m-%d")
        .to_string()
}

/// Registers projects on the service and scans the ones it created
pub struct ProjectProvisioner<'a, S> {
    service: &'a S,
    config: &'a Config,
}

impl<'a, S: AnalysisService> ProjectProvisioner<'a, S> {
    pub fn new(service: &'a S, config: &'a Config) -> Self {
        Self { service, config }
    }

    /// Provisions each `(key, name)` pair in order.
    ///
    /// Existing projects are left untouched and recorded as failures without a
    /// token. A missing source path only skips that project's scan; any other
    /// error aborts the run.
    pub async fn provision(
        &self,
        project_keys: &[String],
        project_names: &[String],
    ) -> crate::Result<ProjectRegistry> {
        if project_keys.len() != project_names.len() {
            return Err(crate::HarvestError::Config(format!(
                "The number of project keys ({}) and project names ({}) must be the same",
                project_keys.len(),
                project_names.len()
            )));
        }

        let mut registry = ProjectRegistry::default();

        for (id, (key, name)) in project_keys.iter().zip(project_names).enumerate() {
            let registration = self.register(id, key, name).await?;

            if self.config.scan {
                if let Some(token) = registration.token.as_deref() {
                    self.scan(key, name, token).await?;
                }
            }

            registry.data.push(registration);
        }

        Ok(registry)
    }

    async fn register(&self, id: usize, key: &str, name: &str) -> crate::Result<ProjectRegistration> {
        if self.service.project_exists(key).await? {
            warn!("Project {} already exists, skipping", key);
            return Ok(ProjectRegistration {
                id,
                project_key: key.to_string(),
                project_name: name.to_string(),
                token: None,
                message: ProjectRegistration::FAILURE.to_string(),
            });
        }

        self.service
            .create_project(key, name, &self.config.project_visibility)
            .await?;

        let expires = expiration_date(Utc::now().date_naive(), self.config.token_expiration_days);
        let token = self.service.generate_token(key, &expires).await?;

        Ok(ProjectRegistration {
            id,
            project_key: key.to_string(),
            project_name: name.to_string(),
            token: Some(token),
            message: ProjectRegistration::SUCCESS.to_string(),
        })
    }

    async fn scan(&self, key: &str, name: &str, token: &str) -> crate::Result<()> {
        let command = ScanCommand::new(
            self.config.scanner_path.as_deref(),
            key,
            name,
            &self.config.source_path,
            &self.config.sonar_url,
            token,
        );

        match command.run().await {
            Ok(outcome) => {
                info!("Scan of {} finished with exit code {}", key, outcome.exit_code);
                Ok(())
            }
            Err(e) if !e.is_fatal() => {
                warn!("Skipping scan of {}: {}", key, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::FakeService;
    use std::path::PathBuf;

    fn config(scan: bool) -> Config {
        Config {
            scan,
            source_path: PathBuf::from("/definitely/not/here"),
            ..Config::default()
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_expiration_date() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(expiration_date(today, 30), "2025-01-14");
        assert_eq!(expiration_date(today, 1), "2024-12-16");
    }

    #[tokio::test]
    async fn test_provision_rejects_mismatched_lengths() {
        let service = FakeService::default();
        let config = config(false);
        let provisioner = ProjectProvisioner::new(&service, &config);

        let result = provisioner
            .provision(&strings(&["a", "b"]), &strings(&["a"]))
            .await;

        assert!(matches!(result, Err(crate::HarvestError::Config(_))));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provision_creates_new_and_skips_existing() {
        let service = FakeService {
            existing: vec!["old".to_string()],
            ..FakeService::default()
        };
        let config = config(false);
        let provisioner = ProjectProvisioner::new(&service, &config);

        let registry = provisioner
            .provision(&strings(&["new", "old"]), &strings(&["New", "Old"]))
            .await
            .unwrap();

        assert_eq!(registry.data.len(), 2);
        let created = &registry.data[0];
        assert_eq!(created.id, 0);
        assert_eq!(created.project_name, "New");
        assert_eq!(created.token.as_deref(), Some("sqp_new"));
        assert!(created.is_success());

        let existing = &registry.data[1];
        assert_eq!(existing.id, 1);
        assert!(existing.token.is_none());
        assert_eq!(existing.message, "Failure");

        let calls = service.calls();
        assert!(calls.contains(&"create new New private".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("create old")));
        assert!(calls.iter().any(|c| c.starts_with("token new ")));
    }

    #[tokio::test]
    async fn test_provision_skips_scan_for_invalid_path() {
        let service = FakeService::default();
        let config = config(true);
        let provisioner = ProjectProvisioner::new(&service, &config);

        let registry = provisioner
            .provision(&strings(&["p1"]), &strings(&["P1"]))
            .await
            .unwrap();

        assert!(registry.data[0].is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_scans_created_projects() {
        let bin = tempfile::tempdir().unwrap();
        crate::scanner::fake::install(bin.path(), "echo \"INFO: EXECUTION SUCCESS\"");
        let source = tempfile::tempdir().unwrap();

        let service = FakeService::default();
        let config = Config {
            scanner_path: Some(bin.path().to_path_buf()),
            source_path: source.path().to_path_buf(),
            ..config(true)
        };
        let provisioner = ProjectProvisioner::new(&service, &config);

        let registry = provisioner
            .provision(&strings(&["p1"]), &strings(&["P1"]))
            .await
            .unwrap();

        assert!(registry.data[0].is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_provision_aborts_when_scan_fails() {
        let bin = tempfile::tempdir().unwrap();
        crate::scanner::fake::install(bin.path(), "echo \"ERROR: Not authorized\" >&2\nexit 3");
        let source = tempfile::tempdir().unwrap();

        let service = FakeService::default();
        let config = Config {
            scanner_path: Some(bin.path().to_path_buf()),
            source_path: source.path().to_path_buf(),
            ..config(true)
        };
        let provisioner = ProjectProvisioner::new(&service, &config);

        let result = provisioner
            .provision(&strings(&["p1", "p2"]), &strings(&["P1", "P2"]))
            .await;

        assert!(matches!(
            result,
            Err(crate::HarvestError::ScanFailed { code: Some(3), .. })
        ));
        // the run stops at the first project
        assert!(!service.calls().iter().any(|c| c.starts_with("create p2")));
    }
}
