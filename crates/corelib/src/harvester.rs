use colored::*;
use tracing::info;

use crate::batch::ProjectBatchRunner;
use crate::provisioning::ProjectProvisioner;
use crate::sonarqube::SonarQubeClient;
use crate::store;
use crate::types::{Dataset, ProjectRegistry};

/// Coordinates provisioning and harvesting runs against one SonarQube server
pub struct Harvester {
    config: crate::config::Config,
    client: SonarQubeClient,
}

impl Harvester {
    /// Validates the configuration and opens the session used by every call of the run
    pub fn new(config: crate::config::Config) -> crate::Result<Self> {
        info!("Initializing harvester for {}", config.sonar_url);

        config.validate()?;
        let client = SonarQubeClient::new(config.clone())?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &crate::config::Config {
        &self.config
    }

    /// Creates the projects, issues their tokens, scans them and writes the registry.
    pub async fn provision(
        &self,
        project_keys: &[String],
        project_names: &[String],
    ) -> crate::Result<ProjectRegistry> {
        println!(
            "{}",
            format!("🛠️  Provisioning {} projects...", project_keys.len()).bright_blue()
        );

        let provisioner = ProjectProvisioner::new(&self.client, &self.config);
        let registry = provisioner.provision(project_keys, project_names).await?;

        for registration in &registry.data {
            let line = format!(
                "   {} {} ({})",
                if registration.is_success() { "✅" } else { "⚠️ " },
                registration.project_key,
                registration.message
            );
            if registration.is_success() {
                println!("{}", line.bright_green());
            } else {
                println!("{}", line.bright_yellow());
            }
        }

        println!("{}", "💾 Saving project registry...".bright_cyan());
        store::save_registry(&self.config.registry_file, &registry)?;

        Ok(registry)
    }

    /// Harvests every project in the registry file and writes the dataset file.
    pub async fn harvest(&self) -> crate::Result<Dataset> {
        println!(
            "{}",
            format!(
                "📂 Loading project registry from {}...",
                self.config.registry_file.display()
            )
            .bright_blue()
        );
        let registry = store::load_registry(&self.config.registry_file)?;

        println!(
            "{}",
            format!(
                "🔍 Harvesting {} projects on branch {}...",
                registry.data.len(),
                self.config.branch
            )
            .bright_magenta()
        );
        let runner = ProjectBatchRunner::new(&self.client, self.config.categories()?);
        let dataset = runner.run(&registry.data, &self.config.branch).await?;

        println!(
            "{}",
            format!("   ✅ {} file records collected", dataset.len()).bright_green()
        );

        println!("{}", "💾 Saving dataset...".bright_cyan());
        store::save_dataset(&self.config.dataset_file, &dataset)?;

        info!("Harvest finished: {} records", dataset.len());
        Ok(dataset)
    }
}
