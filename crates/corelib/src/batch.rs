use tracing::info;

use crate::assembler::DatasetAssembler;
use crate::service::AnalysisService;
use crate::types::{CategorySet, Dataset, ProjectRegistration};

/// Runs the assembler over every registered project, in registration order
pub struct ProjectBatchRunner<'a, S> {
    service: &'a S,
    categories: CategorySet,
}

impl<'a, S: AnalysisService> ProjectBatchRunner<'a, S> {
    pub fn new(service: &'a S, categories: CategorySet) -> Self {
        Self {
            service,
            categories,
        }
    }

    /// Concatenates the file records of every project into one dataset.
    ///
    /// There is no per-project isolation: the first failing project aborts
    /// the batch.
    pub async fn run(
        &self,
        projects: &[ProjectRegistration],
        branch: &str,
    ) -> crate::Result<Dataset> {
        let assembler = DatasetAssembler::new(self.service);
        let mut dataset = Dataset::default();

        for project in projects {
            let records = assembler
                .assemble(&project.project_name, branch, &self.categories)
                .await?;
            info!(
                "{} contributed {} records",
                project.project_key,
                records.len()
            );
            dataset.data.extend(records);
        }

        Ok(dataset)
    }
}
