//! Per-project assembly of file records

use tracing::{debug, info};

use crate::grouping::{self, HotspotIndex};
use crate::identity;
use crate::service::AnalysisService;
use crate::types::{Category, CategorySet, FileRecord, ProjectDataset};

/// Joins source text, language and grouped findings into one record per file
pub struct DatasetAssembler<'a, S> {
    service: &'a S,
}

impl<'a, S: AnalysisService> DatasetAssembler<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Builds the dataset of one project.
    ///
    /// Records follow the order of the component tree. Only file entries are
    /// emitted; directories and modules are skipped. The first failing service
    /// call aborts the whole assembly.
    pub async fn assemble(
        &self,
        project_name: &str,
        branch: &str,
        requested: &CategorySet,
    ) -> crate::Result<ProjectDataset> {
        info!("Assembling dataset for {} ({})", project_name, branch);

        let tree = self
            .service
            .component_tree(project_name, branch, &requested.to_metric_keys())
            .await?;

        let hotspots = if requested.contains(Category::SecurityHotspot) {
            let raw = self.service.search_hotspots(project_name, branch).await?;
            debug!("{} hotspots reported for {}", raw.len(), project_name);
            grouping::index(&raw)
        } else {
            HotspotIndex::default()
        };

        // hotspots only ever come from the hotspot index
        let issue_categories = requested.without(Category::SecurityHotspot);

        let mut records = Vec::new();
        for entry in tree.iter().filter(|e| e.is_file()) {
            let issues = self.service.search_issues(&entry.key, branch).await?;
            let mut measures = grouping::group(&issues, &issue_categories);

            if let Some(occurrences) = hotspots.get(&entry.key) {
                measures.insert(Category::SecurityHotspot, occurrences.to_vec());
            }

            let source_code = self.service.source_raw(&entry.key, branch).await?;
            let id = identity::record_id(&source_code, &entry.name, &measures);

            debug!(
                "{}: {} issues grouped into {} rule occurrences",
                entry.key,
                issues.len(),
                measures.occurrence_count()
            );

            records.push(FileRecord {
                id,
                name: entry.name.clone(),
                source_code,
                language: entry.language.clone().unwrap_or_default(),
                measures,
            });
        }

        info!("{} file records assembled for {}", records.len(), project_name);
        Ok(records)
    }
}
