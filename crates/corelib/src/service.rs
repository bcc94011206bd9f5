//! Seam between the harvesting logic and the analysis service

use crate::types::{ComponentEntry, RawHotspot, RawIssue};
use crate::Result;

/// Operations the harvester needs from a SonarQube-compatible service.
///
/// List operations return every page. Any transport or API failure comes back
/// as a collaborator error and is not retried.
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    /// Whether a project with exactly this key is registered.
    async fn project_exists(&self, project_key: &str) -> Result<bool>;

    async fn create_project(
        &self,
        project_key: &str,
        project_name: &str,
        visibility: &str,
    ) -> Result<()>;

    /// Issues a project analysis token expiring on `expiration_date` (`YYYY-MM-DD`).
    async fn generate_token(&self, project_key: &str, expiration_date: &str) -> Result<String>;

    async fn component_tree(
        &self,
        component: &str,
        branch: &str,
        metric_keys: &str,
    ) -> Result<Vec<ComponentEntry>>;

    /// Issues reported on a single file.
    async fn search_issues(&self, file_key: &str, branch: &str) -> Result<Vec<RawIssue>>;

    /// Hotspots reported anywhere in a project.
    async fn search_hotspots(&self, project_key: &str, branch: &str) -> Result<Vec<RawHotspot>>;

    async fn source_raw(&self, file_key: &str, branch: &str) -> Result<String>;
}
