use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::service::AnalysisService;
use crate::types::{ComponentEntry, Paging, RawHotspot, RawIssue};

/// Largest number of results the list endpoints will page through
pub const MAX_RESULT_WINDOW: u32 = 10_000;

/// One page of a list endpoint
pub(crate) trait Page {
    type Item;

    fn paging(&self) -> Paging;

    fn into_items(self) -> Vec<Self::Item>;
}

#[derive(Debug, Deserialize)]
struct IssuesPage {
    paging: Paging,
    #[serde(default)]
    issues: Vec<RawIssue>,
}

impl Page for IssuesPage {
    type Item = RawIssue;

    fn paging(&self) -> Paging {
        self.paging
    }

    fn into_items(self) -> Vec<RawIssue> {
        self.issues
    }
}

#[derive(Debug, Deserialize)]
struct HotspotsPage {
    paging: Paging,
    #[serde(default)]
    hotspots: Vec<RawHotspot>,
}

impl Page for HotspotsPage {
    type Item = RawHotspot;

    fn paging(&self) -> Paging {
        self.paging
    }

    fn into_items(self) -> Vec<RawHotspot> {
        self.hotspots
    }
}

#[derive(Debug, Deserialize)]
struct ComponentTreePage {
    paging: Paging,
    #[serde(default)]
    components: Vec<ComponentEntry>,
}

impl Page for ComponentTreePage {
    type Item = ComponentEntry;

    fn paging(&self) -> Paging {
        self.paging
    }

    fn into_items(self) -> Vec<ComponentEntry> {
        self.components
    }
}

#[derive(Debug, Deserialize)]
struct ProjectSummary {
    key: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsPage {
    #[serde(default)]
    components: Vec<ProjectSummary>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// What to do after a page has been collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageStep {
    Next(u32),
    Done,
    /// More results exist than the service lets a client page through
    Truncated,
}

pub(crate) fn next_step(paging: &Paging, page: u32, page_size: u32, fetched: usize, page_len: usize) -> PageStep {
    if page_len == 0 || fetched >= paging.total as usize {
        return PageStep::Done;
    }
    if (page + 1).saturating_mul(page_size) > MAX_RESULT_WINDOW {
        return PageStep::Truncated;
    }
    PageStep::Next(page + 1)
}

/// HTTP client for the SonarQube web API
pub struct SonarQubeClient {
    client: reqwest::Client,
    config: crate::config::Config,
}

impl SonarQubeClient {
    /// Builds a client that authenticates every request with the configured credentials
    pub fn new(config: crate::config::Config) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.sonar_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn check(response: reqwest::Response) -> crate::Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        error!("SonarQube answered {}: {}", status, message);

        Err(crate::HarvestError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> crate::Result<reqwest::Response> {
        debug!("GET {} {:?}", path, query);

        let response = self
            .client
            .get(self.url(path))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP request failed: {}", e);
                crate::HarvestError::Http(e)
            })?;

        Self::check(response).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> crate::Result<reqwest::Response> {
        debug!("POST {}", path);

        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP request failed: {}", e);
                crate::HarvestError::Http(e)
            })?;

        Self::check(response).await
    }

    /// Collects every page of a list endpoint.
    async fn get_paged<P>(&self, path: &str, query: &[(&str, String)]) -> crate::Result<Vec<P::Item>>
    where
        P: Page + DeserializeOwned,
    {
        let page_size = self.config.page_size;
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut params = query.to_vec();
            params.push(("p", page.to_string()));
            params.push(("ps", page_size.to_string()));

            let body: P = self.get(path, &params).await?.json().await?;
            let paging = body.paging();
            let batch = body.into_items();
            let batch_len = batch.len();
            items.extend(batch);

            match next_step(&paging, page, page_size, items.len(), batch_len) {
                PageStep::Next(next) => page = next,
                PageStep::Done => break,
                PageStep::Truncated => {
                    warn!(
                        "{} reports {} results, only the first {} can be fetched",
                        path,
                        paging.total,
                        items.len()
                    );
                    break;
                }
            }
        }

        Ok(items)
    }
}

impl AnalysisService for SonarQubeClient {
    async fn project_exists(&self, project_key: &str) -> crate::Result<bool> {
        let page: ProjectsPage = self
            .get("api/projects/search", &[("projects", project_key.to_string())])
            .await?
            .json()
            .await?;

        Ok(page.components.iter().any(|p| p.key == project_key))
    }

    async fn create_project(
        &self,
        project_key: &str,
        project_name: &str,
        visibility: &str,
    ) -> crate::Result<()> {
        self.post_form(
            "api/projects/create",
            &[
                ("project", project_key.to_string()),
                ("name", project_name.to_string()),
                ("visibility", visibility.to_string()),
            ],
        )
        .await?;

        info!("Created project {}", project_key);
        Ok(())
    }

    async fn generate_token(&self, project_key: &str, expiration_date: &str) -> crate::Result<String> {
        let response: TokenResponse = self
            .post_form(
                "api/user_tokens/generate",
                &[
                    ("name", format!("Analyze \"{}\"", project_key)),
                    ("type", "PROJECT_ANALYSIS_TOKEN".to_string()),
                    ("projectKey", project_key.to_string()),
                    ("expirationDate", expiration_date.to_string()),
                ],
            )
            .await?
            .json()
            .await?;

        info!("Issued analysis token for {} (expires {})", project_key, expiration_date);
        Ok(response.token)
    }

    async fn component_tree(
        &self,
        component: &str,
        branch: &str,
        metric_keys: &str,
    ) -> crate::Result<Vec<ComponentEntry>> {
        self.get_paged::<ComponentTreePage>(
            "api/measures/component_tree",
            &[
                ("component", component.to_string()),
                ("branch", branch.to_string()),
                ("metricKeys", metric_keys.to_string()),
            ],
        )
        .await
    }

    async fn search_issues(&self, file_key: &str, branch: &str) -> crate::Result<Vec<RawIssue>> {
        self.get_paged::<IssuesPage>(
            "api/issues/search",
            &[
                ("componentKeys", file_key.to_string()),
                ("branch", branch.to_string()),
            ],
        )
        .await
    }

    async fn search_hotspots(&self, project_key: &str, branch: &str) -> crate::Result<Vec<RawHotspot>> {
        self.get_paged::<HotspotsPage>(
            "api/hotspots/search",
            &[
                ("projectKey", project_key.to_string()),
                ("branch", branch.to_string()),
            ],
        )
        .await
    }

    async fn source_raw(&self, file_key: &str, branch: &str) -> crate::Result<String> {
        let text = self
            .get(
                "api/sources/raw",
                &[("key", file_key.to_string()), ("branch", branch.to_string())],
            )
            .await?
            .text()
            .await?;

        Ok(text)
    }
}
