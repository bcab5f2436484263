//! MediaWiki action API client
//!
//! Counts a user's mainspace contributions in a date window with one
//! `list=usercontribs` query. Only the first page (500 edits) is read;
//! `has_more` tells the caller whether the API had more to give.

use crate::error::{YirError, YirResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wmf_common::config::MediaWikiConfig;
use wmf_common::Project;

/// Contributions per page, the API maximum for regular users
const CONTRIBUTIONS_PAGE_SIZE: &str = "500";

/// First-page contribution count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionCount {
    pub count: usize,
    pub has_more: bool,
}

/// Source of user contribution counts
#[async_trait]
pub trait ContributionsService: Send + Sync {
    /// Count `username`'s namespace 0 edits between `start_date` and `end_date`
    ///
    /// Dates are given chronologically (`start_date` earlier than `end_date`).
    async fn fetch_user_contribution_count(
        &self,
        username: &str,
        project: Option<&Project>,
        start_date: &str,
        end_date: &str,
    ) -> YirResult<ContributionCount>;
}

/// `list=usercontribs` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserContributionsResponse {
    pub batchcomplete: Option<bool>,
    #[serde(rename = "continue")]
    pub continuation: Option<ContinueData>,
    pub query: Option<UserContributionsQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContinueData {
    pub uccontinue: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserContributionsQuery {
    pub usercontribs: Vec<UserContribution>,
}

/// One contribution row
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserContribution {
    pub userid: i64,
    pub user: String,
    pub pageid: i64,
    pub revid: i64,
    pub parentid: i64,
    pub ns: i64,
    pub title: String,
    pub timestamp: String,
    #[serde(rename = "new", default)]
    pub is_new: bool,
    #[serde(rename = "minor", default)]
    pub is_minor: bool,
    #[serde(rename = "top", default)]
    pub is_top: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query parameters for a contribution count request
///
/// `ucstart`/`ucend` are swapped relative to the chronological window: the
/// API pages backward from the newest edit, so `ucstart` is the later date.
pub fn user_contributions_params(
    username: &str,
    start_date: &str,
    end_date: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("action", "query".to_string()),
        ("format", "json".to_string()),
        ("list", "usercontribs".to_string()),
        ("formatversion", "2".to_string()),
        ("uclimit", CONTRIBUTIONS_PAGE_SIZE.to_string()),
        ("ucstart", end_date.to_string()),
        ("ucend", start_date.to_string()),
        ("ucuser", username.to_string()),
        ("ucnamespace", "0".to_string()),
        ("ucprop", "ids|title|timestamp|tags|flags".to_string()),
    ]
}

/// Reduce a decoded response to its first-page count
pub fn contribution_count(response: &UserContributionsResponse) -> YirResult<ContributionCount> {
    let query = response.query.as_ref().ok_or_else(|| {
        YirError::UnexpectedResponseShape("response has no query object".to_string())
    })?;

    let has_more = response
        .continuation
        .as_ref()
        .and_then(|c| c.uccontinue.as_ref())
        .is_some();

    Ok(ContributionCount {
        count: query.usercontribs.len(),
        has_more,
    })
}

/// MediaWiki API client
pub struct MediaWikiClient {
    http_client: reqwest::Client,
    api_url_override: Option<String>,
}

impl MediaWikiClient {
    pub fn new(config: &MediaWikiConfig) -> YirResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| YirError::RequestConstructionFailure(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url_override: config.api_url_override.clone(),
        })
    }

    fn api_url(&self, project: &Project) -> YirResult<reqwest::Url> {
        let url = match &self.api_url_override {
            Some(url) => url.clone(),
            None => project
                .api_url()
                .map_err(|e| YirError::InvalidProjectReference(e.to_string()))?,
        };

        reqwest::Url::parse(&url)
            .map_err(|e| YirError::RequestConstructionFailure(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ContributionsService for MediaWikiClient {
    async fn fetch_user_contribution_count(
        &self,
        username: &str,
        project: Option<&Project>,
        start_date: &str,
        end_date: &str,
    ) -> YirResult<ContributionCount> {
        let project = project.ok_or_else(|| {
            YirError::InvalidProjectReference("no project supplied".to_string())
        })?;

        let url = self.api_url(project)?;
        let params = user_contributions_params(username, start_date, end_date);

        let request = self
            .http_client
            .get(url)
            .query(&params)
            .build()
            .map_err(|e| YirError::RequestConstructionFailure(e.to_string()))?;

        tracing::debug!(project = %project, url = %request.url(), "Querying user contributions");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| YirError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(YirError::HttpStatus(status.as_u16(), error_text));
        }

        let body: UserContributionsResponse = response
            .json()
            .await
            .map_err(|e| YirError::UnexpectedResponseShape(e.to_string()))?;

        let count = contribution_count(&body)?;

        tracing::info!(
            project = %project,
            count = count.count,
            has_more = count.has_more,
            "Retrieved user contribution count"
        );

        Ok(count)
    }
}
