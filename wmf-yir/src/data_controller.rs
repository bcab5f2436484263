//! Year in Review data controller
//!
//! Entry point for report population and the report read/write surface.
//! Every collaborator is passed in through [`Dependencies`]; nothing is
//! resolved from global state.
//!
//! Population is opportunistic: an ineligible device gets
//! [`PopulationOutcome::Skipped`], never an error. Store and network
//! failures propagate. Nothing is retried here; re-running population is
//! safe because slides already evaluated are never evaluated again.

use crate::db::{PageViewCounter, ReportStore};
use crate::error::{YirError, YirResult};
use crate::gate::{ConfigGate, Ineligibility};
use crate::models::{Report, Slide};
use crate::populators::{EditingCountPopulator, ReadingCountPopulator};
use crate::remote_config::DeveloperSettings;
use crate::services::{ContributionCount, ContributionsService};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use wmf_common::config::{DEFAULT_REPORT_YEAR, DEFAULT_TARGET_CONFIG_YEAR_ID};
use wmf_common::{Project, SettingsStore};

/// Settings key for the feature announcement status
pub const FEATURE_ANNOUNCEMENT_KEY: &str = "year_in_review_feature_announcement";

/// Persisted feature announcement state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnnouncementStatus {
    #[serde(rename = "hasPresentedYiRFeatureAnnouncementModal")]
    pub has_presented_yir_feature_announcement_modal: bool,
}

/// Result of a population request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationOutcome {
    /// Gate rejected the request; nothing was read or written
    Skipped(Ineligibility),
    /// Report after population
    Populated(Report),
}

/// Collaborators injected into the controller
pub struct Dependencies {
    /// None when the database failed to open
    pub report_store: Option<ReportStore>,
    pub settings_store: SettingsStore,
    pub developer_settings: DeveloperSettings,
    pub page_views: Arc<dyn PageViewCounter>,
    /// None when no network service is bound
    pub contributions: Option<Arc<dyn ContributionsService>>,
    pub target_config_year_id: String,
    pub report_year: i32,
}

impl Dependencies {
    pub fn new(
        report_store: Option<ReportStore>,
        settings_store: SettingsStore,
        developer_settings: DeveloperSettings,
        page_views: Arc<dyn PageViewCounter>,
    ) -> Self {
        Self {
            report_store,
            settings_store,
            developer_settings,
            page_views,
            contributions: None,
            target_config_year_id: DEFAULT_TARGET_CONFIG_YEAR_ID.to_string(),
            report_year: DEFAULT_REPORT_YEAR,
        }
    }

    pub fn with_contributions(mut self, service: Arc<dyn ContributionsService>) -> Self {
        self.contributions = Some(service);
        self
    }
}

pub struct YearInReviewDataController {
    store: ReportStore,
    settings_store: SettingsStore,
    developer_settings: DeveloperSettings,
    page_views: Arc<dyn PageViewCounter>,
    contributions: Option<Arc<dyn ContributionsService>>,
    target_config_year_id: String,
    report_year: i32,
}

impl YearInReviewDataController {
    /// Fails with `StoreUnavailable` when no report store was supplied
    pub fn new(deps: Dependencies) -> YirResult<Self> {
        let store = deps.report_store.ok_or(YirError::StoreUnavailable)?;

        Ok(Self {
            store,
            settings_store: deps.settings_store,
            developer_settings: deps.developer_settings,
            page_views: deps.page_views,
            contributions: deps.contributions,
            target_config_year_id: deps.target_config_year_id,
            report_year: deps.report_year,
        })
    }

    fn gate(&self) -> ConfigGate<'_> {
        ConfigGate::new(&self.developer_settings, &self.target_config_year_id)
    }

    /// Re-read the local flag and cached remote config
    pub async fn reload_developer_settings(&mut self) -> YirResult<()> {
        self.developer_settings = DeveloperSettings::load(&self.settings_store).await?;
        Ok(())
    }

    pub fn developer_settings(&self) -> &DeveloperSettings {
        &self.developer_settings
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    pub fn should_populate(&self, country_code: Option<&str>, project: Option<&Project>) -> bool {
        self.gate().should_populate(country_code, project)
    }

    /// Entry point shows when eligible and the persisted report has at least
    /// one enabled slide set to display
    pub async fn should_show_entry_point(
        &self,
        country_code: Option<&str>,
        project: Option<&Project>,
    ) -> YirResult<bool> {
        if self.gate().check(country_code, project).is_err() {
            return Ok(false);
        }

        let report = self.store.fetch_report(self.report_year).await?;
        Ok(self
            .gate()
            .should_show_entry_point(country_code, project, report.as_ref()))
    }

    // ------------------------------------------------------------------
    // Feature announcement
    // ------------------------------------------------------------------

    async fn feature_announcement_status(&self) -> YirResult<FeatureAnnouncementStatus> {
        Ok(self
            .settings_store
            .load::<FeatureAnnouncementStatus>(FEATURE_ANNOUNCEMENT_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn has_presented_feature_announcement(&self) -> YirResult<bool> {
        Ok(self
            .feature_announcement_status()
            .await?
            .has_presented_yir_feature_announcement_modal)
    }

    pub async fn set_has_presented_feature_announcement(&self, presented: bool) -> YirResult<()> {
        let mut status = self.feature_announcement_status().await?;
        status.has_presented_yir_feature_announcement_modal = presented;
        self.settings_store.save(FEATURE_ANNOUNCEMENT_KEY, &status).await?;
        Ok(())
    }

    /// Announcement runs until 2025-03-01 inclusive
    pub fn is_announcement_active(&self, now: DateTime<Utc>) -> bool {
        match Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).single() {
            Some(expiry) => now <= expiry,
            None => false,
        }
    }

    pub async fn should_show_feature_announcement(
        &self,
        country_code: Option<&str>,
        project: Option<&Project>,
        now: DateTime<Utc>,
    ) -> YirResult<bool> {
        if !self.is_announcement_active(now) {
            return Ok(false);
        }
        if !self.should_show_entry_point(country_code, project).await? {
            return Ok(false);
        }
        Ok(!self.has_presented_feature_announcement().await?)
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Populate every unevaluated, enabled slide of the `year` report
    pub async fn populate_report_data(
        &self,
        year: i32,
        country_code: &str,
        project: Option<&Project>,
        username: Option<&str>,
    ) -> YirResult<PopulationOutcome> {
        let config = match self.gate().check(Some(country_code), project) {
            Ok(config) => config,
            Err(reason) => {
                debug!(year, %reason, "Skipping Year in Review population");
                return Ok(PopulationOutcome::Skipped(reason));
            }
        };

        let ensured = self
            .store
            .ensure_report(year, &config.personalized_slides, username)
            .await?;

        if ensured.needs_reading {
            let populator = ReadingCountPopulator {
                page_views: self.page_views.as_ref(),
                store: &self.store,
            };
            populator.populate(year, config).await?;
        }

        if ensured.needs_editing {
            if let Some(username) = username {
                let contributions = self
                    .contributions
                    .as_deref()
                    .ok_or(YirError::ServiceUnavailable)?;
                let populator = EditingCountPopulator {
                    contributions,
                    store: &self.store,
                };
                populator.populate(year, config, username, project).await?;
            }
        }

        let report = self
            .store
            .fetch_report(year)
            .await?
            .unwrap_or(ensured.report);

        info!(
            year,
            displayed = report.slides.iter().filter(|s| s.display).count(),
            "Year in Review population complete"
        );

        Ok(PopulationOutcome::Populated(report))
    }

    /// Contribution count for the target config year window
    pub async fn fetch_edit_count(&self, username: &str, project: Option<&Project>) -> YirResult<usize> {
        let config = self.gate().yir_config()?;
        let result = self
            .fetch_user_contribution_count(
                username,
                project,
                &config.data_population_start_date_string,
                &config.data_population_end_date_string,
            )
            .await?;
        Ok(result.count)
    }

    pub async fn fetch_user_contribution_count(
        &self,
        username: &str,
        project: Option<&Project>,
        start_date: &str,
        end_date: &str,
    ) -> YirResult<ContributionCount> {
        let service = self
            .contributions
            .as_deref()
            .ok_or(YirError::ServiceUnavailable)?;
        service
            .fetch_user_contribution_count(username, project, start_date, end_date)
            .await
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    pub async fn fetch_report(&self, year: i32) -> YirResult<Option<Report>> {
        self.store.fetch_report(year).await
    }

    pub async fn fetch_all_reports(&self) -> YirResult<Vec<Report>> {
        self.store.fetch_all_reports().await
    }

    pub async fn save_report(&self, report: &Report) -> YirResult<()> {
        self.store.save_report(report).await
    }

    pub async fn create_new_report(&self, year: i32, slides: Vec<Slide>) -> YirResult<Report> {
        self.store.create_new_report(year, slides).await
    }

    pub async fn delete_report(&self, year: i32) -> YirResult<()> {
        self.store.delete_report(year).await
    }

    pub async fn delete_all_reports(&self) -> YirResult<()> {
        self.store.delete_all_reports().await
    }
}
