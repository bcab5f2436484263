//! Shared fixtures for wmf-yir integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wmf_common::db::init::init_memory_database;
use wmf_common::{Project, SettingsStore};
use wmf_yir::db::{PageViewCounter, ReportStore};
use wmf_yir::remote_config::{
    DeveloperSettings, FeatureConfig, IosFeatureConfig, PersonalizedSlides, SlideConfig, YirConfig,
};
use wmf_yir::services::{ContributionCount, ContributionsService};
use wmf_yir::{Dependencies, YearInReviewDataController, YirResult};

pub const WINDOW_START: &str = "2024-01-01T00:00:00Z";
pub const WINDOW_END: &str = "2024-12-01T00:00:00Z";

pub fn yir_config(read_enabled: bool, edit_enabled: bool) -> YirConfig {
    YirConfig {
        year_id: "2024.1".to_string(),
        is_enabled: true,
        country_codes: vec!["FR".to_string(), "IT".to_string()],
        primary_app_language_codes: vec!["fr".to_string(), "it".to_string()],
        data_population_start_date_string: WINDOW_START.to_string(),
        data_population_end_date_string: WINDOW_END.to_string(),
        personalized_slides: PersonalizedSlides {
            read_count: SlideConfig { is_enabled: read_enabled },
            edit_count: SlideConfig { is_enabled: edit_enabled },
        },
    }
}

pub fn developer_settings(config: YirConfig) -> DeveloperSettings {
    DeveloperSettings {
        enable_year_in_review: true,
        feature_config: Some(FeatureConfig {
            ios: vec![IosFeatureConfig {
                version: 1,
                yir: vec![config],
            }],
        }),
    }
}

pub fn all_enabled() -> PersonalizedSlides {
    yir_config(true, true).personalized_slides
}

pub fn french() -> Project {
    Project::wikipedia("fr")
}

/// Page view counter returning a fixed count and recording calls
pub struct FixedPageViews {
    pub count: u64,
    pub calls: AtomicUsize,
    pub windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl FixedPageViews {
    pub fn new(count: u64) -> Arc<Self> {
        Arc::new(Self {
            count,
            calls: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageViewCounter for FixedPageViews {
    async fn count_distinct_pages(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> YirResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push((start, end));
        Ok(self.count)
    }
}

/// Contributions service returning a fixed count and recording calls
pub struct FixedContributions {
    pub count: usize,
    pub has_more: bool,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<(String, Option<Project>, String, String)>>,
}

impl FixedContributions {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            count,
            has_more: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContributionsService for FixedContributions {
    async fn fetch_user_contribution_count(
        &self,
        username: &str,
        project: Option<&Project>,
        start_date: &str,
        end_date: &str,
    ) -> YirResult<ContributionCount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            username.to_string(),
            project.cloned(),
            start_date.to_string(),
            end_date.to_string(),
        ));
        Ok(ContributionCount {
            count: self.count,
            has_more: self.has_more,
        })
    }
}

pub struct Harness {
    pub pool: SqlitePool,
    pub controller: YearInReviewDataController,
    pub page_views: Arc<FixedPageViews>,
    pub contributions: Arc<FixedContributions>,
}

/// Controller over an in-memory database with fixed metrics
pub async fn harness(settings: DeveloperSettings, pages_read: u64, edits: usize) -> Harness {
    let pool = init_memory_database().await.unwrap();
    let page_views = FixedPageViews::new(pages_read);
    let contributions = FixedContributions::new(edits);

    let deps = Dependencies::new(
        Some(ReportStore::new(pool.clone())),
        SettingsStore::new(pool.clone()),
        settings,
        page_views.clone(),
    )
    .with_contributions(contributions.clone());

    Harness {
        pool,
        controller: YearInReviewDataController::new(deps).unwrap(),
        page_views,
        contributions,
    }
}
