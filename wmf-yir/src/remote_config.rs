//! Remote feature config and developer settings
//!
//! The remote feature config is fetched by another component and cached in
//! the settings store. This module only models it and reads the cache.

use crate::error::{YirError, YirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wmf_common::time::parse_config_date;
use wmf_common::SettingsStore;

/// Settings key for the local Year in Review switch
pub const ENABLE_YEAR_IN_REVIEW_KEY: &str = "developer_enable_year_in_review";

/// Settings key for the cached remote feature config JSON
pub const FEATURE_CONFIG_KEY: &str = "developer_feature_config";

/// Remote feature config document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub ios: Vec<IosFeatureConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosFeatureConfig {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub yir: Vec<YirConfig>,
}

impl IosFeatureConfig {
    pub fn yir(&self, year_id: &str) -> Option<&YirConfig> {
        self.yir.iter().find(|config| config.year_id == year_id)
    }
}

/// Per-year Year in Review config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YirConfig {
    #[serde(rename = "yearID")]
    pub year_id: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub country_codes: Vec<String>,
    #[serde(default)]
    pub primary_app_language_codes: Vec<String>,
    pub data_population_start_date_string: String,
    pub data_population_end_date_string: String,
    pub personalized_slides: PersonalizedSlides,
}

impl YirConfig {
    pub fn data_population_start_date(&self) -> Option<DateTime<Utc>> {
        parse_config_date(&self.data_population_start_date_string)
    }

    pub fn data_population_end_date(&self) -> Option<DateTime<Utc>> {
        parse_config_date(&self.data_population_end_date_string)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedSlides {
    pub read_count: SlideConfig,
    pub edit_count: SlideConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideConfig {
    pub is_enabled: bool,
}

/// Snapshot of the local switch and cached remote config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeveloperSettings {
    pub enable_year_in_review: bool,
    pub feature_config: Option<FeatureConfig>,
}

impl DeveloperSettings {
    /// Read the snapshot from the settings store
    ///
    /// An undecodable cached config is treated as absent.
    pub async fn load(store: &SettingsStore) -> YirResult<Self> {
        let enable_year_in_review = store
            .load::<bool>(ENABLE_YEAR_IN_REVIEW_KEY)
            .await?
            .unwrap_or(false);

        let feature_config = match store.load::<FeatureConfig>(FEATURE_CONFIG_KEY).await {
            Ok(config) => config,
            Err(wmf_common::Error::Serialization(e)) => {
                tracing::warn!("Ignoring undecodable cached feature config: {}", e);
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            enable_year_in_review,
            feature_config,
        })
    }

    pub async fn set_enable_year_in_review(store: &SettingsStore, enabled: bool) -> YirResult<()> {
        store.save(ENABLE_YEAR_IN_REVIEW_KEY, &enabled).await?;
        Ok(())
    }

    /// Validate and cache a remote feature config document
    pub async fn cache_feature_config(store: &SettingsStore, json: &str) -> YirResult<FeatureConfig> {
        let config: FeatureConfig = serde_json::from_str(json)?;
        store.save(FEATURE_CONFIG_KEY, &config).await?;
        Ok(config)
    }

    /// Drop the cached remote feature config
    pub async fn clear_feature_config(store: &SettingsStore) -> YirResult<()> {
        store.remove(FEATURE_CONFIG_KEY).await?;
        Ok(())
    }

    /// Year in Review config for `year_id` from the first iOS config entry
    pub fn yir_config(&self, year_id: &str) -> YirResult<&YirConfig> {
        self.feature_config
            .as_ref()
            .and_then(|config| config.ios.first())
            .and_then(|ios| ios.yir(year_id))
            .ok_or(YirError::RemoteConfigMissing)
    }
}
