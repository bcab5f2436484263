//! Eligibility gate for Year in Review
//!
//! Pure predicates over a [`DeveloperSettings`] snapshot. Country and
//! language allow-lists compare case-insensitively.

use crate::error::YirResult;
use crate::models::{Report, SlideId};
use crate::remote_config::{DeveloperSettings, YirConfig};
use std::fmt;
use wmf_common::Project;

/// Why a report may not be populated or shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    LocalFlagDisabled,
    RemoteConfigMissing,
    RemoteDisabled,
    MissingCountryCode,
    CountryNotAllowed,
    MissingProject,
    LanguageNotAllowed,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Ineligibility::LocalFlagDisabled => "local feature flag disabled",
            Ineligibility::RemoteConfigMissing => "remote config missing",
            Ineligibility::RemoteDisabled => "disabled by remote config",
            Ineligibility::MissingCountryCode => "no country code",
            Ineligibility::CountryNotAllowed => "country not allowed",
            Ineligibility::MissingProject => "no primary language project",
            Ineligibility::LanguageNotAllowed => "language not allowed",
        };
        f.write_str(reason)
    }
}

pub struct ConfigGate<'a> {
    settings: &'a DeveloperSettings,
    target_config_year_id: &'a str,
}

impl<'a> ConfigGate<'a> {
    pub fn new(settings: &'a DeveloperSettings, target_config_year_id: &'a str) -> Self {
        Self {
            settings,
            target_config_year_id,
        }
    }

    pub fn yir_config(&self) -> YirResult<&'a YirConfig> {
        self.settings.yir_config(self.target_config_year_id)
    }

    /// Check every population condition, returning the config on success
    pub fn check(
        &self,
        country_code: Option<&str>,
        project: Option<&Project>,
    ) -> Result<&'a YirConfig, Ineligibility> {
        if !self.settings.enable_year_in_review {
            return Err(Ineligibility::LocalFlagDisabled);
        }

        let config = self
            .yir_config()
            .map_err(|_| Ineligibility::RemoteConfigMissing)?;

        let country_code = country_code.ok_or(Ineligibility::MissingCountryCode)?;
        let project = project.ok_or(Ineligibility::MissingProject)?;

        if !config.is_enabled {
            return Err(Ineligibility::RemoteDisabled);
        }

        if !contains_ignore_case(&config.country_codes, country_code) {
            return Err(Ineligibility::CountryNotAllowed);
        }

        match project.language_code() {
            Some(language_code)
                if contains_ignore_case(&config.primary_app_language_codes, language_code) => {}
            _ => return Err(Ineligibility::LanguageNotAllowed),
        }

        Ok(config)
    }

    pub fn should_populate(&self, country_code: Option<&str>, project: Option<&Project>) -> bool {
        let decision = self.check(country_code, project);
        if let Err(reason) = &decision {
            tracing::debug!(%reason, "Year in Review population not eligible");
        }
        decision.is_ok()
    }

    /// Entry point shows when eligible and at least one enabled slide displays
    pub fn should_show_entry_point(
        &self,
        country_code: Option<&str>,
        project: Option<&Project>,
        report: Option<&Report>,
    ) -> bool {
        let Ok(config) = self.check(country_code, project) else {
            return false;
        };
        let Some(report) = report else {
            return false;
        };

        report
            .slides
            .iter()
            .filter(|slide| slide.display)
            .any(|slide| match slide.id {
                SlideId::ReadCount => config.personalized_slides.read_count.is_enabled,
                SlideId::EditCount => config.personalized_slides.edit_count.is_enabled,
            })
    }
}

fn contains_ignore_case(allowed: &[String], value: &str) -> bool {
    allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value))
}
