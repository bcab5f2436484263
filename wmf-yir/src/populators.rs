//! Personalized slide populators
//!
//! Each populator computes one metric, encodes it, decides whether the slide
//! displays, and writes the result through the [`ReportStore`].

use crate::db::{PageViewCounter, ReportStore};
use crate::error::YirResult;
use crate::models::{encode_count, SlideId};
use crate::remote_config::YirConfig;
use crate::services::ContributionsService;
use wmf_common::Project;

/// Reading slide shows once more than this many distinct pages were read
pub const READING_DISPLAY_THRESHOLD: u64 = 5;

/// Editing slide shows once more than this many edits were made
pub const EDITING_DISPLAY_THRESHOLD: usize = 0;

/// Computed slide value ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideEvaluation {
    pub id: SlideId,
    pub data: Vec<u8>,
    pub display: bool,
}

pub fn evaluate_reading(count: u64) -> YirResult<SlideEvaluation> {
    Ok(SlideEvaluation {
        id: SlideId::ReadCount,
        data: encode_count(count as i64)?,
        display: count > READING_DISPLAY_THRESHOLD,
    })
}

pub fn evaluate_editing(count: usize) -> YirResult<SlideEvaluation> {
    Ok(SlideEvaluation {
        id: SlideId::EditCount,
        data: encode_count(count as i64)?,
        display: count > EDITING_DISPLAY_THRESHOLD,
    })
}

/// Distinct pages read locally during the population window
pub struct ReadingCountPopulator<'a> {
    pub page_views: &'a dyn PageViewCounter,
    pub store: &'a ReportStore,
}

impl ReadingCountPopulator<'_> {
    /// Returns None without writing when the config window is unusable
    pub async fn populate(&self, year: i32, config: &YirConfig) -> YirResult<Option<SlideEvaluation>> {
        let (Some(start), Some(end)) = (
            config.data_population_start_date(),
            config.data_population_end_date(),
        ) else {
            tracing::warn!(
                year,
                start = %config.data_population_start_date_string,
                end = %config.data_population_end_date_string,
                "Population window unparseable, reading slide left unevaluated"
            );
            return Ok(None);
        };

        let count = self.page_views.count_distinct_pages(start, end).await?;
        let evaluation = evaluate_reading(count)?;

        self.store
            .persist_slide(year, evaluation.id, &evaluation.data, evaluation.display)
            .await?;

        Ok(Some(evaluation))
    }
}

/// Mainspace edits made during the population window
pub struct EditingCountPopulator<'a> {
    pub contributions: &'a dyn ContributionsService,
    pub store: &'a ReportStore,
}

impl EditingCountPopulator<'_> {
    pub async fn populate(
        &self,
        year: i32,
        config: &YirConfig,
        username: &str,
        project: Option<&Project>,
    ) -> YirResult<SlideEvaluation> {
        let result = self
            .contributions
            .fetch_user_contribution_count(
                username,
                project,
                &config.data_population_start_date_string,
                &config.data_population_end_date_string,
            )
            .await?;

        // TODO: follow `uccontinue` once heavy editors (> 500 edits) should be counted exactly
        if result.has_more {
            tracing::debug!(year, count = result.count, "Edit count limited to first page");
        }

        let evaluation = evaluate_editing(result.count)?;

        self.store
            .persist_slide(year, evaluation.id, &evaluation.data, evaluation.display)
            .await?;

        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode_count;

    #[test]
    fn test_reading_threshold_boundary() {
        assert!(!evaluate_reading(5).unwrap().display);
        assert!(evaluate_reading(6).unwrap().display);
        assert!(!evaluate_reading(0).unwrap().display);
    }

    #[test]
    fn test_editing_threshold_boundary() {
        assert!(!evaluate_editing(0).unwrap().display);
        assert!(evaluate_editing(1).unwrap().display);
    }

    #[test]
    fn test_evaluation_data_decodes_to_count() {
        let evaluation = evaluate_editing(37).unwrap();
        assert_eq!(evaluation.id, SlideId::EditCount);
        assert_eq!(decode_count(&evaluation.data).unwrap(), 37);
    }
}
