//! Population against a file-backed database with the real page view store

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use wmf_common::db::init_database;
use wmf_common::{Project, SettingsStore};
use wmf_yir::db::{PageViewStore, ReportStore};
use wmf_yir::remote_config::DeveloperSettings;
use wmf_yir::{Dependencies, PopulationOutcome, SlideId, YearInReviewDataController};

const FEATURE_CONFIG: &str = r#"{
    "ios": [{
        "version": 1,
        "yir": [{
            "yearID": "2024.1",
            "isEnabled": true,
            "countryCodes": ["IT"],
            "primaryAppLanguageCodes": ["it"],
            "dataPopulationStartDateString": "2024-01-01T00:00:00Z",
            "dataPopulationEndDateString": "2024-12-01T00:00:00Z",
            "personalizedSlides": {
                "readCount": {"isEnabled": true},
                "editCount": {"isEnabled": false}
            }
        }]
    }]
}"#;

async fn controller(pool: &sqlx::SqlitePool) -> YearInReviewDataController {
    let settings_store = SettingsStore::new(pool.clone());
    let developer_settings = DeveloperSettings::load(&settings_store).await.unwrap();

    let deps = Dependencies::new(
        Some(ReportStore::new(pool.clone())),
        settings_store,
        developer_settings,
        Arc::new(PageViewStore::new(pool.clone())),
    );
    YearInReviewDataController::new(deps).unwrap()
}

#[tokio::test]
async fn test_report_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("wmf.db");
    let italian = Project::wikipedia("it");

    {
        let pool = init_database(&db_path).await.unwrap();
        let settings = SettingsStore::new(pool.clone());
        DeveloperSettings::set_enable_year_in_review(&settings, true).await.unwrap();
        DeveloperSettings::cache_feature_config(&settings, FEATURE_CONFIG).await.unwrap();

        let page_views = PageViewStore::new(pool.clone());
        for (month, title) in [(2, "Roma"), (3, "Milano"), (3, "Roma"), (4, "Napoli"), (5, "Torino"), (6, "Genova"), (7, "Bari")] {
            let at = Utc.with_ymd_and_hms(2024, month, 10, 9, 0, 0).unwrap();
            page_views.record_page_view(&italian, title, at).await.unwrap();
        }
        // Outside the window
        let late = Utc.with_ymd_and_hms(2024, 12, 20, 9, 0, 0).unwrap();
        page_views.record_page_view(&italian, "Palermo", late).await.unwrap();

        let outcome = controller(&pool)
            .await
            .populate_report_data(2024, "IT", Some(&italian), None)
            .await
            .unwrap();
        let PopulationOutcome::Populated(report) = outcome else {
            panic!("expected population");
        };

        let slide = report.slide(SlideId::ReadCount).unwrap();
        assert_eq!(slide.count().unwrap(), Some(6));
        assert!(slide.display);

        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let controller = controller(&pool).await;

    let report = controller.fetch_report(2024).await.unwrap().unwrap();
    assert!(report.slide(SlideId::ReadCount).unwrap().evaluated);
    assert!(!report.slide(SlideId::EditCount).unwrap().evaluated);
    assert!(controller
        .should_show_entry_point(Some("IT"), Some(&italian))
        .await
        .unwrap());
}
