//! End-to-end population through the data controller
//!
//! Uses fixed page view and contribution fakes over an in-memory database.

mod helpers;

use chrono::{TimeZone, Utc};
use helpers::{developer_settings, french, harness, yir_config, FixedPageViews, WINDOW_END, WINDOW_START};
use wmf_common::db::init::init_memory_database;
use wmf_common::{Project, SettingsStore};
use wmf_yir::db::ReportStore;
use wmf_yir::gate::Ineligibility;
use wmf_yir::remote_config::DeveloperSettings;
use wmf_yir::{
    Dependencies, PopulationOutcome, Report, SlideId, YearInReviewDataController, YirError,
};

fn populated(outcome: PopulationOutcome) -> Report {
    match outcome {
        PopulationOutcome::Populated(report) => report,
        PopulationOutcome::Skipped(reason) => panic!("expected population, skipped: {}", reason),
    }
}

#[tokio::test]
async fn test_reading_slide_display_threshold() {
    for (pages, expected_display) in [(5, false), (6, true)] {
        let h = harness(developer_settings(yir_config(true, true)), pages, 1).await;

        let report = populated(
            h.controller
                .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
                .await
                .unwrap(),
        );

        let slide = report.slide(SlideId::ReadCount).unwrap();
        assert!(slide.evaluated);
        assert_eq!(slide.display, expected_display, "pages read: {}", pages);
        assert_eq!(slide.count().unwrap(), Some(pages as i64));
    }
}

#[tokio::test]
async fn test_editing_slide_display_threshold() {
    for (edits, expected_display) in [(0, false), (1, true)] {
        let h = harness(developer_settings(yir_config(true, true)), 10, edits).await;

        let report = populated(
            h.controller
                .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
                .await
                .unwrap(),
        );

        let slide = report.slide(SlideId::EditCount).unwrap();
        assert!(slide.evaluated);
        assert_eq!(slide.display, expected_display, "edits: {}", edits);
        assert_eq!(slide.count().unwrap(), Some(edits as i64));
    }
}

#[tokio::test]
async fn test_evaluated_slides_are_not_recomputed() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    for _ in 0..3 {
        h.controller
            .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
            .await
            .unwrap();
    }

    assert_eq!(h.page_views.calls(), 1);
    assert_eq!(h.contributions.calls(), 1);

    let slides: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM yir_slides WHERE year = 2024")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(slides, 2);
}

#[tokio::test]
async fn test_country_not_allowed_skips_without_side_effects() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    let outcome = h
        .controller
        .populate_report_data(2024, "US", Some(&french()), Some("Alice"))
        .await
        .unwrap();

    assert_eq!(outcome, PopulationOutcome::Skipped(Ineligibility::CountryNotAllowed));
    assert_eq!(h.page_views.calls(), 0);
    assert_eq!(h.contributions.calls(), 0);
    assert!(h.controller.fetch_all_reports().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_country_match_ignores_case() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    let outcome = h
        .controller
        .populate_report_data(2024, "fr", Some(&Project::wikipedia("FR")), Some("Alice"))
        .await
        .unwrap();

    assert!(matches!(outcome, PopulationOutcome::Populated(_)));
}

#[tokio::test]
async fn test_local_flag_disabled_skips() {
    let mut settings = developer_settings(yir_config(true, true));
    settings.enable_year_in_review = false;
    let h = harness(settings, 12, 3).await;

    let outcome = h
        .controller
        .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
        .await
        .unwrap();

    assert_eq!(outcome, PopulationOutcome::Skipped(Ineligibility::LocalFlagDisabled));
    assert!(h.controller.fetch_report(2024).await.unwrap().is_none());
}

#[tokio::test]
async fn test_language_not_allowed_skips() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    let outcome = h
        .controller
        .populate_report_data(2024, "FR", Some(&Project::wikipedia("de")), Some("Alice"))
        .await
        .unwrap();

    assert_eq!(outcome, PopulationOutcome::Skipped(Ineligibility::LanguageNotAllowed));
}

#[tokio::test]
async fn test_missing_project_skips() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    let outcome = h
        .controller
        .populate_report_data(2024, "FR", None, Some("Alice"))
        .await
        .unwrap();

    assert_eq!(outcome, PopulationOutcome::Skipped(Ineligibility::MissingProject));
}

#[tokio::test]
async fn test_editing_skipped_without_username() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    let report = populated(
        h.controller
            .populate_report_data(2024, "FR", Some(&french()), None)
            .await
            .unwrap(),
    );

    assert!(report.slide(SlideId::ReadCount).unwrap().evaluated);
    let edit = report.slide(SlideId::EditCount).unwrap();
    assert!(!edit.evaluated);
    assert!(!edit.display);
    assert_eq!(h.contributions.calls(), 0);

    // Logging in later fills the editing slide only
    h.controller
        .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
        .await
        .unwrap();
    assert_eq!(h.page_views.calls(), 1);
    assert_eq!(h.contributions.calls(), 1);
}

#[tokio::test]
async fn test_disabled_slide_is_not_evaluated() {
    let h = harness(developer_settings(yir_config(false, true)), 12, 3).await;

    let report = populated(
        h.controller
            .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
            .await
            .unwrap(),
    );

    assert!(!report.slide(SlideId::ReadCount).unwrap().evaluated);
    assert!(report.slide(SlideId::EditCount).unwrap().evaluated);
    assert_eq!(h.page_views.calls(), 0);
}

#[tokio::test]
async fn test_unparseable_window_leaves_reading_unevaluated() {
    let mut config = yir_config(true, false);
    config.data_population_start_date_string = "not a date".to_string();
    let h = harness(developer_settings(config), 12, 3).await;

    let report = populated(
        h.controller
            .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
            .await
            .unwrap(),
    );

    assert!(!report.slide(SlideId::ReadCount).unwrap().evaluated);
    assert_eq!(h.page_views.calls(), 0);
}

#[tokio::test]
async fn test_window_passed_through_in_chronological_order() {
    let h = harness(developer_settings(yir_config(true, true)), 12, 3).await;

    h.controller
        .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
        .await
        .unwrap();

    let requests = h.contributions.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![(
            "Alice".to_string(),
            Some(french()),
            WINDOW_START.to_string(),
            WINDOW_END.to_string()
        )]
    );

    let windows = h.page_views.windows.lock().unwrap().clone();
    assert_eq!(
        windows,
        vec![(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()
        )]
    );
}

#[tokio::test]
async fn test_missing_contributions_service_is_unavailable() {
    let pool = init_memory_database().await.unwrap();
    let deps = Dependencies::new(
        Some(ReportStore::new(pool.clone())),
        SettingsStore::new(pool.clone()),
        developer_settings(yir_config(true, true)),
        FixedPageViews::new(3),
    );
    let controller = YearInReviewDataController::new(deps).unwrap();

    let result = controller
        .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
        .await;
    assert!(matches!(result, Err(YirError::ServiceUnavailable)));

    let result = controller.fetch_edit_count("Alice", Some(&french())).await;
    assert!(matches!(result, Err(YirError::ServiceUnavailable)));
}

#[tokio::test]
async fn test_missing_store_is_unavailable() {
    let pool = init_memory_database().await.unwrap();
    let deps = Dependencies::new(
        None,
        SettingsStore::new(pool),
        developer_settings(yir_config(true, true)),
        FixedPageViews::new(3),
    );

    assert!(matches!(
        YearInReviewDataController::new(deps),
        Err(YirError::StoreUnavailable)
    ));
}

#[tokio::test]
async fn test_fetch_edit_count_uses_target_window() {
    let h = harness(developer_settings(yir_config(true, true)), 0, 7).await;

    let count = h.controller.fetch_edit_count("Alice", Some(&french())).await.unwrap();

    assert_eq!(count, 7);
    let requests = h.contributions.requests.lock().unwrap().clone();
    assert_eq!(requests[0].2, WINDOW_START);
    assert_eq!(requests[0].3, WINDOW_END);
}

#[tokio::test]
async fn test_entry_point_requires_displayed_slide() {
    let h = harness(developer_settings(yir_config(true, true)), 2, 0).await;
    let project = french();

    assert!(!h
        .controller
        .should_show_entry_point(Some("FR"), Some(&project))
        .await
        .unwrap());

    // Nothing crosses a display threshold
    h.controller
        .populate_report_data(2024, "FR", Some(&project), Some("Alice"))
        .await
        .unwrap();
    assert!(!h
        .controller
        .should_show_entry_point(Some("FR"), Some(&project))
        .await
        .unwrap());

    let h = harness(developer_settings(yir_config(true, true)), 20, 0).await;
    h.controller
        .populate_report_data(2024, "FR", Some(&project), Some("Alice"))
        .await
        .unwrap();
    assert!(h
        .controller
        .should_show_entry_point(Some("FR"), Some(&project))
        .await
        .unwrap());
    assert!(!h
        .controller
        .should_show_entry_point(Some("US"), Some(&project))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_feature_announcement_shown_once() {
    let h = harness(developer_settings(yir_config(true, true)), 20, 1).await;
    let project = french();
    let now = Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap();

    h.controller
        .populate_report_data(2024, "FR", Some(&project), Some("Alice"))
        .await
        .unwrap();

    assert!(!h.controller.has_presented_feature_announcement().await.unwrap());
    assert!(h
        .controller
        .should_show_feature_announcement(Some("FR"), Some(&project), now)
        .await
        .unwrap());

    h.controller.set_has_presented_feature_announcement(true).await.unwrap();

    assert!(h.controller.has_presented_feature_announcement().await.unwrap());
    assert!(!h
        .controller
        .should_show_feature_announcement(Some("FR"), Some(&project), now)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_feature_announcement_expiry() {
    let h = harness(developer_settings(yir_config(true, true)), 20, 1).await;

    let expiry = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    assert!(h.controller.is_announcement_active(expiry));
    assert!(!h
        .controller
        .is_announcement_active(expiry + chrono::Duration::seconds(1)));

    h.controller
        .populate_report_data(2024, "FR", Some(&french()), Some("Alice"))
        .await
        .unwrap();
    let later = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
    assert!(!h
        .controller
        .should_show_feature_announcement(Some("FR"), Some(&french()), later)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_reload_developer_settings_reads_store() {
    let mut h = harness(developer_settings(yir_config(true, true)), 20, 1).await;
    assert!(h.controller.should_populate(Some("FR"), Some(&french())));

    // Store holds neither the flag nor a config yet
    h.controller.reload_developer_settings().await.unwrap();
    assert!(!h.controller.developer_settings().enable_year_in_review);
    assert!(!h.controller.should_populate(Some("FR"), Some(&french())));

    let settings = SettingsStore::new(h.pool.clone());
    let feature_config = developer_settings(yir_config(true, true)).feature_config.unwrap();
    DeveloperSettings::set_enable_year_in_review(&settings, true).await.unwrap();
    DeveloperSettings::cache_feature_config(&settings, &serde_json::to_string(&feature_config).unwrap())
        .await
        .unwrap();

    h.controller.reload_developer_settings().await.unwrap();
    assert!(h.controller.should_populate(Some("FR"), Some(&french())));
}

#[tokio::test]
async fn test_shared_page_views_across_controllers() {
    let pool = init_memory_database().await.unwrap();
    let page_views = FixedPageViews::new(9);

    for _ in 0..2 {
        let deps = Dependencies::new(
            Some(ReportStore::new(pool.clone())),
            SettingsStore::new(pool.clone()),
            developer_settings(yir_config(true, false)),
            page_views.clone(),
        );
        let controller = YearInReviewDataController::new(deps).unwrap();
        controller
            .populate_report_data(2024, "IT", Some(&Project::wikipedia("it")), None)
            .await
            .unwrap();
    }

    // Second controller sees the slide the first one evaluated
    assert_eq!(page_views.calls(), 1);
}
