//! Year in Review report persistence
//!
//! Repository over `yir_reports` / `yir_slides`: `fetch_report` reads by
//! year, `save_report` replaces, `delete_report` removes a report and its
//! slides. A report row never exists without its full slide set: every write
//! that can create a report seeds the missing slide kinds in the same
//! transaction.

use crate::error::YirResult;
use crate::models::{Report, Slide, SlideId};
use crate::remote_config::PersonalizedSlides;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

/// Report plus which slides still need population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredReport {
    pub report: Report,
    pub needs_reading: bool,
    pub needs_editing: bool,
}

#[derive(Clone)]
pub struct ReportStore {
    db: SqlitePool,
}

impl ReportStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Fetch or create the report for `year` and compute population flags
    ///
    /// Any missing slide kind is added in its unevaluated state. Reading needs
    /// population when its slide is unevaluated and enabled; editing
    /// additionally needs a username.
    pub async fn ensure_report(
        &self,
        year: i32,
        slides_config: &PersonalizedSlides,
        username: Option<&str>,
    ) -> YirResult<EnsuredReport> {
        let mut tx = self.db.begin().await?;

        let created = seed_report(&mut tx, year).await?;
        let slides = load_slides(&mut tx, year).await?;
        tx.commit().await?;

        if created {
            info!(year, "Created Year in Review report");
        }

        let mut needs_reading = false;
        let mut needs_editing = false;
        for slide in &slides {
            match slide.id {
                SlideId::ReadCount => {
                    if !slide.evaluated && slides_config.read_count.is_enabled {
                        needs_reading = true;
                    }
                }
                SlideId::EditCount => {
                    if !slide.evaluated && slides_config.edit_count.is_enabled && username.is_some() {
                        needs_editing = true;
                    }
                }
            }
        }

        debug!(year, needs_reading, needs_editing, "Ensured Year in Review report");

        Ok(EnsuredReport {
            report: Report::new(year, slides),
            needs_reading,
            needs_editing,
        })
    }

    /// Record a slide evaluation; idempotent
    ///
    /// Creates the report with its full slide set when it does not exist yet.
    pub async fn persist_slide(
        &self,
        year: i32,
        id: SlideId,
        data: &[u8],
        displayed: bool,
    ) -> YirResult<()> {
        let mut tx = self.db.begin().await?;

        seed_report(&mut tx, year).await?;

        sqlx::query(
            r#"
            UPDATE yir_slides
            SET evaluated = 1, display = ?, data = ?, updated_at = CURRENT_TIMESTAMP
            WHERE year = ? AND slide_id = ?
            "#,
        )
        .bind(displayed)
        .bind(data)
        .bind(year)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(year, slide = %id, display = displayed, "Persisted Year in Review slide");
        Ok(())
    }

    pub async fn fetch_report(&self, year: i32) -> YirResult<Option<Report>> {
        let mut tx = self.db.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT year FROM yir_reports WHERE year = ?")
            .bind(year)
            .fetch_optional(&mut *tx)
            .await?;

        let report = match exists {
            Some(_) => Some(Report::new(year, load_slides(&mut tx, year).await?)),
            None => None,
        };

        tx.commit().await?;
        Ok(report)
    }

    pub async fn fetch_all_reports(&self) -> YirResult<Vec<Report>> {
        let mut tx = self.db.begin().await?;

        let years: Vec<i32> = sqlx::query_scalar("SELECT year FROM yir_reports ORDER BY year")
            .fetch_all(&mut *tx)
            .await?;

        let mut reports = Vec::with_capacity(years.len());
        for year in years {
            reports.push(Report::new(year, load_slides(&mut tx, year).await?));
        }

        tx.commit().await?;
        Ok(reports)
    }

    /// Replace a report's slide set with the given slides
    ///
    /// Slide kinds absent from `report.slides` are reset to unevaluated, so
    /// the stored report always carries every kind.
    pub async fn save_report(&self, report: &Report) -> YirResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM yir_slides WHERE year = ?")
            .bind(report.year)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO yir_reports (year) VALUES (?)")
            .bind(report.year)
            .execute(&mut *tx)
            .await?;

        for slide in &report.slides {
            sqlx::query(
                r#"
                INSERT INTO yir_slides (year, slide_id, evaluated, display, data, updated_at)
                VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
                ON CONFLICT(year, slide_id) DO UPDATE SET
                    evaluated = excluded.evaluated,
                    display = excluded.display,
                    data = excluded.data,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            )
            .bind(report.year)
            .bind(slide.id.as_str())
            .bind(slide.evaluated)
            .bind(slide.display)
            .bind(slide.data.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        seed_report(&mut tx, report.year).await?;
        tx.commit().await?;

        info!(year = report.year, slides = report.slides.len(), "Saved Year in Review report");
        Ok(())
    }

    /// Save a new report and return it as stored
    pub async fn create_new_report(&self, year: i32, slides: Vec<Slide>) -> YirResult<Report> {
        let report = Report::new(year, slides);
        self.save_report(&report).await?;
        Ok(self.fetch_report(year).await?.unwrap_or(report))
    }

    /// Delete a report and its slides; a missing report is not an error
    pub async fn delete_report(&self, year: i32) -> YirResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM yir_slides WHERE year = ?")
            .bind(year)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM yir_reports WHERE year = ?")
            .bind(year)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if deleted > 0 {
            info!(year, "Deleted Year in Review report");
        }
        Ok(())
    }

    pub async fn delete_all_reports(&self) -> YirResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM yir_slides").execute(&mut *tx).await?;
        let deleted = sqlx::query("DELETE FROM yir_reports")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        info!(deleted, "Deleted all Year in Review reports");
        Ok(())
    }
}

/// Insert the report row and any missing slide kinds; returns true when the
/// report row is new
async fn seed_report(tx: &mut Transaction<'_, Sqlite>, year: i32) -> YirResult<bool> {
    let created = sqlx::query("INSERT OR IGNORE INTO yir_reports (year) VALUES (?)")
        .bind(year)
        .execute(&mut **tx)
        .await?
        .rows_affected()
        > 0;

    for id in SlideId::ALL {
        sqlx::query(
            "INSERT OR IGNORE INTO yir_slides (year, slide_id, evaluated, display, data)
             VALUES (?, ?, 0, 0, NULL)",
        )
        .bind(year)
        .bind(id.as_str())
        .execute(&mut **tx)
        .await?;
    }

    Ok(created)
}

/// Load a report's slides in `SlideId::ALL` order, skipping ids this build
/// does not know
async fn load_slides(tx: &mut Transaction<'_, Sqlite>, year: i32) -> YirResult<Vec<Slide>> {
    let rows = sqlx::query(
        "SELECT year, slide_id, evaluated, display, data FROM yir_slides WHERE year = ?",
    )
    .bind(year)
    .fetch_all(&mut **tx)
    .await?;

    let mut slides = Vec::with_capacity(rows.len());
    for row in rows {
        match slide_from_row(&row) {
            Ok(slide) => slides.push(slide),
            Err(e) => warn!(year, "Skipping stored slide: {}", e),
        }
    }
    slides.sort_by_key(|slide| slide.id);

    Ok(slides)
}

fn slide_from_row(row: &SqliteRow) -> Result<Slide, Box<dyn std::error::Error + Send + Sync>> {
    let slide_id: String = row.try_get("slide_id")?;

    Ok(Slide {
        year: row.try_get("year")?,
        id: slide_id.parse()?,
        evaluated: row.try_get("evaluated")?,
        display: row.try_get("display")?,
        data: row.try_get("data")?,
    })
}
