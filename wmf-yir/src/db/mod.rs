//! Database access for wmf-yir
//!
//! Report/slide persistence and the local page view history.

pub mod page_views;
pub mod reports;

pub use page_views::{PageViewCounter, PageViewStore};
pub use reports::{EnsuredReport, ReportStore};
