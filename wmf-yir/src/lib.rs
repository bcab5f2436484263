//! wmf-yir library interface
//!
//! Year in Review report population: eligibility gating, report and slide
//! persistence, slide metrics, and the MediaWiki contributions client.

pub mod data_controller;
pub mod db;
pub mod error;
pub mod gate;
pub mod models;
pub mod populators;
pub mod remote_config;
pub mod services;

pub use crate::data_controller::{Dependencies, PopulationOutcome, YearInReviewDataController};
pub use crate::error::{YirError, YirResult};
pub use crate::models::{Report, Slide, SlideId};
