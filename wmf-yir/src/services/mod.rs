//! Remote services used by Year in Review

pub mod mediawiki_client;

pub use mediawiki_client::{ContributionCount, ContributionsService, MediaWikiClient};
