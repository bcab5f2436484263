//! Wiki project references
//!
//! A project identifies one wiki: a language edition of Wikipedia, Wikidata,
//! or Commons. It resolves to the wiki's MediaWiki action API endpoint.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Project {
    Wikipedia { language_code: String },
    Wikidata,
    Commons,
}

impl Project {
    pub fn wikipedia(language_code: impl Into<String>) -> Self {
        Project::Wikipedia {
            language_code: language_code.into(),
        }
    }

    /// Language code for language wikis; None for Wikidata and Commons
    pub fn language_code(&self) -> Option<&str> {
        match self {
            Project::Wikipedia { language_code } => Some(language_code),
            Project::Wikidata | Project::Commons => None,
        }
    }

    /// Stable identifier used in storage (`wikipedia~en`, `wikidata`, `commons`)
    pub fn id(&self) -> String {
        match self {
            Project::Wikipedia { language_code } => format!("wikipedia~{}", language_code),
            Project::Wikidata => "wikidata".to_string(),
            Project::Commons => "commons".to_string(),
        }
    }

    /// MediaWiki action API endpoint for this project
    ///
    /// Fails with `InvalidInput` when the language code could not form a host name.
    pub fn api_url(&self) -> Result<String> {
        match self {
            Project::Wikipedia { language_code } => {
                validate_language_code(language_code)?;
                Ok(format!(
                    "https://{}.wikipedia.org/w/api.php",
                    language_code.to_ascii_lowercase()
                ))
            }
            Project::Wikidata => Ok("https://www.wikidata.org/w/api.php".to_string()),
            Project::Commons => Ok("https://commons.wikimedia.org/w/api.php".to_string()),
        }
    }
}

fn validate_language_code(code: &str) -> Result<()> {
    let valid = !code.is_empty()
        && !code.starts_with('-')
        && !code.ends_with('-')
        && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Invalid language code: {:?}", code)))
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for Project {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wikidata" => Ok(Project::Wikidata),
            "commons" => Ok(Project::Commons),
            other => match other.strip_prefix("wikipedia~") {
                Some(code) => {
                    validate_language_code(code)?;
                    Ok(Project::wikipedia(code))
                }
                None => Err(Error::InvalidInput(format!("Unknown project: {}", s))),
            },
        }
    }
}
