//! Report and slide records

use crate::error::YirResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Personalized slide kinds, ordered as they appear in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlideId {
    #[serde(rename = "readCount")]
    ReadCount,
    #[serde(rename = "editCount")]
    EditCount,
}

impl SlideId {
    pub const ALL: [SlideId; 2] = [SlideId::ReadCount, SlideId::EditCount];

    /// Identifier stored in `yir_slides.slide_id`
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideId::ReadCount => "readCount",
            SlideId::EditCount => "editCount",
        }
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for stored slide ids this build does not know
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown slide id {0:?}")]
pub struct UnknownSlideId(pub String);

impl FromStr for SlideId {
    type Err = UnknownSlideId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readCount" => Ok(SlideId::ReadCount),
            "editCount" => Ok(SlideId::EditCount),
            other => Err(UnknownSlideId(other.to_string())),
        }
    }
}

/// One personalized slide of a yearly report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub year: i32,
    pub id: SlideId,
    pub evaluated: bool,
    pub display: bool,
    /// Encoded metric; only meaningful once `evaluated` is true
    pub data: Option<Vec<u8>>,
}

impl Slide {
    /// Fresh, unevaluated slide
    pub fn new(year: i32, id: SlideId) -> Self {
        Self {
            year,
            id,
            evaluated: false,
            display: false,
            data: None,
        }
    }

    /// Decoded metric value, if the slide has been evaluated
    pub fn count(&self) -> YirResult<Option<i64>> {
        match (&self.data, self.evaluated) {
            (Some(data), true) => Ok(Some(decode_count(data)?)),
            _ => Ok(None),
        }
    }
}

/// A yearly report and its slides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub year: i32,
    pub slides: Vec<Slide>,
}

impl Report {
    /// Slides are kept in `SlideId::ALL` order
    pub fn new(year: i32, mut slides: Vec<Slide>) -> Self {
        slides.sort_by_key(|slide| slide.id);
        Self { year, slides }
    }

    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|slide| slide.id == id)
    }
}

/// Encode a metric as a self-describing JSON scalar
pub fn encode_count(count: i64) -> YirResult<Vec<u8>> {
    Ok(serde_json::to_vec(&count)?)
}

pub fn decode_count(data: &[u8]) -> YirResult<i64> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_slide_id_message() {
        let err = "topArticles".parse::<SlideId>().unwrap_err();
        assert_eq!(err.to_string(), "unknown slide id \"topArticles\"");
    }

    #[test]
    fn test_report_orders_slides() {
        let report = Report::new(
            2024,
            vec![Slide::new(2024, SlideId::EditCount), Slide::new(2024, SlideId::ReadCount)],
        );
        let ids: Vec<SlideId> = report.slides.iter().map(|s| s.id).collect();
        assert_eq!(ids, SlideId::ALL.to_vec());
    }

    #[test]
    fn test_slide_id_strings() {
        assert_eq!(SlideId::ReadCount.as_str(), "readCount");
        assert_eq!("editCount".parse::<SlideId>().unwrap(), SlideId::EditCount);
        assert_eq!(
            "topArticles".parse::<SlideId>(),
            Err(UnknownSlideId("topArticles".to_string()))
        );
    }

    #[test]
    fn test_count_encoding_is_json_text() {
        let data = encode_count(42).unwrap();
        assert_eq!(data, b"42".to_vec());
        assert_eq!(decode_count(&data).unwrap(), 42);
    }

    #[test]
    fn test_unevaluated_slide_has_no_count() {
        let mut slide = Slide::new(2024, SlideId::ReadCount);
        slide.data = Some(encode_count(7).unwrap());
        assert_eq!(slide.count().unwrap(), None);

        slide.evaluated = true;
        assert_eq!(slide.count().unwrap(), Some(7));
    }

    #[test]
    fn test_report_slide_lookup() {
        let report = Report::new(2024, vec![Slide::new(2024, SlideId::EditCount)]);
        assert!(report.slide(SlideId::EditCount).is_some());
        assert!(report.slide(SlideId::ReadCount).is_none());
    }
}
