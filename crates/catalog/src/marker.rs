use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Outcome recorded by a [`CompletionMarker`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum MarkerResult {
    Success,
    Failure,
}

/// Status record for the most recent cycle. One per key; every write
/// replaces the previous one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionMarker {
    pub key: String,
    pub result: MarkerResult,
    pub timestamp: OffsetDateTime,
}
impl CompletionMarker {
    pub fn success(key: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            key: key.into(),
            result: MarkerResult::Success,
            timestamp,
        }
    }

    /// ISO-8601 timestamp in UTC, e.g. `2024-03-07T09:15:00.123Z`.
    pub fn timestamp_string(&self) -> Result<String> {
        self.timestamp.to_offset(time::UtcOffset::UTC).format(&Rfc3339).or_raise(|| ErrorKind::Timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_success_marker() {
        let marker = CompletionMarker::success("ImageProcessor", datetime!(2024-03-07 09:15:00.5 UTC));
        assert_eq!(marker.result, MarkerResult::Success);
        assert_eq!(marker.result.to_string(), "Success");
        assert_eq!(marker.timestamp_string().unwrap(), "2024-03-07T09:15:00.5Z");
    }

    #[test]
    fn test_timestamp_normalized_to_utc() {
        let marker = CompletionMarker::success("ImageProcessor", datetime!(2024-03-07 11:15:00 +2));
        assert_eq!(marker.timestamp_string().unwrap(), "2024-03-07T09:15:00Z");
    }
}
