use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Referrer recorded when the source of an access is unknown.
pub const DEFAULT_REFERRER: &str = "direct";

/// A shortened URL together with its click history.
///
/// Records serialize in camelCase with RFC 3339 timestamps, which is the
/// layout of the persisted JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// Caller-supplied identifier. Not required to be globally unique.
    pub id: String,
    /// The destination URL.
    pub long_url: String,
    pub shortcode: ShortCode,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// Access events in the order they were recorded.
    #[serde(default)]
    pub clicks: Vec<AccessEvent>,
}

impl UrlRecord {
    /// A record is expired from the instant `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn click_count(&self) -> usize {
        self.clicks.len()
    }
}

/// One recorded access of a short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub id: String,
    pub timestamp: Timestamp,
    pub referrer: String,
    pub location: String,
}

/// A request to shorten one URL, as submitted in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CreationRequest {
    #[builder(setter(into))]
    pub id: String,
    #[builder(setter(into))]
    pub long_url: String,
    /// Validity in minutes. `None` or `0` falls back to the batch default.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub validity_minutes: Option<i64>,
    /// Requested short code. `None` or an empty string means "generate one".
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub custom_shortcode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn record(expires_at: Timestamp) -> UrlRecord {
        UrlRecord {
            id: "1".into(),
            long_url: "https://example.com".into(),
            shortcode: ShortCode::new("abc").unwrap(),
            created_at: Timestamp::UNIX_EPOCH,
            expires_at,
            clicks: vec![],
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let t = Timestamp::from_second(60).unwrap();
        let r = record(t);
        assert!(!r.is_expired_at(t - SignedDuration::from_nanos(1)));
        assert!(r.is_expired_at(t));
        assert!(r.is_expired_at(t + SignedDuration::from_secs(1)));
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(record(Timestamp::from_second(60).unwrap())).unwrap();
        assert_eq!(json["longUrl"], "https://example.com");
        assert_eq!(json["shortcode"], "abc");
        assert_eq!(json["expiresAt"], "1970-01-01T00:01:00Z");
        assert!(json["clicks"].as_array().unwrap().is_empty());
    }

    #[test]
    fn missing_clicks_default_to_empty() {
        let json = r#"{
            "id": "1",
            "longUrl": "https://example.com",
            "shortcode": "abc",
            "createdAt": "1970-01-01T00:00:00Z",
            "expiresAt": "1970-01-01T00:01:00Z"
        }"#;
        let parsed: UrlRecord = serde_json::from_str(json).unwrap();
        assert!(parsed.clicks.is_empty());
    }

    #[test]
    fn request_builder_defaults() {
        let request = CreationRequest::builder()
            .id("r1")
            .long_url("https://example.com")
            .build();
        assert_eq!(request.validity_minutes, None);
        assert_eq!(request.custom_shortcode, None);

        let request = CreationRequest::builder()
            .id("r2")
            .long_url("https://example.com")
            .validity_minutes(5)
            .custom_shortcode("abc")
            .build();
        assert_eq!(request.validity_minutes, Some(5));
        assert_eq!(request.custom_shortcode.as_deref(), Some("abc"));
    }
}
