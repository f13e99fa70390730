//! Record entities emitted by the generators.
//!
//! Field declaration order is the serialization order of each dataset and
//! must stay in sync with [`crate::DatasetKind::fields`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Click,
    FormSubmit,
    Scroll,
    VideoPlay,
    Search,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::PageView,
        EventType::Click,
        EventType::FormSubmit,
        EventType::Scroll,
        EventType::VideoPlay,
        EventType::Search,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Desktop, DeviceType::Mobile, DeviceType::Tablet];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Free,
        PlanTier::Starter,
        PlanTier::Pro,
        PlanTier::Enterprise,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Region::ALL.into_iter().find(|region| region.as_str() == value)
    }
}

/// Event timestamp in one of its two valid representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTimestamp {
    /// Integer seconds since the Unix epoch (UTC).
    Epoch(i64),
    /// `YYYY-MM-DDTHH:MM:SS`.
    Iso(String),
}

impl EventTimestamp {
    pub fn iso(value: NaiveDateTime) -> Self {
        EventTimestamp::Iso(value.format(ISO_TIMESTAMP_FORMAT).to_string())
    }

    pub fn epoch(value: NaiveDateTime) -> Self {
        EventTimestamp::Epoch(value.and_utc().timestamp())
    }

    pub fn is_epoch(&self) -> bool {
        matches!(self, EventTimestamp::Epoch(_))
    }

    /// Normalize either representation back to a naive UTC datetime.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            EventTimestamp::Epoch(seconds) => {
                DateTime::from_timestamp(*seconds, 0).map(|value| value.naive_utc())
            }
            EventTimestamp::Iso(value) => {
                NaiveDateTime::parse_from_str(value, ISO_TIMESTAMP_FORMAT).ok()
            }
        }
    }
}

/// One web analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEvent {
    pub user_id: Option<String>,
    pub session_id: String,
    pub event_type: EventType,
    pub page_url: String,
    pub referrer: Option<String>,
    pub device_type: DeviceType,
    pub timestamp: EventTimestamp,
    pub country: String,
}

/// One CRM user row. `state` holds either a code or a full name, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmUser {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub state: String,
    pub city: String,
    pub signup_date: NaiveDate,
    pub plan_tier: PlanTier,
}

/// One sales transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTransaction {
    pub transaction_id: String,
    pub user_id: String,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub region: Region,
    pub transaction_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_representations_agree() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 30))
            .expect("valid datetime");
        let iso = EventTimestamp::iso(value);
        let epoch = EventTimestamp::epoch(value);
        assert_eq!(iso, EventTimestamp::Iso("2024-03-09T14:05:30".to_string()));
        assert!(epoch.is_epoch());
        assert_eq!(iso.to_datetime(), Some(value));
        assert_eq!(epoch.to_datetime(), Some(value));
    }

    #[test]
    fn untagged_timestamp_parses_both_forms() {
        let parsed: Vec<EventTimestamp> =
            serde_json::from_str(r#"[1700000000, "2023-11-14T22:13:20"]"#).expect("parse");
        assert_eq!(parsed[0], EventTimestamp::Epoch(1_700_000_000));
        assert_eq!(parsed[0].to_datetime(), parsed[1].to_datetime());
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&EventType::FormSubmit).expect("serialize");
        assert_eq!(json, "\"form_submit\"");
        let json = serde_json::to_string(&Region::Central).expect("serialize");
        assert_eq!(json, "\"Central\"");
        assert_eq!(Region::parse("West"), Some(Region::West));
    }
}
