//! Wire types exchanged with the remote alert service (JSON bodies)

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::session::{ClientSession, DeviceToken, LanguageCode};

/// Body of `POST /register/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub device_token: DeviceToken,
    pub language: LanguageCode,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegistrationRequest {
    /// Location is not collected yet, coordinates are always zero
    pub fn from_session(session: &ClientSession) -> Self {
        Self {
            device_token: session.token.clone(),
            language: session.language.clone(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

/// CAP severity levels used by the alert feed
///
/// Labels outside the CAP set are kept verbatim so cards show what the feed sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    #[default]
    Unknown,
    Other(String),
}

impl Severity {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "extreme" => Severity::Extreme,
            "severe" => Severity::Severe,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            "" | "unknown" => Severity::Unknown,
            _ => Severity::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Severity::Extreme => "Extreme",
            Severity::Severe => "Severe",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
            Severity::Unknown => "Unknown",
            Severity::Other(label) => label,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// The feed sends free-form labels and sometimes null
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Severity::from_label).unwrap_or_default())
    }
}

/// One alert as returned by `GET /alerts/me/{device_token}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: String,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    pub translated_message: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC)
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Body of `POST /translate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub texts: Vec<String>,
    pub target_lang: LanguageCode,
}

/// Response of `POST /translate`, same length and order as the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_registration_body_shape() {
        let session = ClientSession::new(
            DeviceToken::new("web-1700000000-ab12cd3ef"),
            LanguageCode::parse("es").unwrap(),
        );
        let body = serde_json::to_value(RegistrationRequest::from_session(&session)).unwrap();
        assert_eq!(
            body,
            json!({
                "device_token": "web-1700000000-ab12cd3ef",
                "language": "es",
                "latitude": 0.0,
                "longitude": 0.0
            })
        );
    }

    #[test]
    fn test_alert_record_from_service_payload() {
        let payload = json!([{
            "id": 3,
            "alert_id": "IPAWS-123",
            "message": "Flood warning",
            "translated_message": "[MOCK SPANISH] Flood warning",
            "severity": "Severe",
            "timestamp": "2024-03-01T14:05:09.123456"
        }]);
        let alerts: Vec<AlertRecord> = serde_json::from_value(payload).unwrap();
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.severity, Severity::Severe);
        assert_eq!(alert.timestamp.year(), 2024);
        assert_eq!(alert.timestamp.hour(), 14);
        assert_eq!(alert.timestamp.second(), 9);
    }

    #[test]
    fn test_severity_fallbacks() {
        let with_null = json!({
            "alert_id": "a", "message": "m", "translated_message": "t",
            "severity": null, "timestamp": "2024-03-01T14:05:09Z"
        });
        let alert: AlertRecord = serde_json::from_value(with_null).unwrap();
        assert_eq!(alert.severity, Severity::Unknown);

        let missing = json!({
            "alert_id": "a", "message": "m", "translated_message": "t",
            "timestamp": "2024-03-01T14:05:09+02:00"
        });
        let alert: AlertRecord = serde_json::from_value(missing).unwrap();
        assert_eq!(alert.severity, Severity::Unknown);
        assert_eq!(alert.timestamp.hour(), 12);

        assert_eq!(Severity::from_label("EXTREME"), Severity::Extreme);
        assert_eq!(Severity::from_label(" unknown "), Severity::Unknown);
        assert_eq!(Severity::from_label(""), Severity::Unknown);
    }

    #[test]
    fn test_unrecognised_severity_keeps_raw_label() {
        let payload = json!({
            "alert_id": "a", "message": "m", "translated_message": "t",
            "severity": " Catastrophic ", "timestamp": "2024-03-01T14:05:09Z"
        });
        let alert: AlertRecord = serde_json::from_value(payload).unwrap();
        assert_eq!(alert.severity, Severity::Other("Catastrophic".to_string()));
        assert_eq!(alert.severity.label(), "Catastrophic");
        assert_eq!(serde_json::to_value(&alert.severity).unwrap(), json!("Catastrophic"));
    }

    #[test]
    fn test_bad_timestamp_is_parse_error() {
        let payload = json!([{
            "alert_id": "a", "message": "m", "translated_message": "t",
            "severity": "Minor", "timestamp": "yesterday"
        }]);
        assert!(serde_json::from_value::<Vec<AlertRecord>>(payload).is_err());
    }
}
