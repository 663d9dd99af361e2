/*!
Builders pour fabriquer des alertes de test

Facilite l'écriture de tests avec:
- Des `AlertRecord` prêts à l'emploi (builder fluide)
- Le JSON exact renvoyé par `GET /alerts/me/{token}`
*/

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use unicast_client::{AlertRecord, Severity};

/// Construit un `AlertRecord` avec des valeurs par défaut sensées
#[derive(Debug, Clone)]
pub struct AlertBuilder {
    record: AlertRecord,
}

impl AlertBuilder {
    pub fn new(alert_id: &str) -> Self {
        Self {
            record: AlertRecord {
                alert_id: alert_id.to_string(),
                severity: Severity::Severe,
                message: format!("Test alert {alert_id}"),
                translated_message: format!("Test alert {alert_id}"),
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap(),
            },
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.record.severity = severity;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.record.message = message.to_string();
        self
    }

    pub fn translated(mut self, translated: &str) -> Self {
        self.record.translated_message = translated.to_string();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    pub fn build(self) -> AlertRecord {
        self.record
    }
}

/// N alertes distinctes, `ALERT-1` à `ALERT-N`
pub fn alerts(count: usize) -> Vec<AlertRecord> {
    (1..=count)
        .map(|i| {
            AlertBuilder::new(&format!("ALERT-{i}"))
                .message(&format!("Evacuation notice {i}"))
                .translated(&format!("[MOCK SPANISH] Evacuation notice {i}"))
                .at(Utc.with_ymd_and_hms(2024, 3, 1, 14, i as u32 % 60, 0).unwrap())
                .build()
        })
        .collect()
}

/// Payload JSON tel que le service l'envoie (timestamp ISO sans fuseau, champ `id` en plus)
pub fn service_payload(alerts: &[AlertRecord]) -> Value {
    Value::Array(
        alerts
            .iter()
            .enumerate()
            .map(|(i, alert)| {
                json!({
                    "id": i + 1,
                    "alert_id": alert.alert_id,
                    "message": alert.message,
                    "translated_message": alert.translated_message,
                    "severity": alert.severity.label(),
                    "timestamp": alert.timestamp.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let alert = AlertBuilder::new("X1").severity(Severity::Minor).translated("Hola").build();
        assert_eq!(alert.alert_id, "X1");
        assert_eq!(alert.severity, Severity::Minor);
        assert_eq!(alert.translated_message, "Hola");
    }

    #[test]
    fn test_service_payload_parses_back() {
        let original = alerts(3);
        let payload = service_payload(&original);
        let parsed: Vec<AlertRecord> = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed, original);
    }
}
