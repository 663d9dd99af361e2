//! Alert renderer
//!
//! `render` is a pure projection from fetched records to a view; an
//! [`AlertDisplay`] then replaces the whole alert region with that view.

use chrono::{DateTime, Local, Utc};
use std::io::Write;

use crate::models::{AlertRecord, Severity};
use crate::translator::StaticPage;

pub const NO_ALERTS_TEXT: &str = "No alerts received yet.";
pub const ERROR_TEXT: &str = "Error loading alerts.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One visual unit per alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCard {
    pub severity: Severity,
    /// Styling tag, `severity-<Severity>`
    pub class: String,
    pub heading: String,
    pub primary: String,
    pub secondary: String,
    pub id_line: String,
    pub time_line: String,
}

/// Full content of the alert region
#[derive(Debug, Clone, PartialEq)]
pub enum AlertView {
    NoAlerts,
    Error,
    Alerts(Vec<AlertCard>),
}

impl AlertView {
    pub fn cards(&self) -> &[AlertCard] {
        match self {
            AlertView::Alerts(cards) => cards,
            AlertView::NoAlerts | AlertView::Error => &[],
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            AlertView::NoAlerts => Some(NO_ALERTS_TEXT),
            AlertView::Error => Some(ERROR_TEXT),
            AlertView::Alerts(_) => None,
        }
    }
}

pub fn render(alerts: &[AlertRecord]) -> AlertView {
    if alerts.is_empty() {
        return AlertView::NoAlerts;
    }
    AlertView::Alerts(alerts.iter().map(card_for).collect())
}

fn card_for(alert: &AlertRecord) -> AlertCard {
    AlertCard {
        severity: alert.severity.clone(),
        class: format!("severity-{}", alert.severity),
        heading: format!("{} Alert:", alert.severity),
        primary: alert.translated_message.clone(),
        secondary: format!("Original: \"{}\"", alert.message),
        id_line: format!("ID: {}", alert.alert_id),
        time_line: format!("Time: {}", format_timestamp(&alert.timestamp)),
    }
}

/// Local wall-clock time
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// The screen: an alert region plus room for static pages
pub trait AlertDisplay: Send + Sync {
    /// Replaces the whole alert region
    fn show(&self, view: &AlertView);

    fn show_page(&self, page: &StaticPage);
}

/// Writes the alert region to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalDisplay;

impl AlertDisplay for TerminalDisplay {
    fn show(&self, view: &AlertView) {
        let text = view_to_text(view);
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn show_page(&self, page: &StaticPage) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(page.to_text().as_bytes());
        let _ = out.flush();
    }
}

/// Plain-text layout of a view, one block per card
pub fn view_to_text(view: &AlertView) -> String {
    let mut text = String::from("──────────────── ALERTS ────────────────\n");
    match view {
        AlertView::Alerts(cards) => {
            for card in cards {
                text.push_str(&format!(
                    "[{}] {}\n  {}\n  {}\n  {}\n  {}\n\n",
                    card.class, card.heading, card.primary, card.secondary, card.id_line, card.time_line
                ));
            }
        }
        AlertView::NoAlerts | AlertView::Error => {
            text.push_str(view.placeholder().unwrap_or_default());
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert(id: &str, severity: Severity) -> AlertRecord {
        AlertRecord {
            alert_id: id.to_string(),
            severity,
            message: format!("Message {id}"),
            translated_message: format!("[MOCK SPANISH] Message {id}"),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap(),
        }
    }

    #[test]
    fn test_empty_renders_placeholder() {
        let view = render(&[]);
        assert_eq!(view, AlertView::NoAlerts);
        assert!(view.cards().is_empty());
        assert_eq!(view.placeholder(), Some("No alerts received yet."));
    }

    #[test]
    fn test_one_card_per_alert() {
        let alerts = vec![alert("A1", Severity::Extreme), alert("A2", Severity::Minor), alert("A3", Severity::Unknown)];
        let view = render(&alerts);
        let cards = view.cards();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id_line, "ID: A1");
        assert_eq!(cards[2].id_line, "ID: A3");
        assert_eq!(cards[1].class, "severity-Minor");
        assert!(view.placeholder().is_none());
    }

    #[test]
    fn test_card_content() {
        let record = alert("IPAWS-9", Severity::Severe);
        let view = render(std::slice::from_ref(&record));
        let card = &view.cards()[0];
        assert_eq!(card.heading, "Severe Alert:");
        assert_eq!(card.primary, "[MOCK SPANISH] Message IPAWS-9");
        assert_eq!(card.secondary, "Original: \"Message IPAWS-9\"");
        let expected_time = record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
        assert_eq!(card.time_line, format!("Time: {expected_time}"));
    }

    #[test]
    fn test_feed_label_outside_cap_is_shown_as_sent() {
        let view = render(&[alert("C1", Severity::from_label("Catastrophic"))]);
        let card = &view.cards()[0];
        assert_eq!(card.class, "severity-Catastrophic");
        assert_eq!(card.heading, "Catastrophic Alert:");
    }

    #[test]
    fn test_text_layout() {
        let text = view_to_text(&AlertView::Error);
        assert!(text.contains("Error loading alerts."));

        let text = view_to_text(&render(&[alert("B7", Severity::Moderate)]));
        assert!(text.contains("[severity-Moderate] Moderate Alert:"));
        assert!(text.contains("ID: B7"));
        assert!(!text.contains("No alerts received yet."));
    }
}
