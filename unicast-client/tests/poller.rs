//! Poll cycle behaviour against the scripted mock service

use std::time::Duration;
use tokio::sync::watch;

use unicast_client::render::{AlertCard, ERROR_TEXT, NO_ALERTS_TEXT};
use unicast_client::{AlertView, BestEffort, FailureKind, PollOutcome, Severity};
use unicast_devkit::fixtures::alerts;
use unicast_devkit::{AlertBuilder, Endpoint, Reply, TestHarness};

const TOKEN: &str = "web-1700000000-ab12cd3ef";

#[tokio::test]
async fn test_empty_list_shows_placeholder() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Ok(Vec::new()));

    let outcome = harness.poller().poll(&harness.session()).await;

    assert_eq!(outcome, PollOutcome::Rendered { count: 0 });
    let view = harness.display.current().unwrap();
    assert_eq!(view, AlertView::NoAlerts);
    assert_eq!(view.placeholder(), Some(NO_ALERTS_TEXT));
}

#[tokio::test]
async fn test_every_record_gets_a_card() {
    let harness = TestHarness::with_identity(TOKEN, "es");
    harness.service.push_alerts(Reply::Ok(alerts(3)));

    let outcome = harness.poller().poll(&harness.session()).await;

    assert_eq!(outcome, PollOutcome::Rendered { count: 3 });
    let view = harness.display.current().unwrap();
    let ids: Vec<&str> = view.cards().iter().map(|card: &AlertCard| card.id_line.as_str()).collect();
    assert_eq!(ids, vec!["ID: ALERT-1", "ID: ALERT-2", "ID: ALERT-3"]);
    assert_eq!(view.cards()[0].primary, "[MOCK SPANISH] Evacuation notice 1");
}

#[tokio::test]
async fn test_region_is_replaced_not_appended() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness
        .service
        .push_alerts(Reply::Ok(alerts(2)))
        .push_alerts(Reply::Ok(vec![AlertBuilder::new("LATEST").severity(Severity::Extreme).build()]));

    let poller = harness.poller();
    let session = harness.session();
    poller.poll(&session).await;
    poller.poll(&session).await;

    let view = harness.display.current().unwrap();
    assert_eq!(view.cards().len(), 1);
    assert_eq!(view.cards()[0].heading, "Extreme Alert:");
    assert_eq!(view.cards()[0].class, "severity-Extreme");
}

#[tokio::test]
async fn test_not_found_re_registers_without_rendering() {
    let harness = TestHarness::with_identity(TOKEN, "fr");
    harness.service.push_alerts(Reply::Status(404));

    let outcome = harness.poller().poll(&harness.session()).await;

    assert!(matches!(outcome, PollOutcome::Recovered(BestEffort::Completed(_))));
    assert_eq!(harness.service.count(Endpoint::Register), 1);
    assert_eq!(harness.display.render_count(), 0);
    harness
        .assert_registration_sent(&serde_json::json!({
            "device_token": TOKEN,
            "language": "fr",
            "latitude": 0.0,
            "longitude": 0.0
        }))
        .unwrap();
}

#[tokio::test]
async fn test_failed_recovery_is_not_retried_within_cycle() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Status(404));
    harness.service.push_register(Reply::Status(503));

    let outcome = harness.poller().poll(&harness.session()).await;

    assert_eq!(outcome, PollOutcome::Recovered(BestEffort::Failed(FailureKind::Rejected(503))));
    assert_eq!(harness.service.count(Endpoint::Register), 1);
    assert_eq!(harness.service.count(Endpoint::Alerts), 1);
}

#[tokio::test]
async fn test_server_error_shows_error_placeholder() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Status(500));

    let outcome = harness.poller().poll(&harness.session()).await;

    assert_eq!(outcome, PollOutcome::Failed(FailureKind::Rejected(500)));
    let view = harness.display.current().unwrap();
    assert_eq!(view.placeholder(), Some(ERROR_TEXT));
    assert_eq!(harness.service.count(Endpoint::Register), 0);
}

#[tokio::test]
async fn test_network_and_parse_failures_show_error_placeholder() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Unreachable).push_alerts(Reply::Malformed);

    let poller = harness.poller();
    let session = harness.session();
    assert_eq!(poller.poll(&session).await, PollOutcome::Failed(FailureKind::Transport));
    assert_eq!(poller.poll(&session).await, PollOutcome::Failed(FailureKind::Parse));

    assert_eq!(harness.display.views(), vec![AlertView::Error, AlertView::Error]);
    assert_eq!(harness.service.count(Endpoint::Register), 0);
}

#[tokio::test]
async fn test_next_cycle_recovers_after_error() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Status(502)).push_alerts(Reply::Ok(alerts(1)));

    let poller = harness.poller();
    let session = harness.session();
    poller.poll(&session).await;
    poller.poll(&session).await;

    assert_eq!(harness.display.current().unwrap().cards().len(), 1);
}

#[tokio::test]
async fn test_recovery_uses_latest_session() {
    let harness = TestHarness::with_identity(TOKEN, "en");
    harness.service.push_alerts(Reply::Status(404));
    harness.service.set_alerts_delay(Duration::from_millis(200));
    let (latest_tx, latest) = watch::channel(harness.session());
    let poller = harness.poller();

    let change = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        latest_tx.send_replace(TestHarness::session_for(TOKEN, "de"));
    };
    let (outcome, _) = tokio::join!(poller.poll_latest(&latest), change);

    assert!(matches!(outcome, PollOutcome::Recovered(BestEffort::Completed(_))));
    let registrations = harness.service.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].language.as_str(), "de");
}
