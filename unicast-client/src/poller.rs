//! Alert poller
//!
//! Each cycle fetches the alerts addressed to the current token:
//! - success: the whole alert region is replaced with the fetched set
//! - not found: the device is re-registered and nothing is rendered this cycle
//! - anything else: logged, the error placeholder replaces the region
//!
//! Nothing here is fatal; the next cycle starts from scratch.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::config::PollingConfig;
use crate::error::{BestEffort, FailureKind, RemoteError};
use crate::registration::Registrar;
use crate::remote::AlertService;
use crate::render::{render, AlertDisplay, AlertView};
use crate::session::ClientSession;

/// What a single cycle ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Rendered { count: usize },
    /// Token unknown remotely, re-registration attempted
    Recovered(BestEffort<serde_json::Value>),
    Failed(FailureKind),
}

pub struct AlertPoller {
    service: Arc<dyn AlertService>,
    registrar: Registrar,
    display: Arc<dyn AlertDisplay>,
}

impl AlertPoller {
    pub fn new(service: Arc<dyn AlertService>, registrar: Registrar, display: Arc<dyn AlertDisplay>) -> Self {
        Self {
            service,
            registrar,
            display,
        }
    }

    pub async fn poll(&self, session: &ClientSession) -> PollOutcome {
        self.poll_with(session, || session.clone()).await
    }

    /// Same cycle, but a not-found recovery registers the session that is
    /// current when the 404 arrives, not the one the fetch started with
    pub async fn poll_latest(&self, latest: &watch::Receiver<ClientSession>) -> PollOutcome {
        let snapshot = latest.borrow().clone();
        self.poll_with(&snapshot, || latest.borrow().clone()).await
    }

    async fn poll_with(&self, session: &ClientSession, current: impl Fn() -> ClientSession) -> PollOutcome {
        match self.service.alerts_for(&session.token).await {
            Ok(alerts) => {
                debug!("Fetched {} alerts for {}", alerts.len(), session.token);
                self.display.show(&render(&alerts));
                PollOutcome::Rendered { count: alerts.len() }
            }
            Err(RemoteError::NotFound) => {
                warn!("Device {} not found on backend. Re-registering.", session.token);
                let current = current();
                PollOutcome::Recovered(self.registrar.register(&current).await)
            }
            Err(e) => {
                error!("Error fetching alerts: {}", e);
                self.display.show(&AlertView::Error);
                PollOutcome::Failed(e.kind())
            }
        }
    }
}

/// Why a cycle was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Timer,
    LanguageChange,
}

impl Trigger {
    /// Urgent triggers are never dropped, only deferred
    fn is_urgent(self) -> bool {
        !matches!(self, Trigger::Timer)
    }
}

/// Single in-flight guard.
///
/// Timer ticks arriving during a cycle are skipped. Urgent triggers during a
/// cycle collapse into one follow-up cycle started when the current one ends.
#[derive(Debug, Default)]
pub struct PollGate {
    in_flight: bool,
    rerun: bool,
}

impl PollGate {
    /// `true` if a cycle should start now
    pub fn request(&mut self, trigger: Trigger) -> bool {
        if !self.in_flight {
            self.in_flight = true;
            return true;
        }
        if trigger.is_urgent() {
            self.rerun = true;
        } else {
            debug!("Poll already in progress, skipping {:?} trigger", trigger);
        }
        false
    }

    /// Marks the running cycle finished, `true` if a deferred cycle should start now
    pub fn complete(&mut self) -> bool {
        if self.rerun {
            self.rerun = false;
            true
        } else {
            self.in_flight = false;
            false
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Fixed interval plus uniform random jitter
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    max_jitter: Duration,
}

impl PollSchedule {
    pub fn new(interval: Duration, max_jitter: Duration) -> Self {
        Self { interval, max_jitter }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval(), config.max_jitter())
    }

    /// Longest a single cycle may run; past it the cycle is abandoned
    pub fn cycle_timeout(&self) -> Duration {
        self.interval
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.interval;
        }
        self.interval + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}
