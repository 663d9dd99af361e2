//! Client main loop
//!
//! One cooperative loop owns the session and reacts to:
//! - the poll timer (fixed interval + jitter)
//! - immediate poll requests (language changes)
//! - completion of the in-flight poll cycle
//! - user commands
//!
//! Network calls run in spawned tasks, the loop itself never waits on them.
//! A cycle that outlives the poll interval is abandoned and counts as a
//! transport failure, so a stalled request never blocks later cycles.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::error::FailureKind;
use crate::identity::{IdentityStore, KeyValueStore};
use crate::poller::{AlertPoller, PollGate, PollOutcome, PollSchedule, Trigger};
use crate::preferences::PreferenceController;
use crate::registration::Registrar;
use crate::remote::AlertService;
use crate::render::{AlertDisplay, AlertView};
use crate::session::ClientSession;
use crate::translator::{PageId, StaticTranslator};

/// User input forwarded to the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetLanguage(String),
    ShowPage(PageId),
    Quit,
}

impl Command {
    /// `lang <code>`, `page <about|rights>`, `quit`
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next()?.to_ascii_lowercase();
        let arg = words.next();
        match (verb.as_str(), arg) {
            ("lang" | "language", Some(code)) => Some(Command::SetLanguage(code.to_string())),
            ("page", Some(name)) => PageId::parse(name).map(Command::ShowPage),
            ("quit" | "exit", None) => Some(Command::Quit),
            _ => None,
        }
    }
}

pub struct ClientRuntime<S: KeyValueStore> {
    session: ClientSession,
    /// Latest session, read by in-flight cycles
    session_tx: watch::Sender<ClientSession>,
    preferences: PreferenceController<S>,
    registrar: Registrar,
    poller: Arc<AlertPoller>,
    translator: StaticTranslator,
    display: Arc<dyn AlertDisplay>,
    schedule: PollSchedule,
    poll_requests: mpsc::UnboundedReceiver<Trigger>,
}

impl<S: KeyValueStore + Send + 'static> ClientRuntime<S> {
    pub fn new(
        mut identity: IdentityStore<S>,
        service: Arc<dyn AlertService>,
        display: Arc<dyn AlertDisplay>,
        schedule: PollSchedule,
    ) -> Self {
        let session = identity.session();
        let registrar = Registrar::new(service.clone());
        let poller = Arc::new(AlertPoller::new(service.clone(), registrar.clone(), display.clone()));
        let (request_tx, poll_requests) = mpsc::unbounded_channel();
        let (session_tx, _) = watch::channel(session.clone());

        Self {
            session,
            session_tx,
            preferences: PreferenceController::new(identity, registrar.clone(), request_tx),
            registrar,
            poller,
            translator: StaticTranslator::new(service),
            display,
            schedule,
            poll_requests,
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    /// Runs until `Quit` or until every command sender is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> ClientSession {
        info!(
            "Starting alert client for device {} (language {})",
            self.session.token, self.session.language
        );

        // Initial registration completes (or fails) before the first poll
        let _ = self.registrar.register(&self.session).await;

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PollOutcome>();
        let mut gate = PollGate::default();
        if gate.request(Trigger::Startup) {
            self.start_cycle(&done_tx);
        }

        let timer = sleep(self.schedule.next_delay());
        tokio::pin!(timer);

        loop {
            tokio::select! {
                () = &mut timer => {
                    timer.as_mut().reset(Instant::now() + self.schedule.next_delay());
                    if gate.request(Trigger::Timer) {
                        self.start_cycle(&done_tx);
                    }
                }
                Some(trigger) = self.poll_requests.recv() => {
                    if gate.request(trigger) {
                        self.start_cycle(&done_tx);
                    }
                }
                Some(outcome) = done_rx.recv() => {
                    debug!("Poll cycle finished: {:?}", outcome);
                    if gate.complete() {
                        self.start_cycle(&done_tx);
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::SetLanguage(code)) => {
                        if let Some(session) = self.preferences.on_language_changed(&self.session, &code) {
                            self.session_tx.send_replace(session.clone());
                            self.session = session;
                        }
                    }
                    Some(Command::ShowPage(page)) => self.show_page(page),
                    Some(Command::Quit) | None => break,
                },
            }
        }

        info!("Alert client stopped");
        self.session
    }

    fn start_cycle(&self, done: &mpsc::UnboundedSender<PollOutcome>) {
        let poller = self.poller.clone();
        let display = self.display.clone();
        let latest = self.session_tx.subscribe();
        let bound = self.schedule.cycle_timeout();
        let done = done.clone();
        tokio::spawn(async move {
            let outcome = match timeout(bound, poller.poll_latest(&latest)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Poll cycle still running after {:?}, abandoning it", bound);
                    display.show(&AlertView::Error);
                    PollOutcome::Failed(FailureKind::Transport)
                }
            };
            let _ = done.send(outcome);
        });
    }

    fn show_page(&self, page: PageId) {
        let translator = self.translator.clone();
        let display = self.display.clone();
        let language = self.session.language.clone();
        tokio::spawn(async move {
            let page = translator.localize(page.page(), &language).await;
            display.show_page(&page);
        });
    }
}
