//! Preference controller: reacts to language changes

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::identity::{IdentityStore, KeyValueStore};
use crate::poller::Trigger;
use crate::registration::Registrar;
use crate::session::{ClientSession, LanguageCode};

pub struct PreferenceController<S: KeyValueStore> {
    identity: IdentityStore<S>,
    registrar: Registrar,
    poll_requests: mpsc::UnboundedSender<Trigger>,
}

impl<S: KeyValueStore> PreferenceController<S> {
    pub fn new(identity: IdentityStore<S>, registrar: Registrar, poll_requests: mpsc::UnboundedSender<Trigger>) -> Self {
        Self {
            identity,
            registrar,
            poll_requests,
        }
    }

    /// Persist, re-register (fire-and-forget) and ask for an immediate poll.
    ///
    /// Returns the updated session, or `None` when `raw` is not a usable code.
    pub fn on_language_changed(&mut self, current: &ClientSession, raw: &str) -> Option<ClientSession> {
        let Some(language) = LanguageCode::parse(raw) else {
            warn!("Ignoring invalid language code {:?}", raw);
            return None;
        };

        self.identity.set_language(&language);
        let session = current.with_language(language);
        info!("Language changed to {}", session.language);

        let _ = self.registrar.spawn_register(session.clone());
        if self.poll_requests.send(Trigger::LanguageChange).is_err() {
            warn!("Poll loop is gone, immediate refresh dropped");
        }
        Some(session)
    }
}
