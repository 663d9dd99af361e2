//! Registration client
//!
//! Pushes the current identity snapshot (token, language, placeholder
//! coordinates) to `POST /register/`. Failures are logged and swallowed: the
//! next timer tick, language change or not-found recovery tries again.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::BestEffort;
use crate::models::RegistrationRequest;
use crate::remote::AlertService;
use crate::session::ClientSession;

#[derive(Clone)]
pub struct Registrar {
    service: Arc<dyn AlertService>,
}

impl Registrar {
    pub fn new(service: Arc<dyn AlertService>) -> Self {
        Self { service }
    }

    /// Single registration request, never retried here
    pub async fn register(&self, session: &ClientSession) -> BestEffort<serde_json::Value> {
        let request = RegistrationRequest::from_session(session);
        match self.service.register(&request).await {
            Ok(confirmation) => {
                info!(
                    "Device {} registered/updated (language {}): {}",
                    session.token, session.language, confirmation
                );
                BestEffort::Completed(confirmation)
            }
            Err(e) => {
                warn!("Error registering device {}: {}", session.token, e);
                BestEffort::Failed(e.kind())
            }
        }
    }

    /// Fire-and-forget variant for event handlers
    pub fn spawn_register(&self, session: ClientSession) -> tokio::task::JoinHandle<BestEffort<serde_json::Value>> {
        let registrar = self.clone();
        tokio::spawn(async move { registrar.register(&session).await })
    }
}
