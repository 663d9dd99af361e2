/*!
Test Harness pour le client d'alertes

Facilite l'écriture de tests avec:
- Setup automatique du mock de service, de l'écran mémoire et du store
- Construction des composants (poller, registrar, runtime) déjà câblés
- Attente et assertions sur les appels reçus par le service
*/

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use unicast_client::identity::{LANGUAGE_KEY, TOKEN_KEY};
use unicast_client::poller::PollSchedule;
use unicast_client::registration::Registrar;
use unicast_client::{
    AlertPoller, ClientRuntime, ClientSession, Command, DeviceToken, IdentityStore, KeyValueStore,
    LanguageCode, MemoryStore,
};

use crate::mock_service::{Endpoint, MemoryDisplay, MockAlertService};

/// Harness de test complet pour le client
pub struct TestHarness {
    pub service: MockAlertService,
    pub display: MemoryDisplay,
    pub store: MemoryStore,
}

impl TestHarness {
    /// Crée un harness avec un store vide (première installation)
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            service: MockAlertService::new(),
            display: MemoryDisplay::new(),
            store: MemoryStore::new(),
        }
    }

    /// Harness d'un appareil déjà installé
    pub fn with_identity(token: &str, language: &str) -> Self {
        let mut harness = Self::new();
        harness.store = MemoryStore::with_entries([(TOKEN_KEY, token), (LANGUAGE_KEY, language)]);
        harness
    }

    pub fn identity(&self) -> IdentityStore<MemoryStore> {
        IdentityStore::new(self.store.clone())
    }

    pub fn session(&self) -> ClientSession {
        self.identity().session()
    }

    pub fn session_for(token: &str, language: &str) -> ClientSession {
        ClientSession::new(
            DeviceToken::new(token),
            LanguageCode::parse(language).unwrap_or_default(),
        )
    }

    pub fn registrar(&self) -> Registrar {
        Registrar::new(Arc::new(self.service.clone()))
    }

    pub fn poller(&self) -> AlertPoller {
        AlertPoller::new(
            Arc::new(self.service.clone()),
            self.registrar(),
            Arc::new(self.display.clone()),
        )
    }

    pub fn runtime(&self, schedule: PollSchedule) -> ClientRuntime<MemoryStore> {
        ClientRuntime::new(
            self.identity(),
            Arc::new(self.service.clone()),
            Arc::new(self.display.clone()),
            schedule,
        )
    }

    /// Lance le runtime dans une tâche; le sender pilote les commandes
    pub fn spawn_runtime(&self, schedule: PollSchedule) -> (mpsc::Sender<Command>, JoinHandle<ClientSession>) {
        let (tx, rx) = mpsc::channel(8);
        let runtime = self.runtime(schedule);
        (tx, tokio::spawn(runtime.run(rx)))
    }

    /// Langue persistée dans le store
    pub fn persisted_language(&self) -> Option<String> {
        self.store.get(LANGUAGE_KEY)
    }

    /// Attend qu'un endpoint ait reçu au moins `count` appels
    pub async fn wait_for_calls(&self, endpoint: Endpoint, count: usize, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if self.service.count(endpoint) >= count {
                log::info!("✅ {:?} reached {} calls", endpoint, count);
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        anyhow::bail!(
            "Timeout waiting for {} calls on {:?}, got {}",
            count,
            endpoint,
            self.service.count(endpoint)
        );
    }

    /// Attend que l'écran ait reçu au moins `count` rendus
    pub async fn wait_for_renders(&self, count: usize, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if self.display.render_count() >= count {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        anyhow::bail!("Timeout waiting for {} renders, got {}", count, self.display.render_count());
    }

    /// Attend qu'une page statique soit affichée
    pub async fn wait_for_page(&self, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if !self.display.pages().is_empty() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        anyhow::bail!("Timeout waiting for a static page");
    }

    /// Assert qu'une inscription avec exactement ce corps JSON a été envoyée
    pub fn assert_registration_sent(&self, expected_body: &Value) -> Result<()> {
        for request in self.service.registrations() {
            if serde_json::to_value(&request)? == *expected_body {
                log::info!("✅ Found expected registration");
                return Ok(());
            }
        }

        anyhow::bail!("Expected registration not found: {}", expected_body);
    }

    /// Stats sur les appels collectés
    pub fn get_stats(&self) -> TestStats {
        let mut endpoint_counts = HashMap::new();
        let calls = self.service.calls();
        for call in &calls {
            *endpoint_counts.entry(call.endpoint()).or_insert(0) += 1;
        }

        TestStats {
            total_calls: calls.len(),
            endpoint_counts,
            renders: self.display.render_count(),
        }
    }

    /// Reset le harness pour un nouveau scénario
    pub fn reset(&mut self) {
        self.service.clear();
        self.display.clear();
        log::info!("🧹 Test harness reset");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestStats {
    pub total_calls: usize,
    pub endpoint_counts: HashMap<Endpoint, usize>,
    pub renders: usize,
}

impl TestStats {
    pub fn print(&self) {
        println!("📊 Test Statistics:");
        println!("  Total calls: {}", self.total_calls);
        for (endpoint, count) in &self.endpoint_counts {
            println!("    {:?}: {} calls", endpoint, count);
        }
        println!("  Renders: {}", self.renders);
    }
}
