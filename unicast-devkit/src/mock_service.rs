/*!
Mock du service d'alertes distant pour tests sans réseau

Enregistre tous les appels reçus (register, alerts, translate) et renvoie des
réponses scriptées. Quand aucune réponse n'est scriptée, une réponse par
défaut réaliste est utilisée.
*/

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use unicast_client::{
    AlertRecord, AlertService, AlertView, DeviceToken, RegistrationRequest, RemoteError,
    TranslationRequest, TranslationResponse,
};
use unicast_client::render::AlertDisplay;
use unicast_client::translator::StaticPage;

/// Un appel reçu par le mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Register(RegistrationRequest),
    Alerts(DeviceToken),
    Translate(TranslationRequest),
}

/// Endpoint ciblé, pour filtrer les appels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Register,
    Alerts,
    Translate,
}

impl RecordedCall {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            RecordedCall::Register(_) => Endpoint::Register,
            RecordedCall::Alerts(_) => Endpoint::Alerts,
            RecordedCall::Translate(_) => Endpoint::Translate,
        }
    }
}

/// Réponse scriptée
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    /// Statut HTTP non-2xx (404 = appareil inconnu)
    Status(u16),
    /// Corps JSON invalide
    Malformed,
    /// Aucune réponse (réseau)
    Unreachable,
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, RemoteError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Status(status) => Err(RemoteError::from_status(status)),
            Reply::Malformed => Err(RemoteError::Parse(
                serde_json::from_str::<Value>("{\"truncated\":").unwrap_err(),
            )),
            Reply::Unreachable => Err(RemoteError::Transport("connection refused (mock)".to_string())),
        }
    }
}

#[derive(Default)]
struct Script {
    register: VecDeque<Reply<Value>>,
    alerts: VecDeque<Reply<Vec<AlertRecord>>>,
    translate: VecDeque<Reply<TranslationResponse>>,
    default_alerts: Vec<AlertRecord>,
    alerts_delay: Option<Duration>,
}

/// Mock qui implémente `AlertService`
#[derive(Clone, Default)]
pub struct MockAlertService {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    script: Arc<Mutex<Script>>,
}

impl MockAlertService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prochaine réponse de `POST /register/`
    pub fn push_register(&self, reply: Reply<Value>) -> &Self {
        self.script.lock().unwrap().register.push_back(reply);
        self
    }

    /// Prochaine réponse de `GET /alerts/me/{token}`
    pub fn push_alerts(&self, reply: Reply<Vec<AlertRecord>>) -> &Self {
        self.script.lock().unwrap().alerts.push_back(reply);
        self
    }

    /// Prochaine réponse de `POST /translate`
    pub fn push_translate(&self, reply: Reply<TranslationResponse>) -> &Self {
        self.script.lock().unwrap().translate.push_back(reply);
        self
    }

    /// Alertes renvoyées quand la file est vide
    pub fn set_default_alerts(&self, alerts: Vec<AlertRecord>) {
        self.script.lock().unwrap().default_alerts = alerts;
    }

    /// Ralentit chaque fetch d'alertes (tests de chevauchement)
    pub fn set_alerts_delay(&self, delay: Duration) {
        self.script.lock().unwrap().alerts_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint() == endpoint)
            .collect()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.calls_to(endpoint).len()
    }

    pub fn registrations(&self) -> Vec<RegistrationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Register(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn alert_fetches(&self) -> Vec<DeviceToken> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Alerts(token) => Some(token),
                _ => None,
            })
            .collect()
    }

    /// Reset des appels enregistrés (le script est conservé)
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: RecordedCall) {
        log::info!("📤 [MOCK] {:?}", call);
        self.calls.lock().unwrap().push(call);
    }
}

/// Traduction factice, même format que le service de démo
pub fn mock_translation(text: &str, target_lang: &str) -> String {
    format!("[{} MOCK TRANSLATION] {}", target_lang.to_uppercase(), text)
}

#[async_trait]
impl AlertService for MockAlertService {
    async fn register(&self, request: &RegistrationRequest) -> Result<Value, RemoteError> {
        self.record(RecordedCall::Register(request.clone()));
        let reply = self.script.lock().unwrap().register.pop_front();
        reply
            .unwrap_or_else(|| {
                Reply::Ok(json!({
                    "device_token": request.device_token,
                    "language": request.language,
                    "latitude": request.latitude,
                    "longitude": request.longitude,
                    "id": 1
                }))
            })
            .into_result()
    }

    async fn alerts_for(&self, token: &DeviceToken) -> Result<Vec<AlertRecord>, RemoteError> {
        self.record(RecordedCall::Alerts(token.clone()));
        let (reply, delay) = {
            let mut script = self.script.lock().unwrap();
            let reply = script
                .alerts
                .pop_front()
                .unwrap_or_else(|| Reply::Ok(script.default_alerts.clone()));
            (reply, script.alerts_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }

    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, RemoteError> {
        self.record(RecordedCall::Translate(request.clone()));
        let reply = self.script.lock().unwrap().translate.pop_front();
        reply
            .unwrap_or_else(|| {
                Reply::Ok(TranslationResponse {
                    translations: request
                        .texts
                        .iter()
                        .map(|text| mock_translation(text, request.target_lang.as_str()))
                        .collect(),
                })
            })
            .into_result()
    }
}

/// Ce qui a été affiché à l'écran
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Alerts(AlertView),
    Page(StaticPage),
}

/// Écran en mémoire : enregistre chaque rendu
#[derive(Clone, Default)]
pub struct MemoryDisplay {
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> Vec<AlertView> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Alerts(view) => Some(view.clone()),
                Shown::Page(_) => None,
            })
            .collect()
    }

    pub fn pages(&self) -> Vec<StaticPage> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Page(page) => Some(page.clone()),
                Shown::Alerts(_) => None,
            })
            .collect()
    }

    /// Contenu actuel de la zone d'alertes
    pub fn current(&self) -> Option<AlertView> {
        self.views().pop()
    }

    pub fn render_count(&self) -> usize {
        self.views().len()
    }

    pub fn clear(&self) {
        self.shown.lock().unwrap().clear();
    }
}

impl AlertDisplay for MemoryDisplay {
    fn show(&self, view: &AlertView) {
        log::info!("🖥️ [MOCK] Rendered {:?}", view.placeholder().unwrap_or("alert cards"));
        self.shown.lock().unwrap().push(Shown::Alerts(view.clone()));
    }

    fn show_page(&self, page: &StaticPage) {
        log::info!("📄 [MOCK] Page shown: {}", page.title.text);
        self.shown.lock().unwrap().push(Shown::Page(page.clone()));
    }
}
