/*!
Serveur HTTP bouchon qui imite le service d'alertes distant

Expose les mêmes routes que le backend réel, sur 127.0.0.1 avec un port libre:
- POST /register/               : crée ou met à jour l'appareil
- GET  /alerts/me/{device_token} : 404 si l'appareil est inconnu
- POST /translate               : traduction factice, même ordre que l'entrée

Permet de tester `HttpAlertService` de bout en bout, y compris le reset du
backend (appareils oubliés) et les erreurs 5xx.
*/

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use unicast_client::{AlertRecord, RegistrationRequest, TranslationRequest, TranslationResponse};

use crate::fixtures::service_payload;
use crate::mock_service::mock_translation;

#[derive(Default)]
struct StubState {
    devices: HashMap<String, (i64, String)>,
    alerts: Vec<AlertRecord>,
    alerts_status: Option<u16>,
    registrations: Vec<RegistrationRequest>,
    alert_requests: Vec<String>,
    next_id: i64,
}

type SharedStub = Arc<Mutex<StubState>>;

/// Instance du bouchon, arrêtée quand elle est droppée
pub struct StubServer {
    addr: SocketAddr,
    state: SharedStub,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> anyhow::Result<Self> {
        let state: SharedStub = Arc::new(Mutex::new(StubState::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("❌ Stub server stopped: {}", e);
            }
        });

        log::info!("🚀 Stub alert service listening on {}", addr);
        Ok(Self { addr, state, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_alerts(&self, alerts: Vec<AlertRecord>) {
        self.state.lock().unwrap().alerts = alerts;
    }

    /// Force un statut d'erreur sur `/alerts/me/*` (`None` pour revenir à la normale)
    pub fn fail_alerts_with(&self, status: Option<u16>) {
        self.state.lock().unwrap().alerts_status = status;
    }

    /// Simule un reset du backend: tous les appareils sont oubliés
    pub fn forget_devices(&self) {
        self.state.lock().unwrap().devices.clear();
    }

    pub fn registrations(&self) -> Vec<RegistrationRequest> {
        self.state.lock().unwrap().registrations.clone()
    }

    /// Tokens tels que reçus dans le chemin des requêtes d'alertes
    pub fn alert_requests(&self) -> Vec<String> {
        self.state.lock().unwrap().alert_requests.clone()
    }

    pub fn device_language(&self, token: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .devices
            .get(token)
            .map(|(_, language)| language.clone())
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: SharedStub) -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/register/", post(register))
        .route("/alerts/me/{device_token}", get(alerts_for_device))
        .route("/translate", post(translate))
        .with_state(state)
}

async fn register(State(state): State<SharedStub>, Json(request): Json<RegistrationRequest>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.registrations.push(request.clone());

    let token = request.device_token.as_str().to_string();
    let language = request.language.as_str().to_string();
    let id = match state.devices.get(&token) {
        Some((id, _)) => *id,
        None => {
            state.next_id += 1;
            state.next_id
        }
    };
    state.devices.insert(token.clone(), (id, language.clone()));

    Json(json!({
        "id": id,
        "device_token": token,
        "language": language,
        "latitude": request.latitude,
        "longitude": request.longitude,
    }))
}

async fn alerts_for_device(
    State(state): State<SharedStub>,
    Path(device_token): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut state = state.lock().unwrap();
    state.alert_requests.push(device_token.clone());

    if let Some(status) = state.alerts_status {
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Err((code, Json(json!({ "detail": "Injected failure" }))));
    }

    let Some((_, language)) = state.devices.get(&device_token).cloned() else {
        return Err((StatusCode::NOT_FOUND, Json(json!({ "detail": "Device not found" }))));
    };

    let localized: Vec<AlertRecord> = state
        .alerts
        .iter()
        .cloned()
        .map(|mut alert| {
            alert.translated_message = if language == "en" {
                alert.message.clone()
            } else {
                mock_translation(&alert.message, &language)
            };
            alert
        })
        .collect();

    Ok(Json(service_payload(&localized)))
}

async fn translate(Json(request): Json<TranslationRequest>) -> Json<TranslationResponse> {
    let translations = request
        .texts
        .iter()
        .map(|text| mock_translation(text, request.target_lang.as_str()))
        .collect();
    Json(TranslationResponse { translations })
}
