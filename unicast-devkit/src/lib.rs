/*!
# Unicast DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant les tests du client d'alertes avec:
- Mock du service distant (appels enregistrés, réponses scriptées)
- Écran en mémoire pour vérifier les rendus
- Builders d'alertes et payloads JSON du service
- Serveur HTTP bouchon (axum) imitant le backend
*/

pub mod fixtures;
pub mod mock_service;
pub mod stub_server;
pub mod test_utils;

pub use fixtures::AlertBuilder;
pub use mock_service::{Endpoint, MemoryDisplay, MockAlertService, RecordedCall, Reply};
pub use stub_server::StubServer;
pub use test_utils::TestHarness;
