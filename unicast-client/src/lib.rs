//! Unicast alert client - multilingual emergency alerts for a single device
//!
//! This crate provides the client side of the Unicast alert service:
//! - Durable device identity (token + language preference)
//! - Registration and self-healing re-registration on "device not found"
//! - Periodic alert polling with total-replacement rendering
//! - Batch translation of static pages

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod poller;
pub mod preferences;
pub mod registration;
pub mod remote;
pub mod render;
pub mod runtime;
pub mod session;
pub mod translator;

pub use crate::{
    error::{BestEffort, FailureKind, RemoteError},
    identity::{FileStore, IdentityStore, KeyValueStore, MemoryStore},
    models::{AlertRecord, RegistrationRequest, Severity, TranslationRequest, TranslationResponse},
    poller::{AlertPoller, PollOutcome},
    remote::{AlertService, HttpAlertService},
    render::{AlertDisplay, AlertView},
    runtime::{ClientRuntime, Command},
    session::{ClientSession, DeviceToken, LanguageCode},
};
