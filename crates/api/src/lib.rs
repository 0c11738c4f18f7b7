//! draugar-api – HTTP-Bindung der Schluessel-Operationen
//!
//! | Methode | Pfad                         | Antwort                         |
//! |---------|------------------------------|---------------------------------|
//! | POST    | `/api/crypto/register-key`   | `WrappedGroupKeyPackage`        |
//! | GET     | `/api/crypto/group-key`      | `WrappedGroupKeyPackage` / 404  |
//! | GET     | `/api/health`                | Health-JSON                     |
//!
//! Alle Krypto-Endpunkte verlangen `Authorization: Bearer <token>`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

use draugar_auth::AuthService;
use draugar_keys::KeyService;
use draugar_observability::DraugarMetrics;

pub use auth::AuthMitglied;
pub use error::{ApiError, ApiResult};
pub use routes::api_router;
pub use server::{RestServer, RestServerKonfig};

/// Axum-State fuer die Schluessel-API
#[derive(Clone)]
pub struct ApiState {
    pub key_service: KeyService,
    pub auth_service: AuthService,
    pub metriken: Option<DraugarMetrics>,
}

impl ApiState {
    pub fn neu(
        key_service: KeyService,
        auth_service: AuthService,
        metriken: Option<DraugarMetrics>,
    ) -> Self {
        Self {
            key_service,
            auth_service,
            metriken,
        }
    }

    /// Zaehlt einen ausgegebenen Schluessel (`register` oder `fetch`)
    pub(crate) fn ausgabe_zaehlen(&self, operation: &str) {
        if let Some(m) = &self.metriken {
            m.group_keys_issued_total
                .with_label_values(&[operation])
                .inc();
        }
    }
}
