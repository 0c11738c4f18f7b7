//! Fehlertypen der HTTP-Schnittstelle
//!
//! Jeder Fehler wird als `{"error": {"code": <status>, "message": "..."}}`
//! beantwortet. Interne Details landen nur im Log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use draugar_core::{DraugarError, FehlerArt};
use draugar_keys::KeyError;
use serde_json::json;
use thiserror::Error;

/// Einzige Meldung fuer fehlende oder ungueltige Tokens
pub const UNAUTHORIZED: &str = "Unauthorized";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    NichtAuthentifiziert,

    /// Fehlerhafter Request-Body
    #[error("{0}")]
    UngueltigerBody(String),

    #[error(transparent)]
    Kern(#[from] DraugarError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<KeyError> for ApiError {
    fn from(e: KeyError) -> Self {
        Self::Kern(e.into())
    }
}

impl From<ApiError> for DraugarError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NichtAuthentifiziert => DraugarError::NichtAuthentifiziert,
            ApiError::UngueltigerBody(msg) => DraugarError::Validierung(msg),
            ApiError::Kern(inner) => inner,
        }
    }
}

impl ApiError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NichtAuthentifiziert => StatusCode::UNAUTHORIZED,
            Self::UngueltigerBody(_) => StatusCode::BAD_REQUEST,
            Self::Kern(e) => match e.art() {
                FehlerArt::Validierung => StatusCode::BAD_REQUEST,
                FehlerArt::NichtAuthentifiziert => StatusCode::UNAUTHORIZED,
                FehlerArt::NichtGefunden => StatusCode::NOT_FOUND,
                FehlerArt::Krypto | FehlerArt::Intern => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Meldung, die der Client sehen darf
    fn oeffentliche_meldung(&self) -> String {
        match self {
            Self::NichtAuthentifiziert => UNAUTHORIZED.to_string(),
            Self::UngueltigerBody(msg) => msg.clone(),
            Self::Kern(e) => match e {
                DraugarError::Validierung(msg) | DraugarError::NichtGefunden(msg) => msg.clone(),
                DraugarError::NichtAuthentifiziert => UNAUTHORIZED.to_string(),
                DraugarError::Krypto(_) | DraugarError::Intern(_) | DraugarError::Anyhow(_) => {
                    "Internal server error".to_string()
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(fehler = %self, "Interner Fehler bei API-Anfrage");
        } else {
            tracing::debug!(status = status.as_u16(), fehler = %self, "API-Anfrage abgelehnt");
        }

        (
            status,
            Json(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": self.oeffentliche_meldung(),
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_zuordnung() {
        let faelle = [
            (ApiError::NichtAuthentifiziert, 401),
            (ApiError::UngueltigerBody("x".into()), 400),
            (KeyError::UngueltigerPublicKey.into(), 400),
            (KeyError::KeinSchluessel.into(), 404),
            (KeyError::KeineGruppe.into(), 404),
            (ApiError::Kern(DraugarError::Krypto("x".into())), 500),
            (ApiError::Kern(DraugarError::intern("x")), 500),
        ];
        for (fehler, status) in faelle {
            assert_eq!(fehler.http_status().as_u16(), status, "{fehler:?}");
        }
    }

    #[test]
    fn interne_details_bleiben_verborgen() {
        let e = ApiError::Kern(DraugarError::intern("sqlite: disk I/O error"));
        assert_eq!(e.oeffentliche_meldung(), "Internal server error");
    }

    #[test]
    fn validierungsmeldung_ohne_praefix() {
        let e: ApiError = KeyError::UngueltigerPublicKey.into();
        assert_eq!(e.oeffentliche_meldung(), "Invalid public key format");
    }
}
