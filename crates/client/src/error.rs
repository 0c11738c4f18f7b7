//! Fehlertypen der Geraete-Seite

use draugar_core::DraugarError;
use draugar_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Secret-Store-Fehler: {0}")]
    Speicher(#[from] std::io::Error),

    #[error("Ungueltiger Schluesselname: {0}")]
    UngueltigerSchluesselName(String),

    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server antwortete {status}: {meldung}")]
    Server { status: u16, meldung: String },

    #[error("Nicht authentifiziert")]
    NichtAuthentifiziert,

    #[error("Kryptografiefehler: {0}")]
    Krypto(#[from] CryptoError),

    #[error("Kein Schluesselpaar im Speicher")]
    KeinSchluesselpaar,

    #[error("Verbindungsfehler: {0}")]
    Verbindung(String),

    #[error("Serialisierungsfehler: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn verbindung(msg: impl Into<String>) -> Self {
        Self::Verbindung(msg.into())
    }
}

impl From<ClientError> for DraugarError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NichtAuthentifiziert => DraugarError::NichtAuthentifiziert,
            ClientError::Server { status: 400, meldung } => DraugarError::Validierung(meldung),
            ClientError::Server { status: 401, .. } => DraugarError::NichtAuthentifiziert,
            ClientError::Server { status: 404, meldung } => DraugarError::NichtGefunden(meldung),
            ClientError::UngueltigerSchluesselName(_) => DraugarError::validierung(e.to_string()),
            ClientError::KeinSchluesselpaar => DraugarError::nicht_gefunden(e.to_string()),
            ClientError::Krypto(inner) => inner.into(),
            ClientError::Speicher(_)
            | ClientError::Http(_)
            | ClientError::Server { .. }
            | ClientError::Verbindung(_)
            | ClientError::Json(_) => DraugarError::intern(e.to_string()),
        }
    }
}
