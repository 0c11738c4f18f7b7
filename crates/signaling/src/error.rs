//! Fehlertypen fuer den Signaling-Service

use draugar_auth::AuthError;
use draugar_core::DraugarError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Authentifizierungsfehler
    #[error("Authentifizierungsfehler: {0}")]
    Auth(#[from] AuthError),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,

    /// Protokollfehler (ungueltiges Frame, falscher Zustand)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Server ist voll
    #[error("Server ist voll")]
    ServerVoll,

    /// Timeout (Handshake, Keepalive)
    #[error("Timeout")]
    Timeout,
}

impl SignalingError {
    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

impl From<SignalingError> for DraugarError {
    fn from(e: SignalingError) -> Self {
        match e {
            SignalingError::Auth(inner) => inner.into(),
            // Am Handshake ist jeder Protokoll- oder Zeitfehler eine Ablehnung
            SignalingError::Protokoll(_) | SignalingError::Timeout => {
                DraugarError::NichtAuthentifiziert
            }
            SignalingError::Io(_)
            | SignalingError::VerbindungGetrennt
            | SignalingError::ServerVoll => DraugarError::intern(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draugar_core::FehlerArt;

    #[test]
    fn handshake_fehler_sind_nicht_authentifiziert() {
        for e in [
            SignalingError::Auth(AuthError::NichtAuthentifiziert),
            SignalingError::protokoll("kein Handshake"),
            SignalingError::Timeout,
        ] {
            assert_eq!(DraugarError::from(e).art(), FehlerArt::NichtAuthentifiziert);
        }
    }

    #[test]
    fn io_fehler_ist_intern() {
        let e = SignalingError::Io(std::io::Error::other("kaputt"));
        assert_eq!(DraugarError::from(e).art(), FehlerArt::Intern);
    }
}
