//! Fehlertypen fuer den Auth-Service

use draugar_core::DraugarError;
use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
///
/// Jede Ablehnung eines Tokens ist `NichtAuthentifiziert`, egal ob es
/// abgelaufen, manipuliert oder kaputt ist.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Nicht authentifiziert")]
    NichtAuthentifiziert,

    #[error("Token-Secret zu kurz: mindestens {minimum} Bytes, erhalten {erhalten}")]
    SecretZuKurz { minimum: usize, erhalten: usize },

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for DraugarError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NichtAuthentifiziert => DraugarError::NichtAuthentifiziert,
            AuthError::SecretZuKurz { .. } | AuthError::Intern(_) => {
                DraugarError::intern(e.to_string())
            }
        }
    }
}
