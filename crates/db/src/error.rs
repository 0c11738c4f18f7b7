//! Fehlertypen fuer das Datenbank-Crate

use draugar_core::DraugarError;
use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for DraugarError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NichtGefunden(msg) => DraugarError::NichtGefunden(msg),
            DbError::Intern(msg) => DraugarError::Intern(msg),
        }
    }
}
