//! Fehlertypen fuer den Key-Service

use draugar_core::DraugarError;
use draugar_crypto::CryptoError;
use draugar_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid public key format")]
    UngueltigerPublicKey,

    #[error("Mitglied hat keinen registrierten Schluessel")]
    KeinSchluessel,

    #[error("Es existiert noch keine Gruppe")]
    KeineGruppe,

    #[error("Gespeichertes Schluesselmaterial unlesbar: {0}")]
    BeschaedigtesMaterial(String),

    #[error("Kryptografiefehler: {0}")]
    Krypto(#[from] CryptoError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),
}

pub type KeyResult<T> = Result<T, KeyError>;

impl From<KeyError> for DraugarError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::UngueltigerPublicKey => DraugarError::validierung(e.to_string()),
            KeyError::KeinSchluessel | KeyError::KeineGruppe => {
                DraugarError::nicht_gefunden(e.to_string())
            }
            KeyError::BeschaedigtesMaterial(_) => DraugarError::intern(e.to_string()),
            KeyError::Krypto(inner) => inner.into(),
            KeyError::Datenbank(inner) => inner.into(),
        }
    }
}
