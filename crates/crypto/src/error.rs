//! Fehlertypen fuer das Kryptografie-Subsystem

use draugar_core::DraugarError;
use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Zufallsquelle nicht verfuegbar: {0}")]
    Zufallsquelle(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen")]
    Entschluesselung,

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltiger oeffentlicher Schluessel")]
    UngueltigerPublicKey,

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

impl From<CryptoError> for DraugarError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::UngueltigerPublicKey => {
                DraugarError::validierung("Invalid public key format")
            }
            CryptoError::Zufallsquelle(_) | CryptoError::KeyDerivation(_) => {
                DraugarError::intern(e.to_string())
            }
            other => DraugarError::Krypto(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draugar_core::FehlerArt;

    #[test]
    fn public_key_fehler_ist_validierung() {
        let e: DraugarError = CryptoError::UngueltigerPublicKey.into();
        assert_eq!(e.art(), FehlerArt::Validierung);
        assert!(e.to_string().contains("Invalid public key format"));
    }

    #[test]
    fn entschluesselung_ist_krypto() {
        let e: DraugarError = CryptoError::Entschluesselung.into();
        assert_eq!(e.art(), FehlerArt::Krypto);
    }
}
