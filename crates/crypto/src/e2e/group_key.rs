//! Gruppen-Schluessel
//!
//! Genau ein symmetrischer Schluessel pro Deployment. Er wird beim ersten
//! Registrieren erzeugt und verlaesst den Server nur eingewickelt.

use crate::e2e::zufall_fuellen;
use crate::error::CryptoResult;
use crate::types::{GroupKey, GROUP_KEY_LEN};

/// Erzeugt einen gleichverteilt zufaelligen 32-Byte-Gruppen-Schluessel
pub fn gruppen_schluessel_erzeugen() -> CryptoResult<GroupKey> {
    let mut key_bytes = vec![0u8; GROUP_KEY_LEN];
    zufall_fuellen(&mut key_bytes)?;
    GroupKey::aus_bytes(key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schluessel_hat_32_bytes() {
        let key = gruppen_schluessel_erzeugen().unwrap();
        assert_eq!(key.as_bytes().len(), 32);
    }

    #[test]
    fn zwei_schluessel_sind_verschieden() {
        let a = gruppen_schluessel_erzeugen().unwrap();
        let b = gruppen_schluessel_erzeugen().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn schluessel_ist_nicht_null() {
        let key = gruppen_schluessel_erzeugen().unwrap();
        assert!(key.as_bytes().iter().any(|b| *b != 0));
    }
}
