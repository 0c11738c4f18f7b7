//! Standort-Verschluesselung
//!
//! Verschluesselt einen [`LocationRecord`] mit dem Gruppen-Schluessel.
//!
//! ## Format (Version 1)
//! ```text
//! v = 1
//! n = base64(nonce(24))          frisch aus der OS-Zufallsquelle
//! c = base64(ciphertext + tag(16))
//! ```
//! Der Klartext ist das JSON des Datensatzes; es gibt keine AAD.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use draugar_protocol::{EncryptedPayload, LocationRecord};

use crate::e2e::version::PayloadVersion;
use crate::e2e::zufall_fuellen;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{b64_kodieren, GroupKey};

/// Verschluesselt einen Standort im angegebenen Format
pub fn standort_verschluesseln(
    record: &LocationRecord,
    key: &GroupKey,
    version: PayloadVersion,
) -> CryptoResult<EncryptedPayload> {
    let klartext = serde_json::to_vec(record)?;
    payload_bytes_verschluesseln(&klartext, key, version)
}

/// Verschluesselt beliebige Bytes als [`EncryptedPayload`]
pub fn payload_bytes_verschluesseln(
    klartext: &[u8],
    key: &GroupKey,
    version: PayloadVersion,
) -> CryptoResult<EncryptedPayload> {
    let mut nonce = vec![0u8; version.nonce_laenge()];
    zufall_fuellen(&mut nonce)?;

    let ciphertext = match version {
        PayloadVersion::V1 => encrypt_xchacha20(klartext, key, &nonce)?,
    };

    Ok(EncryptedPayload {
        v: version.nummer(),
        n: b64_kodieren(&nonce),
        c: b64_kodieren(&ciphertext),
    })
}

fn encrypt_xchacha20(klartext: &[u8], key: &GroupKey, nonce: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .encrypt(XNonce::from_slice(nonce), klartext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2e::group_key::gruppen_schluessel_erzeugen;
    use crate::types::{b64_dekodieren, TAG_LEN, XNONCE_LEN};
    use std::collections::HashSet;

    fn record() -> LocationRecord {
        LocationRecord {
            lat: 64.1,
            lon: -21.9,
            accuracy: 5.0,
            ts: 1_700_000_000_000,
        }
    }

    #[test]
    fn payload_traegt_version_und_laengen() {
        let key = gruppen_schluessel_erzeugen().unwrap();
        let payload = standort_verschluesseln(&record(), &key, PayloadVersion::V1).unwrap();

        assert_eq!(payload.v, 1);
        assert_eq!(b64_dekodieren(&payload.n).unwrap().len(), XNONCE_LEN);

        let klartext_len = serde_json::to_vec(&record()).unwrap().len();
        assert_eq!(
            b64_dekodieren(&payload.c).unwrap().len(),
            klartext_len + TAG_LEN
        );
    }

    #[test]
    fn ciphertext_enthaelt_keine_koordinaten() {
        let key = gruppen_schluessel_erzeugen().unwrap();
        let payload = standort_verschluesseln(&record(), &key, PayloadVersion::V1).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("64.1"));
        assert!(!json.contains("lat"));
    }

    #[test]
    fn nonces_wiederholen_sich_nicht() {
        let key = gruppen_schluessel_erzeugen().unwrap();
        let mut gesehen = HashSet::new();
        for _ in 0..10_000 {
            let payload = payload_bytes_verschluesseln(b"x", &key, PayloadVersion::V1).unwrap();
            assert!(gesehen.insert(payload.n), "Nonce doppelt vergeben");
        }
    }
}
