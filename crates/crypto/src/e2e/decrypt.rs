//! Standort-Entschluesselung
//!
//! Jeder Fehlschlag (unbekannte Version, kaputte Kodierung, falscher
//! Schluessel, Manipulation) wird als [`Entschluesselt::Fehlgeschlagen`]
//! gemeldet und nie als Panic oder propagierter Fehler.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use draugar_protocol::{EncryptedPayload, LocationRecord};

use crate::e2e::version::PayloadVersion;
use crate::types::{b64_dekodieren, Entschluesselt, Fehlschlag, GroupKey};

/// Entschluesselt einen Standort
pub fn standort_entschluesseln(
    payload: &EncryptedPayload,
    key: &GroupKey,
) -> Entschluesselt<LocationRecord> {
    match payload_bytes_entschluesseln(payload, key) {
        Entschluesselt::Erfolg(klartext) => match serde_json::from_slice(&klartext) {
            Ok(record) => Entschluesselt::Erfolg(record),
            Err(_) => Entschluesselt::Fehlgeschlagen(Fehlschlag::UngueltigerKlartext),
        },
        Entschluesselt::Fehlgeschlagen(f) => Entschluesselt::Fehlgeschlagen(f),
    }
}

/// Entschluesselt einen Payload zu Rohbytes
///
/// Die Version wird vor jeder Dekodierung geprueft.
pub fn payload_bytes_entschluesseln(
    payload: &EncryptedPayload,
    key: &GroupKey,
) -> Entschluesselt<Vec<u8>> {
    let Some(version) = PayloadVersion::aus_nummer(payload.v) else {
        return Entschluesselt::Fehlgeschlagen(Fehlschlag::UnbekannteVersion(payload.v));
    };

    let (Ok(nonce), Ok(ciphertext)) = (b64_dekodieren(&payload.n), b64_dekodieren(&payload.c))
    else {
        return Entschluesselt::Fehlgeschlagen(Fehlschlag::UngueltigeKodierung);
    };
    if nonce.len() != version.nonce_laenge() {
        return Entschluesselt::Fehlgeschlagen(Fehlschlag::UngueltigeKodierung);
    }

    let ergebnis = match version {
        PayloadVersion::V1 => decrypt_xchacha20(&ciphertext, key, &nonce),
    };
    match ergebnis {
        Some(klartext) => Entschluesselt::Erfolg(klartext),
        None => Entschluesselt::Fehlgeschlagen(Fehlschlag::Authentifizierung),
    }
}

fn decrypt_xchacha20(ciphertext: &[u8], key: &GroupKey, nonce: &[u8]) -> Option<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher.decrypt(XNonce::from_slice(nonce), ciphertext).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
