//! E2E Verschluesselung (End-to-End)
//!
//! Geraet <-> Geraet Verschluesselung. Der Relay-Server leitet Standort-
//! Payloads blind weiter und kann sie nicht entschluesseln.
//!
//! ## Ablauf
//! 1. Beim ersten Registrieren erzeugt der Server Gruppen-Schluessel und
//!    Wrapping-Schluesselpaar
//! 2. Jedes Geraet erzeugt ein eigenes X25519-Schluesselpaar
//! 3. Der Server wickelt den Gruppen-Schluessel fuer das Geraet ein
//!    (X25519 + HKDF + XChaCha20-Poly1305)
//! 4. Standorte werden mit dem Gruppen-Schluessel verschluesselt
//!    (XChaCha20-Poly1305, Formatversion 1)

pub mod decrypt;
pub mod encrypt;
pub mod group_key;
pub mod key_exchange;
pub mod version;
pub mod wrap;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

pub use decrypt::{payload_bytes_entschluesseln, standort_entschluesseln};
pub use encrypt::{payload_bytes_verschluesseln, standort_verschluesseln};
pub use group_key::gruppen_schluessel_erzeugen;
pub use key_exchange::{hkdf_derive, schluesselpaar_erzeugen, wrap_schluessel_ableiten};
pub use version::PayloadVersion;
pub use wrap::{gruppen_schluessel_auswickeln, gruppen_schluessel_einwickeln};

/// Fuellt einen Puffer aus der Zufallsquelle des Betriebssystems
pub(crate) fn zufall_fuellen(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Zufallsquelle(e.to_string()))
}
