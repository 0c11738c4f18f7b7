//! Verschluesselte Standort-Nutzlast und ihr Klartext

use serde::{Deserialize, Serialize};

/// Draht-Darstellung eines verschluesselten Standorts: `{ v, n, c }`
///
/// `v` bleibt eine rohe Zahl, damit auch unbekannte Versionen sauber
/// deserialisiert und erst vom Codec abgelehnt werden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Formatversion (bestimmt AEAD und Nonce-Laenge)
    pub v: u32,
    /// Nonce (URL-sicheres Base64)
    pub n: String,
    /// Ciphertext inkl. Auth-Tag (URL-sicheres Base64)
    pub c: String,
}

/// Ein einzelner Standort-Messpunkt im Klartext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Breitengrad in Grad
    pub lat: f64,
    /// Laengengrad in Grad
    pub lon: f64,
    /// Genauigkeit in Metern
    pub accuracy: f64,
    /// Aufnahmezeitpunkt (Unix-Millisekunden)
    pub ts: i64,
}
