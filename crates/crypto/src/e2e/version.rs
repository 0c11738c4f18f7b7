//! Formatversionen verschluesselter Standort-Payloads
//!
//! Die Version im Feld `v` legt AEAD und Nonce-Laenge fest. Der Decoder
//! waehlt das Verfahren anhand von `v` und nimmt nie die neueste Version an.

use crate::types::XNONCE_LEN;

/// Bekannte Payload-Formate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    /// XChaCha20-Poly1305, 24-Byte-Nonce, keine AAD, JSON-Klartext
    V1,
}

impl PayloadVersion {
    /// Version, mit der neue Payloads geschrieben werden
    pub const AKTUELL: Self = Self::V1;

    /// Bildet die Nummer vom Draht auf ein bekanntes Format ab
    pub fn aus_nummer(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::V1),
            _ => None,
        }
    }

    pub fn nummer(self) -> u32 {
        match self {
            Self::V1 => 1,
        }
    }

    pub fn nonce_laenge(self) -> usize {
        match self {
            Self::V1 => XNONCE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nummer_roundtrip() {
        assert_eq!(PayloadVersion::aus_nummer(1), Some(PayloadVersion::V1));
        assert_eq!(PayloadVersion::AKTUELL.nummer(), 1);
    }

    #[test]
    fn unbekannte_nummern() {
        for v in [0, 2, 99, u32::MAX] {
            assert_eq!(PayloadVersion::aus_nummer(v), None);
        }
    }

    #[test]
    fn v1_nonce_ist_24_bytes() {
        assert_eq!(PayloadVersion::V1.nonce_laenge(), 24);
    }
}
