//! Nachrichten der HTTP-API (`register-key`, `group-key`, `auth/me`)

use draugar_core::types::MemberId;
use serde::{Deserialize, Serialize};

/// Antwort von `GET /api/auth/me`: Identitaet laut Token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AktuellesMitglied {
    pub id: MemberId,
    pub name: String,
}

/// Anfrage-Body fuer `POST /api/crypto/register-key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeyRequest {
    /// Oeffentlicher X25519-Schluessel des Geraets (URL-sicheres Base64)
    pub public_key: String,
}

/// Fuer ein Mitglied eingewickelter Gruppen-Schluessel
///
/// Wird bei jeder Registrierung bzw. jedem Abruf frisch erzeugt und nie
/// als eigene Zeile gespeichert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedGroupKeyPackage {
    /// Base64(nonce ‖ ciphertext)
    pub package: String,
    /// Oeffentlicher Wrapping-Schluessel der Gruppe (Base64)
    pub wrapping_public_key: String,
    /// Version des eingewickelten Gruppen-Schluessels
    pub key_version: u32,
}
