//! Signiertes Identitaets-Token
//!
//! ```text
//! base64url(JSON {userId, name, iat, exp}) "." base64url(HMAC-SHA256)
//! ```
//!
//! Beide Teile ohne Padding. Die Signatur deckt den kodierten Payload ab,
//! nicht das JSON selbst; so ist die Pruefung unabhaengig von der
//! Feldreihenfolge.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use draugar_core::MemberId;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Inhalt eines Identitaets-Tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityToken {
    #[serde(rename = "userId")]
    pub user_id: MemberId,
    /// Anzeigename
    pub name: String,
    /// Ausgestellt (Sekunden seit Epoch)
    pub iat: i64,
    /// Ablauf (Sekunden seit Epoch)
    pub exp: i64,
}

impl IdentityToken {
    pub fn ist_abgelaufen(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt.timestamp() >= self.exp
    }
}

/// Grund einer Ablehnung; wird nur geloggt, nie nach aussen gegeben
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ablehnung {
    Format,
    Kodierung,
    Signatur,
    Inhalt,
}

/// HMAC-Signierer mit dem Deployment-Secret
pub(crate) struct TokenSigner {
    secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    pub(crate) fn neu(secret: Vec<u8>) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    fn mac(&self) -> AuthResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::intern(e.to_string()))
    }

    pub(crate) fn signieren(&self, claims: &IdentityToken) -> AuthResult<String> {
        let json = serde_json::to_vec(claims).map_err(|e| AuthError::intern(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signatur = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signatur}"))
    }

    /// Prueft Signatur und dekodiert den Inhalt (ohne Ablaufpruefung)
    pub(crate) fn pruefen(&self, token: &str) -> Result<IdentityToken, Ablehnung> {
        let (payload, signatur) = token.split_once('.').ok_or(Ablehnung::Format)?;
        if payload.is_empty() || signatur.contains('.') {
            return Err(Ablehnung::Format);
        }

        let signatur = URL_SAFE_NO_PAD
            .decode(signatur)
            .map_err(|_| Ablehnung::Kodierung)?;

        let mut mac = self.mac().map_err(|_| Ablehnung::Signatur)?;
        mac.update(payload.as_bytes());
        // verify_slice vergleicht in konstanter Zeit
        mac.verify_slice(&signatur)
            .map_err(|_| Ablehnung::Signatur)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| Ablehnung::Kodierung)?;
        serde_json::from_slice(&json).map_err(|_| Ablehnung::Inhalt)
    }
}
