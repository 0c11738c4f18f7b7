//! Einwickeln des Gruppen-Schluessels fuer ein einzelnes Mitglied
//!
//! ## Format
//! ```text
//! [nonce(24)] [ciphertext(32) + auth_tag(16)]
//! ```
//!
//! Nur der Inhaber des passenden Mitglieds-Secrets kann das Paket oeffnen.
//! Gelingt das Oeffnen, ist zugleich belegt, dass der Absender das
//! Server-Secret besitzt.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use crate::e2e::key_exchange::wrap_schluessel_ableiten;
use crate::e2e::zufall_fuellen;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{GroupKey, PublicKey, SecretKey, GROUP_KEY_LEN, TAG_LEN, XNONCE_LEN};

/// Laenge eines vollstaendigen Pakets
pub const PAKET_LAENGE: usize = XNONCE_LEN + GROUP_KEY_LEN + TAG_LEN;

/// Wickelt den Gruppen-Schluessel fuer ein Mitglied ein
///
/// Jeder Aufruf verwendet eine frische Nonce; zwei Pakete fuer dasselbe
/// Mitglied sind daher nie byte-gleich.
pub fn gruppen_schluessel_einwickeln(
    gruppen_schluessel: &GroupKey,
    mitglied_public: &PublicKey,
    server_secret: &SecretKey,
) -> CryptoResult<Vec<u8>> {
    let wrapping_key = wrap_schluessel_ableiten(server_secret, mitglied_public)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(wrapping_key.as_bytes()));

    let mut nonce_bytes = [0u8; XNONCE_LEN];
    zufall_fuellen(&mut nonce_bytes)?;

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce_bytes), gruppen_schluessel.as_bytes())
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut paket = Vec::with_capacity(PAKET_LAENGE);
    paket.extend_from_slice(&nonce_bytes);
    paket.extend_from_slice(&ciphertext);
    Ok(paket)
}

/// Oeffnet ein Paket mit dem eigenen Secret und dem Wrapping-Public-Key der Gruppe
pub fn gruppen_schluessel_auswickeln(
    paket: &[u8],
    mitglied_secret: &SecretKey,
    server_public: &PublicKey,
) -> CryptoResult<GroupKey> {
    if paket.len() != PAKET_LAENGE {
        return Err(CryptoError::UngueltigeDaten(format!(
            "Paket hat {} Bytes, erwartet {PAKET_LAENGE}",
            paket.len()
        )));
    }
    let (nonce_bytes, ciphertext) = paket.split_at(XNONCE_LEN);

    let wrapping_key = wrap_schluessel_ableiten(mitglied_secret, server_public)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(wrapping_key.as_bytes()));

    let klartext = cipher
        .decrypt(XNonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| CryptoError::Entschluesselung)?;

    GroupKey::aus_bytes(klartext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
