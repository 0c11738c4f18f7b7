//! X25519-Schluesselpaare und Ableitung des Wrapping-Schluessels
//!
//! Der Wrapping-Schluessel entsteht aus einem statischen Diffie-Hellman
//! zwischen Server und Mitglied. Beide Seiten kommen zum selben Ergebnis:
//! `DH(server_secret, member_public) == DH(member_secret, server_public)`.
//! Danach wird HKDF-SHA256 ueber das Shared Secret gelegt.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::PublicKey as X25519PublicKey;

use crate::e2e::zufall_fuellen;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{PublicKey, SecretBytes, SecretKey, WrappingKeypair, X25519_KEY_LEN};

/// HKDF-Info fuer den Wrapping-Schluessel
const WRAP_INFO: &[u8] = b"draugar-key-wrap-v1";

/// Erzeugt ein frisches X25519-Schluesselpaar
///
/// Wird serverseitig fuer das Wrapping-Paar der Gruppe und geraeteseitig
/// fuer das Mitglieds-Paar verwendet.
pub fn schluesselpaar_erzeugen() -> CryptoResult<WrappingKeypair> {
    let mut secret_bytes = vec![0u8; X25519_KEY_LEN];
    zufall_fuellen(&mut secret_bytes)?;
    let secret = SecretKey::aus_bytes(secret_bytes)?;
    Ok(WrappingKeypair {
        public: secret.public_key(),
        secret,
    })
}

/// Leitet den symmetrischen Wrapping-Schluessel zwischen zwei Parteien ab
///
/// Salt sind beide oeffentlichen Schluessel in kanonischer (sortierter)
/// Reihenfolge, damit Sender und Empfaenger denselben Salt bilden.
pub fn wrap_schluessel_ableiten(
    eigener_secret: &SecretKey,
    fremder_public: &PublicKey,
) -> CryptoResult<SecretBytes> {
    let secret = eigener_secret.static_secret();
    let eigener_public = X25519PublicKey::from(&secret).to_bytes();
    let dh_output = secret.diffie_hellman(&X25519PublicKey::from(*fremder_public.as_bytes()));

    // Punkte kleiner Ordnung liefern ein Null-Secret
    if !dh_output.was_contributory() {
        return Err(CryptoError::UngueltigerPublicKey);
    }

    let (erster, zweiter) = if eigener_public <= *fremder_public.as_bytes() {
        (eigener_public, *fremder_public.as_bytes())
    } else {
        (*fremder_public.as_bytes(), eigener_public)
    };
    let mut salt = [0u8; 2 * X25519_KEY_LEN];
    salt[..X25519_KEY_LEN].copy_from_slice(&erster);
    salt[X25519_KEY_LEN..].copy_from_slice(&zweiter);

    let okm = hkdf_derive(dh_output.as_bytes(), &salt, WRAP_INFO, 32)?;
    Ok(SecretBytes::new(okm))
}

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beide_seiten_leiten_gleichen_schluessel_ab() {
        let server = schluesselpaar_erzeugen().unwrap();
        let mitglied = schluesselpaar_erzeugen().unwrap();

        let auf_server = wrap_schluessel_ableiten(&server.secret, &mitglied.public).unwrap();
        let auf_geraet = wrap_schluessel_ableiten(&mitglied.secret, &server.public).unwrap();

        assert_eq!(auf_server.as_bytes(), auf_geraet.as_bytes());
        assert_eq!(auf_server.len(), 32);
    }

    #[test]
    fn fremdes_paar_ergibt_anderen_schluessel() {
        let server = schluesselpaar_erzeugen().unwrap();
        let a = schluesselpaar_erzeugen().unwrap();
        let b = schluesselpaar_erzeugen().unwrap();

        let fuer_a = wrap_schluessel_ableiten(&server.secret, &a.public).unwrap();
        let fuer_b = wrap_schluessel_ableiten(&server.secret, &b.public).unwrap();
        assert_ne!(fuer_a.as_bytes(), fuer_b.as_bytes());
    }

    #[test]
    fn null_public_key_wird_abgelehnt() {
        let server = schluesselpaar_erzeugen().unwrap();
        let null = PublicKey::new([0u8; 32]);
        assert!(matches!(
            wrap_schluessel_ableiten(&server.secret, &null),
            Err(CryptoError::UngueltigerPublicKey)
        ));
    }

    #[test]
    fn hkdf_derive_deterministisch() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 32);
    }

    #[test]
    fn hkdf_verschiedene_infos_geben_verschiedene_keys() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info-1", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info-2", 32).unwrap();
        assert_ne!(key1, key2);
    }
}
