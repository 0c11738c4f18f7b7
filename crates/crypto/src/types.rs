//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Laenge des symmetrischen Gruppen-Schluessels
pub const GROUP_KEY_LEN: usize = 32;

/// Laenge eines X25519-Schluessels (oeffentlich wie geheim)
pub const X25519_KEY_LEN: usize = 32;

/// Nonce-Laenge von XChaCha20-Poly1305 (192 Bit)
pub const XNONCE_LEN: usize = 24;

/// Poly1305 Auth-Tag
pub const TAG_LEN: usize = 16;

/// Zulaessige Laenge eines Base64-kodierten oeffentlichen Schluessels
pub const PUBLIC_KEY_B64_LAENGE: std::ops::RangeInclusive<usize> = 40..=50;

/// Kodiert Bytes wie alle Draht-Felder (URL-sicher, ohne Padding)
pub fn b64_kodieren(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Dekodiert ein Draht-Feld
///
/// Padding und das Standard-Alphabet (`+`, `/`) werden toleriert.
pub fn b64_dekodieren(s: &str) -> CryptoResult<Vec<u8>> {
    let normalisiert = s.trim_end_matches('=').replace('+', "-").replace('/', "_");
    Ok(URL_SAFE_NO_PAD.decode(normalisiert)?)
}

// ---------------------------------------------------------------------------
// SecretBytes
// ---------------------------------------------------------------------------

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GroupKey
// ---------------------------------------------------------------------------

/// Symmetrischer Gruppen-Schluessel (immer genau 32 Bytes)
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GroupKey(SecretBytes);

impl GroupKey {
    /// Uebernimmt Rohbytes; jede andere Laenge als 32 ist ein Fehler
    pub fn aus_bytes(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() != GROUP_KEY_LEN {
            let erhalten = bytes.len();
            drop(SecretBytes::new(bytes));
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: GROUP_KEY_LEN,
                erhalten,
            });
        }
        Ok(Self(SecretBytes::new(bytes)))
    }

    pub fn aus_base64(s: &str) -> CryptoResult<Self> {
        Self::aus_bytes(b64_dekodieren(s)?)
    }

    pub fn als_base64(&self) -> String {
        b64_kodieren(self.0.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// ---------------------------------------------------------------------------
// X25519-Schluessel
// ---------------------------------------------------------------------------

/// Oeffentlicher X25519-Schluessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; X25519_KEY_LEN]);

impl PublicKey {
    pub fn new(bytes: [u8; X25519_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parst einen Base64-kodierten Schluessel von einem Client
    ///
    /// Die kodierte Laenge muss in `40..=50` liegen, das Ergebnis genau
    /// 32 Bytes ergeben und kein Punkt kleiner Ordnung sein; sonst
    /// [`CryptoError::UngueltigerPublicKey`]. Ein so geparster Schluessel
    /// laesst sich also immer einwickeln.
    pub fn aus_base64(s: &str) -> CryptoResult<Self> {
        if !PUBLIC_KEY_B64_LAENGE.contains(&s.len()) {
            return Err(CryptoError::UngueltigerPublicKey);
        }
        let bytes = b64_dekodieren(s).map_err(|_| CryptoError::UngueltigerPublicKey)?;
        let array: [u8; X25519_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::UngueltigerPublicKey)?;
        if ist_kleine_ordnung(&array) {
            return Err(CryptoError::UngueltigerPublicKey);
        }
        Ok(Self(array))
    }

    pub fn als_base64(&self) -> String {
        b64_kodieren(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_LEN] {
        &self.0
    }
}

/// Ob `u` ein Punkt kleiner Ordnung ist (auf Kurve oder Twist)
///
/// Ein geklemmter Skalar ist ein Vielfaches von 8 und bildet solche Punkte
/// auf Null ab.
fn ist_kleine_ordnung(u: &[u8; X25519_KEY_LEN]) -> bool {
    let pruef_skalar = x25519_dalek::StaticSecret::from([1u8; X25519_KEY_LEN]);
    !pruef_skalar
        .diffie_hellman(&x25519_dalek::PublicKey::from(*u))
        .was_contributory()
}

/// Geheimer X25519-Schluessel
#[derive(Clone, Debug)]
pub struct SecretKey(SecretBytes);

impl SecretKey {
    pub fn aus_bytes(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() != X25519_KEY_LEN {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: X25519_KEY_LEN,
                erhalten: bytes.len(),
            });
        }
        Ok(Self(SecretBytes::new(bytes)))
    }

    pub fn aus_base64(s: &str) -> CryptoResult<Self> {
        Self::aus_bytes(b64_dekodieren(s)?)
    }

    pub fn als_base64(&self) -> String {
        b64_kodieren(self.0.as_bytes())
    }

    /// Kopie als Array; wird beim Drop genullt
    pub(crate) fn als_array(&self) -> Zeroizing<[u8; X25519_KEY_LEN]> {
        let mut out = Zeroizing::new([0u8; X25519_KEY_LEN]);
        out.copy_from_slice(self.0.as_bytes());
        out
    }

    /// Schluessel fuer x25519-dalek (nullt sich selbst beim Drop)
    pub(crate) fn static_secret(&self) -> x25519_dalek::StaticSecret {
        x25519_dalek::StaticSecret::from(*self.als_array())
    }

    /// Leitet den zugehoerigen oeffentlichen Schluessel ab
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.static_secret()).to_bytes())
    }
}

/// X25519-Schluesselpaar, ausschliesslich zum Einwickeln verwendet
#[derive(Clone, Debug)]
pub struct WrappingKeypair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

// ---------------------------------------------------------------------------
// Wiederherstellbares Entschluesselungs-Ergebnis
// ---------------------------------------------------------------------------

/// Grund eines fehlgeschlagenen Entschluesselungsversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fehlschlag {
    /// Formatversion unbekannt, Entschluesselung wurde nicht versucht
    UnbekannteVersion(u32),
    /// Base64 oder Nonce-Laenge ungueltig
    UngueltigeKodierung,
    /// Auth-Tag passt nicht (manipuliert, falscher Schluessel)
    Authentifizierung,
    /// Klartext ist kein gueltiger Datensatz
    UngueltigerKlartext,
}

impl std::fmt::Display for Fehlschlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnbekannteVersion(v) => write!(f, "unbekannte Version {v}"),
            Self::UngueltigeKodierung => write!(f, "ungueltige Kodierung"),
            Self::Authentifizierung => write!(f, "Authentifizierung fehlgeschlagen"),
            Self::UngueltigerKlartext => write!(f, "ungueltiger Klartext"),
        }
    }
}

/// Ergebnis einer Entschluesselung, deren Scheitern kein harter Fehler ist
///
/// Empfangspfade verwerfen `Fehlgeschlagen` und laufen weiter.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Entschluesselt<T> {
    Erfolg(T),
    Fehlgeschlagen(Fehlschlag),
}

impl<T> Entschluesselt<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Erfolg(wert) => Some(wert),
            Self::Fehlgeschlagen(_) => None,
        }
    }

    pub fn ist_erfolg(&self) -> bool {
        matches!(self, Self::Erfolg(_))
    }

    pub fn fehlschlag(&self) -> Option<Fehlschlag> {
        match self {
            Self::Erfolg(_) => None,
            Self::Fehlgeschlagen(f) => Some(*f),
        }
    }
}
