//! # draugar-crypto
//!
//! Ende-zu-Ende-Verschluesselung fuer Draugar.
//!
//! ## Module
//! - `e2e` - Gruppen-Schluessel, Key-Wrapping, Standort-Payloads
//! - `context` - Bereiter Krypto-Handle fuer Dienste und Geraete
//! - `types` - Schluesseltypen, Base64-Helfer, Entschluesselungs-Ergebnis
//! - `error` - Fehlertypen

pub mod context;
pub mod e2e;
pub mod error;
pub mod types;

pub use context::CryptoContext;
pub use error::{CryptoError, CryptoResult};
pub use types::{
    b64_dekodieren, b64_kodieren, Entschluesselt, Fehlschlag, GroupKey, PublicKey, SecretBytes,
    SecretKey, WrappingKeypair,
};

pub use e2e::{
    gruppen_schluessel_auswickeln, gruppen_schluessel_einwickeln, gruppen_schluessel_erzeugen,
    hkdf_derive, payload_bytes_entschluesseln, payload_bytes_verschluesseln,
    schluesselpaar_erzeugen, standort_entschluesseln, standort_verschluesseln,
    wrap_schluessel_ableiten, PayloadVersion,
};
