//! draugar-client – Geraete-Seite
//!
//! - [`ClientKeyStore`]: eigenes Schluesselpaar und Gruppen-Schluessel im
//!   sicheren Speicher
//! - [`KeyApiClient`]: `register-key` / `group-key` ueber HTTP
//! - [`sitzung_abgleichen`]: Abgleich beim Sitzungsstart
//! - [`RealtimeClient`]: Verbindung zum Relay mit Wiederverbindung und
//!   Geistermodus
//!
//! Krypto-Fehler blockieren nie die Anmeldung; sie enden als "noch nicht
//! bereit" und werden geloggt.

pub mod abgleich;
pub mod error;
pub mod key_api;
pub mod key_store;
pub mod realtime;
pub mod secret_store;

pub use abgleich::{abmelden, sitzung_abgleichen};
pub use error::{ClientError, ClientResult};
pub use key_api::{KeyApi, KeyApiClient, ServerStatus};
pub use key_store::{ClientKeyStore, KeyStoreZustand};
pub use realtime::{EmpfangenerStandort, RealtimeClient, RealtimeKonfig};
pub use secret_store::{DateiSecretStore, SecretStore, SpeicherSecretStore};
