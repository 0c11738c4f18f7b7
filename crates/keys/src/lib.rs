//! draugar-keys – Key-Service
//!
//! Verwaltet den Gruppen-Schluessel und das Wrapping-Schluesselpaar des
//! Servers und gibt den Gruppen-Schluessel eingewickelt an Mitglieder aus.

pub mod error;
pub mod service;

pub use error::{KeyError, KeyResult};
pub use service::KeyService;
