//! draugar-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Draugar-Crates gemeinsam genutzt werden: Identifikationstypen
//! und die getaggte Fehler-Taxonomie an den Service-Grenzen.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{DraugarError, FehlerArt, Result};
pub use types::{ConnectionId, GroupId, MemberId};
