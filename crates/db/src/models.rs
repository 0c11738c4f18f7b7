//! Datenbankmodelle fuer Draugar
//!
//! Reine Datensaetze wie sie ein Speicher ablegt. Schluesselmaterial liegt
//! hier Base64-kodiert vor; dekodiert wird erst im Key-Service.

use chrono::{DateTime, Utc};
use draugar_core::{GroupId, MemberId};

// ---------------------------------------------------------------------------
// Mitglieder
// ---------------------------------------------------------------------------

/// Mitglieds-Datensatz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: MemberId,
    pub display_name: String,
    /// Oeffentlicher Geraete-Schluessel, `None` bis zur ersten Registrierung
    pub public_key: Option<String>,
    pub erstellt_am: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Gruppe
// ---------------------------------------------------------------------------

/// Name der einzigen Gruppe eines Deployments
pub const GRUPPEN_NAME: &str = "Family";

/// Startwert des Schluessel-Versionszaehlers
pub const ERSTE_KEY_VERSION: u32 = 1;

/// Daten fuer eine neu anzulegende Gruppe
#[derive(Clone)]
pub struct NeueGruppe {
    pub name: String,
    pub group_key: String,
    pub key_version: u32,
    pub wrapping_public_key: String,
    pub wrapping_secret_key: String,
}

/// Gruppen-Datensatz (genau einer pro Deployment)
#[derive(Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    pub group_key: String,
    pub key_version: u32,
    pub wrapping_public_key: String,
    pub wrapping_secret_key: String,
    pub erstellt_am: DateTime<Utc>,
}

impl std::fmt::Debug for NeueGruppe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeueGruppe")
            .field("name", &self.name)
            .field("key_version", &self.key_version)
            .field("wrapping_public_key", &self.wrapping_public_key)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for GroupRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key_version", &self.key_version)
            .field("wrapping_public_key", &self.wrapping_public_key)
            .finish_non_exhaustive()
    }
}
