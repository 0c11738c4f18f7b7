//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Speicher-Implementierung. Die Traits nutzen `async_trait`, damit die
//! Futures `Send` sind und in axum-Handlern laufen koennen.

use async_trait::async_trait;
use draugar_core::MemberId;

use crate::error::DbResult;
use crate::models::{GroupRecord, MemberRecord, NeueGruppe};

/// Repository fuer Mitglieder
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Ein Mitglied anhand seiner ID laden
    async fn mitglied_laden(&self, id: MemberId) -> DbResult<Option<MemberRecord>>;

    /// Legt das Mitglied an falls es fehlt, sonst wird der Anzeigename aktualisiert
    async fn mitglied_sicherstellen(&self, id: MemberId, display_name: &str)
        -> DbResult<MemberRecord>;

    /// Speichert den oeffentlichen Geraete-Schluessel
    ///
    /// `DbError::NichtGefunden` wenn das Mitglied nicht existiert.
    async fn public_key_setzen(&self, id: MemberId, public_key: &str) -> DbResult<MemberRecord>;
}

/// Repository fuer die Gruppe
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Die Gruppe laden, sofern sie existiert
    async fn gruppe_laden(&self) -> DbResult<Option<GroupRecord>>;

    /// Speichert `neue_gruppe` nur wenn noch keine Gruppe existiert
    ///
    /// Gibt immer die gespeicherte Gruppe zurueck und ob der Kandidat
    /// uebernommen wurde. Verlierer eines Wettlaufs erhalten die Gruppe des
    /// Gewinners.
    async fn gruppe_einfuegen_falls_fehlt(
        &self,
        neue_gruppe: NeueGruppe,
    ) -> DbResult<(GroupRecord, bool)>;
}
