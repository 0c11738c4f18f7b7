//! In-Memory-Backend
//!
//! Haelt Mitglieder und die Gruppe im Prozess. Die Gruppe liegt hinter einem
//! einzigen Mutex; Pruefen und Einfuegen passieren unter derselben Sperre.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use draugar_core::{GroupId, MemberId};
use parking_lot::{Mutex, RwLock};

use crate::error::{DbError, DbResult};
use crate::models::{GroupRecord, MemberRecord, NeueGruppe};
use crate::repository::{GroupRepository, MemberRepository};

/// Speicher fuer Mitglieder und Gruppe
#[derive(Debug, Default)]
pub struct InMemoryStore {
    mitglieder: RwLock<HashMap<MemberId, MemberRecord>>,
    gruppe: Mutex<Option<GroupRecord>>,
}

impl InMemoryStore {
    pub fn neu() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn mitglied_laden(&self, id: MemberId) -> DbResult<Option<MemberRecord>> {
        Ok(self.mitglieder.read().get(&id).cloned())
    }

    async fn mitglied_sicherstellen(
        &self,
        id: MemberId,
        display_name: &str,
    ) -> DbResult<MemberRecord> {
        let mut mitglieder = self.mitglieder.write();
        let eintrag = mitglieder.entry(id).or_insert_with(|| {
            tracing::debug!(member_id = %id, "Mitglied angelegt");
            MemberRecord {
                id,
                display_name: display_name.to_string(),
                public_key: None,
                erstellt_am: Utc::now(),
            }
        });
        eintrag.display_name = display_name.to_string();
        Ok(eintrag.clone())
    }

    async fn public_key_setzen(&self, id: MemberId, public_key: &str) -> DbResult<MemberRecord> {
        let mut mitglieder = self.mitglieder.write();
        let eintrag = mitglieder
            .get_mut(&id)
            .ok_or_else(|| DbError::nicht_gefunden(format!("Mitglied {id}")))?;
        eintrag.public_key = Some(public_key.to_string());
        Ok(eintrag.clone())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn gruppe_laden(&self) -> DbResult<Option<GroupRecord>> {
        Ok(self.gruppe.lock().clone())
    }

    async fn gruppe_einfuegen_falls_fehlt(
        &self,
        neue_gruppe: NeueGruppe,
    ) -> DbResult<(GroupRecord, bool)> {
        let mut gruppe = self.gruppe.lock();
        if let Some(vorhanden) = gruppe.as_ref() {
            return Ok((vorhanden.clone(), false));
        }

        let record = GroupRecord {
            id: GroupId::new(),
            name: neue_gruppe.name,
            group_key: neue_gruppe.group_key,
            key_version: neue_gruppe.key_version,
            wrapping_public_key: neue_gruppe.wrapping_public_key,
            wrapping_secret_key: neue_gruppe.wrapping_secret_key,
            erstellt_am: Utc::now(),
        };
        *gruppe = Some(record.clone());
        tracing::info!(group_id = %record.id, name = %record.name, "Gruppe angelegt");
        Ok((record, true))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
