//! Session-Kontext authentifizierter Verbindungen
//!
//! Ein [`SessionContext`] entsteht genau einmal beim erfolgreichen Handshake
//! und wird danach nie veraendert. Die [`SessionTabelle`] haelt alle aktiven
//! Kontexte, indiziert nach [`ConnectionId`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use draugar_core::{ConnectionId, MemberId};

/// Identitaet einer authentifizierten Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub connection_id: ConnectionId,
    pub member_id: MemberId,
    pub display_name: String,
    pub verbunden_seit: DateTime<Utc>,
}

impl SessionContext {
    pub fn neu(connection_id: ConnectionId, member_id: MemberId, display_name: String) -> Self {
        Self {
            connection_id,
            member_id,
            display_name,
            verbunden_seit: Utc::now(),
        }
    }
}

/// Tabelle aller authentifizierten Verbindungen
///
/// Clone teilt den inneren Zustand.
#[derive(Debug, Clone, Default)]
pub struct SessionTabelle {
    inner: Arc<DashMap<ConnectionId, Arc<SessionContext>>>,
}

impl SessionTabelle {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn einfuegen(&self, kontext: Arc<SessionContext>) {
        self.inner.insert(kontext.connection_id, kontext);
    }

    pub fn entfernen(&self, connection_id: &ConnectionId) -> Option<Arc<SessionContext>> {
        self.inner.remove(connection_id).map(|(_, kontext)| kontext)
    }

    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }

    /// Ob das Mitglied noch ueber irgendeine Verbindung online ist
    pub fn mitglied_verbunden(&self, member_id: &MemberId) -> bool {
        self.inner.iter().any(|e| e.value().member_id == *member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kontext(id: u64, member: MemberId) -> Arc<SessionContext> {
        Arc::new(SessionContext::neu(ConnectionId(id), member, format!("M{id}")))
    }

    #[test]
    fn einfuegen_und_entfernen() {
        let tabelle = SessionTabelle::neu();
        let m = MemberId::new();
        tabelle.einfuegen(kontext(1, m));

        assert!(tabelle.mitglied_verbunden(&m));
        assert_eq!(tabelle.anzahl(), 1);

        let entfernt = tabelle.entfernen(&ConnectionId(1)).unwrap();
        assert_eq!(entfernt.display_name, "M1");
        assert_eq!(tabelle.anzahl(), 0);
        assert!(tabelle.entfernen(&ConnectionId(1)).is_none());
    }

    #[test]
    fn mitglied_mit_zwei_verbindungen() {
        let tabelle = SessionTabelle::neu();
        let m = MemberId::new();
        tabelle.einfuegen(kontext(1, m));
        tabelle.einfuegen(kontext(2, m));

        tabelle.entfernen(&ConnectionId(1));
        assert!(tabelle.mitglied_verbunden(&m));
        tabelle.entfernen(&ConnectionId(2));
        assert!(!tabelle.mitglied_verbunden(&m));
    }

    #[test]
    fn klone_teilen_zustand() {
        let a = SessionTabelle::neu();
        let b = a.clone();
        let m = MemberId::new();
        a.einfuegen(kontext(7, m));
        assert!(b.mitglied_verbunden(&m));
        assert_eq!(b.entfernen(&ConnectionId(7)).unwrap().member_id, m);
        assert_eq!(a.anzahl(), 0);
    }
}
