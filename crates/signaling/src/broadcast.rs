//! Event-Broadcaster – Sendet Events an verbundene Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller authentifizierten
//! Verbindungen. Senden ist nicht-blockierend (`try_send`): ein langsamer
//! Empfaenger verliert Nachrichten, blockiert aber weder Absender noch
//! andere Empfaenger.
//!
//! Zugestellt wird immer an alle ausser dem Ausloeser
//! (`an_alle_ausser_senden`): Standorte, Praesenz-Hinweise.

use dashmap::DashMap;
use draugar_core::ConnectionId;
use draugar_observability::DraugarMetrics;
use draugar_protocol::RealtimeMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<RealtimeMessage>,
}

/// Ergebnis eines einzelnen Sendeversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendeErgebnis {
    Eingereiht,
    QueueVoll,
    Geschlossen,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    pub fn senden(&self, nachricht: RealtimeMessage) -> SendeErgebnis {
        match self.tx.try_send(nachricht) {
            Ok(()) => SendeErgebnis::Eingereiht,
            Err(mpsc::error::TrySendError::Full(verworfen)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    event = verworfen.event_name(),
                    "Send-Queue voll – Nachricht verworfen"
                );
                SendeErgebnis::QueueVoll
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                SendeErgebnis::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle authentifizierten Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    clients: DashMap<ConnectionId, ClientSender>,
    metriken: Option<DraugarMetrics>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu(metriken: Option<DraugarMetrics>) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                metriken,
            }),
        }
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    pub fn client_registrieren(
        &self,
        connection_id: ConnectionId,
        queue_groesse: usize,
    ) -> mpsc::Receiver<RealtimeMessage> {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        let sender = ClientSender { connection_id, tx };
        self.inner.clients.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn client_entfernen(&self, connection_id: &ConnectionId) {
        self.inner.clients.remove(connection_id);
        tracing::debug!(connection_id = %connection_id, "Client aus Broadcaster entfernt");
    }

    /// Sendet eine Nachricht an alle Verbindungen ausser einer
    ///
    /// Gibt die Anzahl der eingereihten Sendungen zurueck.
    pub fn an_alle_ausser_senden(
        &self,
        ausgeschlossen: &ConnectionId,
        nachricht: RealtimeMessage,
    ) -> usize {
        let empfaenger: Vec<ClientSender> = self
            .inner
            .clients
            .iter()
            .filter(|e| e.key() != ausgeschlossen)
            .map(|e| e.value().clone())
            .collect();

        empfaenger
            .iter()
            .filter(|sender| self.zustellen(sender, nachricht.clone()))
            .count()
    }

    fn zustellen(&self, sender: &ClientSender, nachricht: RealtimeMessage) -> bool {
        match sender.senden(nachricht) {
            SendeErgebnis::Eingereiht => true,
            SendeErgebnis::QueueVoll => {
                if let Some(m) = &self.inner.metriken {
                    m.broadcast_dropped_total.inc();
                }
                false
            }
            SendeErgebnis::Geschlossen => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use draugar_protocol::EncryptedPayload;

    fn update() -> RealtimeMessage {
        RealtimeMessage::LocationUpdate(EncryptedPayload {
            v: 1,
            n: "bm9uY2U".into(),
            c: "Y2lwaGVy".into(),
        })
    }

    #[tokio::test]
    async fn an_alle_ausser_absender() {
        let b = EventBroadcaster::neu(None);
        let mut rx1 = b.client_registrieren(ConnectionId(1), 8);
        let mut rx2 = b.client_registrieren(ConnectionId(2), 8);
        let mut rx3 = b.client_registrieren(ConnectionId(3), 8);

        assert_eq!(b.an_alle_ausser_senden(&ConnectionId(1), update()), 2);

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.recv().await.unwrap(), update());
        assert_eq!(rx3.recv().await.unwrap(), update());
    }

    #[tokio::test]
    async fn volle_queue_blockiert_andere_nicht() {
        let metriken = DraugarMetrics::neu().unwrap();
        let b = EventBroadcaster::neu(Some(metriken.clone()));
        let _rx_langsam = b.client_registrieren(ConnectionId(1), 1);
        let mut rx_schnell = b.client_registrieren(ConnectionId(2), 8);

        // Erste Nachricht fuellt die Queue des langsamen Empfaengers
        assert_eq!(b.an_alle_ausser_senden(&ConnectionId(99), update()), 2);
        // Zweite wird fuer ihn verworfen, der schnelle bekommt sie
        assert_eq!(b.an_alle_ausser_senden(&ConnectionId(99), update()), 1);

        assert_eq!(metriken.broadcast_dropped_total.get(), 1);
        assert!(rx_schnell.recv().await.is_some());
        assert!(rx_schnell.recv().await.is_some());
    }

    #[tokio::test]
    async fn entfernter_client_bekommt_nichts() {
        let b = EventBroadcaster::neu(None);
        let mut rx = b.client_registrieren(ConnectionId(1), 8);
        let _rx2 = b.client_registrieren(ConnectionId(2), 8);

        b.client_entfernen(&ConnectionId(1));
        assert_eq!(b.an_alle_ausser_senden(&ConnectionId(99), update()), 1);
        // Sender wurde mit dem Eintrag verworfen, die Queue ist geschlossen
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn geschlossene_queue_zaehlt_nicht() {
        let b = EventBroadcaster::neu(None);
        let rx = b.client_registrieren(ConnectionId(1), 8);
        drop(rx);
        assert_eq!(b.an_alle_ausser_senden(&ConnectionId(99), update()), 0);
    }
}
