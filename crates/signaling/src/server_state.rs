//! Gemeinsamer Server-Zustand fuer den Echtzeit-Relay
//!
//! Haelt alle geteilten Services und Zustands-Manager, die sicher zwischen
//! tokio-Tasks geteilt werden koennen.

use draugar_auth::AuthService;
use draugar_core::ConnectionId;
use draugar_observability::DraugarMetrics;
use draugar_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::session::SessionTabelle;

/// Konfiguration fuer den Echtzeit-Relay
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Frist fuer den ersten Frame (Handshake) in Sekunden
    pub handshake_timeout_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
    /// Maximale gleichzeitig authentifizierte Verbindungen
    pub max_verbindungen: usize,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            handshake_timeout_sek: 10,
            send_queue_groesse: 64,
            max_verbindungen: 1024,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Gemeinsamer Server-Zustand (Arc-geteilt)
pub struct SignalingState {
    pub config: Arc<SignalingConfig>,
    /// Prueft Handshake-Tokens
    pub auth_service: AuthService,
    /// Send-Queues aller authentifizierten Verbindungen
    pub broadcaster: EventBroadcaster,
    /// Identitaet aller authentifizierten Verbindungen
    pub sessions: SessionTabelle,
    pub metriken: Option<DraugarMetrics>,
    naechste_verbindung: AtomicU64,
    /// Belegte Plaetze, unabhaengig davon ob die Session schon eingetragen ist
    belegte_plaetze: AtomicUsize,
}

/// Reservierter Verbindungsplatz; wird beim Drop freigegeben
#[must_use]
pub struct VerbindungsPlatz {
    state: Arc<SignalingState>,
}

impl Drop for VerbindungsPlatz {
    fn drop(&mut self) {
        self.state.belegte_plaetze.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SignalingState {
    pub fn neu(
        config: SignalingConfig,
        auth_service: AuthService,
        metriken: Option<DraugarMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            auth_service,
            broadcaster: EventBroadcaster::neu(metriken.clone()),
            sessions: SessionTabelle::neu(),
            metriken,
            naechste_verbindung: AtomicU64::new(1),
            belegte_plaetze: AtomicUsize::new(0),
        })
    }

    /// Vergibt eine prozessweit eindeutige Verbindungs-ID
    pub fn naechste_verbindungs_id(&self) -> ConnectionId {
        ConnectionId(self.naechste_verbindung.fetch_add(1, Ordering::Relaxed))
    }

    /// Reserviert atomar einen der `max_verbindungen` Plaetze
    ///
    /// `None` wenn alle belegt sind.
    pub fn platz_reservieren(self: &Arc<Self>) -> Option<VerbindungsPlatz> {
        let maximum = self.config.max_verbindungen;
        self.belegte_plaetze
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |belegt| {
                (belegt < maximum).then_some(belegt + 1)
            })
            .ok()
            .map(|_| VerbindungsPlatz {
                state: Arc::clone(self),
            })
    }

    /// Anzahl authentifizierter Verbindungen
    pub fn online_anzahl(&self) -> usize {
        self.sessions.anzahl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<SignalingState> {
        let auth = AuthService::neu(vec![3u8; 32]).unwrap();
        SignalingState::neu(SignalingConfig::default(), auth, None)
    }

    #[test]
    fn verbindungs_ids_sind_eindeutig() {
        let s = state();
        let a = s.naechste_verbindungs_id();
        let b = s.naechste_verbindungs_id();
        assert_ne!(a, b);
    }

    #[test]
    fn standard_konfiguration() {
        let cfg = SignalingConfig::default();
        assert_eq!(cfg.keepalive_sek, 25);
        assert_eq!(cfg.handshake_timeout_sek, 10);
        assert_eq!(cfg.send_queue_groesse, 64);
        assert_eq!(cfg.max_frame_groesse, 64 * 1024);
    }

    #[test]
    fn plaetze_sind_begrenzt_und_werden_freigegeben() {
        let auth = AuthService::neu(vec![3u8; 32]).unwrap();
        let config = SignalingConfig {
            max_verbindungen: 2,
            ..SignalingConfig::default()
        };
        let s = SignalingState::neu(config, auth, None);

        let a = s.platz_reservieren().unwrap();
        let _b = s.platz_reservieren().unwrap();
        assert!(s.platz_reservieren().is_none());

        drop(a);
        assert!(s.platz_reservieren().is_some());
    }

    #[test]
    fn gleichzeitige_reservierung_ueberschreitet_maximum_nicht() {
        let auth = AuthService::neu(vec![3u8; 32]).unwrap();
        let config = SignalingConfig {
            max_verbindungen: 5,
            ..SignalingConfig::default()
        };
        let s = SignalingState::neu(config, auth, None);

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || s.platz_reservieren())
            })
            .collect();
        let plaetze: Vec<_> = threads
            .into_iter()
            .filter_map(|t| t.join().unwrap())
            .collect();
        assert_eq!(plaetze.len(), 5);
    }

    #[test]
    fn frischer_zustand_ist_leer() {
        assert_eq!(state().online_anzahl(), 0);
    }
}
