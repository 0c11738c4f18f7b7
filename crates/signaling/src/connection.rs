//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task.
//!
//! ## Ablauf
//! ```text
//! Verbunden --handshake(token)--> Authentifiziert --> Getrennt
//!     |
//!     +-- kein/ungueltiges Token, Timeout --> error("Unauthorized") --> Getrennt
//!     +-- gueltiges Token, kein freier Platz --> error("Server full") --> Getrennt
//! ```
//!
//! Erst nach erfolgreicher Token-Pruefung wird die Verbindung in
//! Session-Tabelle und Broadcaster eingetragen.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Kommt `verbindungs_timeout_sek` lang nichts an, wird getrennt

use futures_util::{SinkExt, StreamExt};
use draugar_protocol::{
    realtime::{
        HandshakeAnfrage, HandshakeBestaetigung, LocationBroadcast, PingNachricht, PresenzHinweis,
        SERVER_VOLL, SHUTDOWN_MELDUNG, UNAUTHORIZED,
    },
    wire::FrameCodec,
    RealtimeMessage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::{SignalingState, VerbindungsPlatz};
use crate::session::SessionContext;

type RealtimeFramed = Framed<TcpStream, FrameCodec>;

fn jetzt_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne TCP-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitung
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        tracing::debug!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(
            stream,
            FrameCodec::with_max_size(self.state.config.max_frame_groesse),
        );

        // Der Platz bleibt bis nach dem Aufraeumen belegt
        let (session, _platz) = match self.handshake(&mut framed).await {
            Ok(angenommen) => angenommen,
            Err(e) => {
                tracing::info!(peer = %peer_addr, grund = %e, "Handshake abgelehnt");
                if let Some(m) = &self.state.metriken {
                    m.handshake_rejected_total.inc();
                }
                let meldung = match e {
                    SignalingError::VerbindungGetrennt => None,
                    SignalingError::ServerVoll => Some(SERVER_VOLL),
                    // Ohne Grund: abgelaufen und ungueltig sehen gleich aus
                    _ => Some(UNAUTHORIZED),
                };
                if let Some(meldung) = meldung {
                    let _ = framed.send(RealtimeMessage::fehler(meldung)).await;
                }
                return;
            }
        };

        self.sitzung_fuehren(framed, session, shutdown_rx).await;
    }

    /// Erwartet `handshake` als ersten Frame und prueft das Token
    ///
    /// Erst nach gueltigem Token wird ein Platz reserviert.
    async fn handshake(
        &self,
        framed: &mut RealtimeFramed,
    ) -> SignalingResult<(Arc<SessionContext>, VerbindungsPlatz)> {
        let frist = Duration::from_secs(self.state.config.handshake_timeout_sek);
        let erster = tokio::time::timeout(frist, framed.next())
            .await
            .map_err(|_| SignalingError::Timeout)?;

        let token = match erster {
            Some(Ok(RealtimeMessage::Handshake(HandshakeAnfrage { token }))) => token,
            Some(Ok(andere)) => {
                return Err(SignalingError::protokoll(format!(
                    "erster Frame ist {}",
                    andere.event_name()
                )))
            }
            Some(Err(e)) => return Err(SignalingError::protokoll(e.to_string())),
            None => return Err(SignalingError::VerbindungGetrennt),
        };

        let claims = self.state.auth_service.verifizieren(&token)?;

        let platz = self
            .state
            .platz_reservieren()
            .ok_or(SignalingError::ServerVoll)?;

        let session = Arc::new(SessionContext::neu(
            self.state.naechste_verbindungs_id(),
            claims.user_id,
            claims.name,
        ));
        Ok((session, platz))
    }

    /// Hauptschleife einer authentifizierten Verbindung
    async fn sitzung_fuehren(
        &self,
        mut framed: RealtimeFramed,
        session: Arc<SessionContext>,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let conn_id = session.connection_id;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        // Erst registrieren, dann bestaetigen: handshake:ok bleibt trotzdem der
        // erste Frame, weil die Queue erst in der Schleife geleert wird
        let mut sende_rx = self
            .state
            .broadcaster
            .client_registrieren(conn_id, self.state.config.send_queue_groesse);
        self.state.sessions.einfuegen(Arc::clone(&session));
        if let Some(m) = &self.state.metriken {
            m.connected_clients.inc();
        }

        tracing::info!(
            peer = %peer_addr,
            connection_id = %conn_id,
            member_id = %session.member_id,
            "Verbindung authentifiziert"
        );

        let bestaetigung = RealtimeMessage::HandshakeOk(HandshakeBestaetigung {
            member_id: session.member_id,
            display_name: session.display_name.clone(),
        });

        if framed.send(bestaetigung).await.is_ok() {
            self.state.broadcaster.an_alle_ausser_senden(
                &conn_id,
                RealtimeMessage::UserOnline(PresenzHinweis {
                    member_id: session.member_id,
                }),
            );

            let mut letzter_empfang = Instant::now();
            let mut naechster_ping = Instant::now() + keepalive_intervall;

            loop {
                let jetzt = Instant::now();

                if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                    tracing::warn!(connection_id = %conn_id, "Verbindungs-Timeout");
                    break;
                }

                let ping_verzoegerung = naechster_ping
                    .checked_duration_since(jetzt)
                    .unwrap_or(Duration::from_millis(1));

                tokio::select! {
                    // Eingehende Nachricht vom Client
                    frame = framed.next() => {
                        match frame {
                            Some(Ok(nachricht)) => {
                                letzter_empfang = Instant::now();
                                self.nachricht_verarbeiten(&session, nachricht);
                            }
                            Some(Err(e)) => {
                                tracing::warn!(connection_id = %conn_id, fehler = %e, "Frame-Lesefehler");
                                break;
                            }
                            None => {
                                tracing::info!(connection_id = %conn_id, "Verbindung vom Client getrennt");
                                break;
                            }
                        }
                    }

                    // Ausgehende Nachricht aus dem Broadcaster
                    Some(ausgehend) = sende_rx.recv() => {
                        if let Err(e) = framed.send(ausgehend).await {
                            tracing::warn!(connection_id = %conn_id, fehler = %e, "Broadcast-Senden fehlgeschlagen");
                            break;
                        }
                    }

                    // Keepalive-Ping
                    _ = tokio::time::sleep(ping_verzoegerung) => {
                        if Instant::now() >= naechster_ping {
                            let ping = RealtimeMessage::Ping(PingNachricht { timestamp_ms: jetzt_ms() });
                            if let Err(e) = framed.send(ping).await {
                                tracing::warn!(connection_id = %conn_id, fehler = %e, "Ping-Senden fehlgeschlagen");
                                break;
                            }
                            naechster_ping = Instant::now() + keepalive_intervall;
                        }
                    }

                    // Shutdown-Signal
                    Ok(()) = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!(connection_id = %conn_id, "Shutdown-Signal – Verbindung wird getrennt");
                            let _ = framed.send(RealtimeMessage::fehler(SHUTDOWN_MELDUNG)).await;
                            break;
                        }
                    }
                }
            }
        }

        self.aufraeumen(&session);
    }

    /// Reagiert auf ein Event einer authentifizierten Verbindung
    fn nachricht_verarbeiten(&self, session: &SessionContext, nachricht: RealtimeMessage) {
        match nachricht {
            RealtimeMessage::LocationUpdate(payload) => {
                // Nutzlast wird unveraendert weitergereicht, nie entschluesselt
                let broadcast = RealtimeMessage::LocationBroadcast(LocationBroadcast {
                    sender_id: session.member_id,
                    sender_name: session.display_name.clone(),
                    payload,
                });
                let empfaenger = self
                    .state
                    .broadcaster
                    .an_alle_ausser_senden(&session.connection_id, broadcast);
                if let Some(m) = &self.state.metriken {
                    m.location_broadcasts_total.inc();
                }
                tracing::trace!(
                    connection_id = %session.connection_id,
                    empfaenger,
                    "Standort weitergeleitet"
                );
            }
            RealtimeMessage::LocationSubscribe | RealtimeMessage::LocationUnsubscribe => {
                // Reserviert fuer Raeume pro Gruppe; bei einer Gruppe ohne Wirkung
                tracing::trace!(connection_id = %session.connection_id, "Abo-Event ignoriert");
            }
            RealtimeMessage::Pong(_) => {}
            RealtimeMessage::Handshake(_) => {
                tracing::debug!(
                    connection_id = %session.connection_id,
                    "Wiederholter Handshake ignoriert"
                );
            }
            andere => {
                tracing::debug!(
                    connection_id = %session.connection_id,
                    event = andere.event_name(),
                    "Server-Event vom Client ignoriert"
                );
            }
        }
    }

    fn aufraeumen(&self, session: &SessionContext) {
        let conn_id = session.connection_id;
        self.state.broadcaster.client_entfernen(&conn_id);
        self.state.sessions.entfernen(&conn_id);
        if let Some(m) = &self.state.metriken {
            m.connected_clients.dec();
        }

        if !self.state.sessions.mitglied_verbunden(&session.member_id) {
            self.state.broadcaster.an_alle_ausser_senden(
                &conn_id,
                RealtimeMessage::UserOffline(PresenzHinweis {
                    member_id: session.member_id,
                }),
            );
        }

        tracing::info!(connection_id = %conn_id, "Verbindungs-Task beendet");
    }
}
