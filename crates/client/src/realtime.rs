//! Echtzeit-Client des Geraets
//!
//! Eine TCP-Verbindung zum Relay, betrieben von einem Hintergrund-Task.
//! Nach jedem (Wieder-)Verbinden wird `location:subscribe` gesendet, vor
//! einem freiwilligen Trennen `location:unsubscribe`.
//!
//! Geht die Verbindung verloren, wird bis zu `max_versuche` mal im festen
//! Abstand neu verbunden. Nur ein abgelehntes Token (`Unauthorized`) wird
//! nicht wiederholt; andere Fehlermeldungen wie ein voller Server schon.
//!
//! ## Transport
//! Die Verbindung ist Klartext-TCP, das Token geht im ersten Frame mit.
//! Ausserhalb eines vertrauenswuerdigen Netzes muss vor dem Echtzeit-Port
//! ein TLS-terminierender Proxy stehen (z.B. nginx `stream` mit
//! `ssl_preread` oder stunnel); `server_addr` zeigt dann auf dessen
//! lokalen Endpunkt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use draugar_core::MemberId;
use draugar_crypto::Entschluesselt;
use draugar_protocol::{
    realtime::{HandshakeAnfrage, HandshakeBestaetigung, LocationBroadcast},
    EncryptedPayload, FrameCodec, LocationRecord, RealtimeMessage,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::error::{ClientError, ClientResult};
use crate::key_store::ClientKeyStore;
use crate::secret_store::SecretStore;

/// Maximale Zahl aufeinanderfolgender Verbindungsversuche
pub const MAX_VERBINDUNGSVERSUCHE: u32 = 10;

/// Feste Pause zwischen zwei Versuchen
pub const WIEDERHOLUNGS_PAUSE: Duration = Duration::from_millis(1000);

/// Eintrag im Secret-Store fuer den Geistermodus
pub const GEISTERMODUS_EINTRAG: &str = "draugar_ghost_mode";

type Verbindung = Framed<TcpStream, FrameCodec>;

#[derive(Debug, Clone)]
pub struct RealtimeKonfig {
    /// `host:port` des Relays bzw. des TLS-Proxys davor
    pub server_addr: String,
    pub token: String,
    pub max_versuche: u32,
    pub wiederholungs_pause: Duration,
    pub handshake_timeout: Duration,
    /// Kapazitaet der Queue fuer empfangene Standorte
    pub empfangs_queue: usize,
}

impl RealtimeKonfig {
    pub fn neu(server_addr: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            token: token.into(),
            max_versuche: MAX_VERBINDUNGSVERSUCHE,
            wiederholungs_pause: WIEDERHOLUNGS_PAUSE,
            handshake_timeout: Duration::from_secs(10),
            empfangs_queue: 64,
        }
    }
}

/// Entschluesselter Standort eines anderen Mitglieds
#[derive(Debug, Clone, PartialEq)]
pub struct EmpfangenerStandort {
    pub sender_id: MemberId,
    pub sender_name: String,
    pub record: LocationRecord,
}

// ---------------------------------------------------------------------------
// Verbindungsaufbau
// ---------------------------------------------------------------------------

fn verbindungsfehler(e: std::io::Error) -> ClientError {
    ClientError::verbindung(e.to_string())
}

/// TCP verbinden, Handshake, `location:subscribe`
async fn verbindung_aufbauen(
    konfig: &RealtimeKonfig,
) -> ClientResult<(Verbindung, HandshakeBestaetigung)> {
    let stream = TcpStream::connect(&konfig.server_addr)
        .await
        .map_err(verbindungsfehler)?;
    let _ = stream.set_nodelay(true);
    let mut framed = Framed::new(stream, FrameCodec::new());

    framed
        .send(RealtimeMessage::Handshake(HandshakeAnfrage {
            token: konfig.token.clone(),
        }))
        .await
        .map_err(verbindungsfehler)?;

    let antwort = tokio::time::timeout(konfig.handshake_timeout, framed.next())
        .await
        .map_err(|_| ClientError::verbindung("Handshake-Timeout"))?;

    let identitaet = match antwort {
        Some(Ok(RealtimeMessage::HandshakeOk(ok))) => ok,
        Some(Ok(nachricht @ RealtimeMessage::Error(_))) if nachricht.ist_auth_ablehnung() => {
            tracing::debug!("Handshake abgelehnt: Token ungueltig");
            return Err(ClientError::NichtAuthentifiziert);
        }
        Some(Ok(RealtimeMessage::Error(meldung))) => {
            // z.B. voller Server: vorruebergehend
            return Err(ClientError::verbindung(format!("Relay meldet: {meldung}")));
        }
        Some(Ok(andere)) => {
            return Err(ClientError::verbindung(format!(
                "unerwartete Antwort auf Handshake: {}",
                andere.event_name()
            )))
        }
        Some(Err(e)) => return Err(verbindungsfehler(e)),
        None => return Err(ClientError::verbindung("Verbindung waehrend Handshake getrennt")),
    };

    framed
        .send(RealtimeMessage::LocationSubscribe)
        .await
        .map_err(verbindungsfehler)?;

    tracing::info!(
        server = %konfig.server_addr,
        member_id = %identitaet.member_id,
        "Echtzeit-Verbindung hergestellt"
    );
    Ok((framed, identitaet))
}

/// Versucht bis zu `max_versuche` mal zu verbinden
async fn mit_wiederholung(
    konfig: &RealtimeKonfig,
    stopp: &mut watch::Receiver<bool>,
) -> ClientResult<(Verbindung, HandshakeBestaetigung)> {
    let max = konfig.max_versuche.max(1);
    let mut letzter_fehler = ClientError::verbindung("kein Verbindungsversuch");

    for versuch in 1..=max {
        match verbindung_aufbauen(konfig).await {
            Ok(verbindung) => return Ok(verbindung),
            Err(ClientError::NichtAuthentifiziert) => return Err(ClientError::NichtAuthentifiziert),
            Err(e) => {
                tracing::warn!(versuch, max, fehler = %e, "Verbindungsversuch fehlgeschlagen");
                letzter_fehler = e;
            }
        }

        if versuch < max {
            tokio::select! {
                _ = tokio::time::sleep(konfig.wiederholungs_pause) => {}
                _ = stopp.changed() => {
                    return Err(ClientError::verbindung("Verbindungsaufbau abgebrochen"));
                }
            }
        }
    }

    Err(letzter_fehler)
}

// ---------------------------------------------------------------------------
// Hintergrund-Task
// ---------------------------------------------------------------------------

enum Ende {
    Getrennt,
    Verloren,
}

struct Hintergrund<S: SecretStore> {
    konfig: RealtimeKonfig,
    key_store: Arc<ClientKeyStore<S>>,
    verbunden: Arc<AtomicBool>,
    ausgang_rx: mpsc::Receiver<EncryptedPayload>,
    eingang_tx: mpsc::Sender<EmpfangenerStandort>,
    stopp_rx: watch::Receiver<bool>,
}

impl<S: SecretStore> Hintergrund<S> {
    async fn laufen(mut self, mut framed: Verbindung) {
        loop {
            match self.sitzung(&mut framed).await {
                Ende::Getrennt => break,
                Ende::Verloren => {
                    self.verbunden.store(false, Ordering::SeqCst);
                    tracing::warn!("Echtzeit-Verbindung verloren, verbinde neu");
                    match mit_wiederholung(&self.konfig, &mut self.stopp_rx).await {
                        Ok((neu, _)) => {
                            framed = neu;
                            self.verbunden.store(true, Ordering::SeqCst);
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "Wiederverbindung aufgegeben");
                            break;
                        }
                    }
                }
            }
        }
        self.verbunden.store(false, Ordering::SeqCst);
        tracing::info!("Echtzeit-Client beendet");
    }

    async fn sitzung(&mut self, framed: &mut Verbindung) -> Ende {
        loop {
            tokio::select! {
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            if let Err(e) = self.eingang(framed, nachricht).await {
                                tracing::warn!(fehler = %e, "Senden an Relay fehlgeschlagen");
                                return Ende::Verloren;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(fehler = %e, "Frame-Lesefehler");
                            return Ende::Verloren;
                        }
                        None => {
                            tracing::info!("Relay hat die Verbindung getrennt");
                            return Ende::Verloren;
                        }
                    }
                }

                Some(payload) = self.ausgang_rx.recv() => {
                    if let Err(e) = framed.send(RealtimeMessage::LocationUpdate(payload)).await {
                        tracing::warn!(fehler = %e, "Standort-Senden fehlgeschlagen");
                        return Ende::Verloren;
                    }
                }

                _ = self.stopp_rx.changed() => {
                    let _ = framed.send(RealtimeMessage::LocationUnsubscribe).await;
                    let _ = framed.close().await;
                    return Ende::Getrennt;
                }
            }
        }
    }

    async fn eingang(
        &self,
        framed: &mut Verbindung,
        nachricht: RealtimeMessage,
    ) -> std::io::Result<()> {
        match nachricht {
            RealtimeMessage::Ping(ping) => framed.send(RealtimeMessage::Pong(ping)).await?,
            RealtimeMessage::LocationBroadcast(broadcast) => self.standort_empfangen(broadcast).await,
            RealtimeMessage::UserOnline(p) => tracing::debug!(member_id = %p.member_id, "Mitglied online"),
            RealtimeMessage::UserOffline(p) => tracing::debug!(member_id = %p.member_id, "Mitglied offline"),
            RealtimeMessage::Error(meldung) => tracing::warn!(%meldung, "Fehlermeldung vom Relay"),
            andere => tracing::debug!(event = andere.event_name(), "Unerwartetes Event ignoriert"),
        }
        Ok(())
    }

    /// Entschluesselt und liefert aus; Fehlschlaege werden verworfen
    async fn standort_empfangen(&self, broadcast: LocationBroadcast) {
        let key = match self.key_store.gruppen_schluessel().await {
            Ok(Some(key)) => key,
            Ok(None) => {
                tracing::debug!(sender_id = %broadcast.sender_id, "Kein Gruppen-Schluessel, Standort verworfen");
                return;
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Gruppen-Schluessel nicht lesbar");
                return;
            }
        };

        match self
            .key_store
            .crypto()
            .payload_entschluesseln(&broadcast.payload, &key)
        {
            Entschluesselt::Erfolg(record) => {
                let standort = EmpfangenerStandort {
                    sender_id: broadcast.sender_id,
                    sender_name: broadcast.sender_name,
                    record,
                };
                if self.eingang_tx.try_send(standort).is_err() {
                    tracing::warn!("Empfangs-Queue voll oder geschlossen, Standort verworfen");
                }
            }
            Entschluesselt::Fehlgeschlagen(grund) => {
                tracing::warn!(
                    sender_id = %broadcast.sender_id,
                    %grund,
                    "Standort nicht entschluesselbar, verworfen"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RealtimeClient
// ---------------------------------------------------------------------------

pub struct RealtimeClient<S: SecretStore + 'static> {
    key_store: Arc<ClientKeyStore<S>>,
    identitaet: HandshakeBestaetigung,
    ausgang_tx: mpsc::Sender<EncryptedPayload>,
    stopp_tx: watch::Sender<bool>,
    geistermodus: AtomicBool,
    verbunden: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl<S: SecretStore + 'static> RealtimeClient<S> {
    /// Verbindet (mit Wiederholung) und startet den Hintergrund-Task
    ///
    /// Gibt den Client und die Queue der empfangenen Standorte zurueck.
    pub async fn verbinden(
        konfig: RealtimeKonfig,
        key_store: Arc<ClientKeyStore<S>>,
    ) -> ClientResult<(Self, mpsc::Receiver<EmpfangenerStandort>)> {
        let geistermodus =
            key_store.store().lesen(GEISTERMODUS_EINTRAG).await?.as_deref() == Some("true");

        let (stopp_tx, mut stopp_rx) = watch::channel(false);
        let (framed, identitaet) = mit_wiederholung(&konfig, &mut stopp_rx).await?;

        let (ausgang_tx, ausgang_rx) = mpsc::channel(32);
        let (eingang_tx, eingang_rx) = mpsc::channel(konfig.empfangs_queue.max(1));
        let verbunden = Arc::new(AtomicBool::new(true));

        let hintergrund = Hintergrund {
            konfig,
            key_store: Arc::clone(&key_store),
            verbunden: Arc::clone(&verbunden),
            ausgang_rx,
            eingang_tx,
            stopp_rx,
        };
        let task = tokio::spawn(hintergrund.laufen(framed));

        Ok((
            Self {
                key_store,
                identitaet,
                ausgang_tx,
                stopp_tx,
                geistermodus: AtomicBool::new(geistermodus),
                verbunden,
                task,
            },
            eingang_rx,
        ))
    }

    /// Identitaet laut `handshake:ok`
    pub fn identitaet(&self) -> &HandshakeBestaetigung {
        &self.identitaet
    }

    pub fn ist_verbunden(&self) -> bool {
        self.verbunden.load(Ordering::SeqCst)
    }

    pub fn ist_geistermodus(&self) -> bool {
        self.geistermodus.load(Ordering::SeqCst)
    }

    /// Schaltet den Geistermodus und speichert ihn
    pub async fn geistermodus_setzen(&self, an: bool) -> ClientResult<()> {
        self.geistermodus.store(an, Ordering::SeqCst);
        self.key_store
            .store()
            .schreiben(GEISTERMODUS_EINTRAG, if an { "true" } else { "false" })
            .await?;
        tracing::info!(geistermodus = an, "Geistermodus geaendert");
        Ok(())
    }

    /// Verschluesselt und sendet einen Standort
    ///
    /// `Ok(false)` wenn nichts gesendet wurde: Geistermodus, kein
    /// Gruppen-Schluessel oder keine Verbindung.
    pub async fn standort_senden(&self, record: &LocationRecord) -> ClientResult<bool> {
        if self.ist_geistermodus() {
            tracing::trace!("Geistermodus aktiv, Standort nicht gesendet");
            return Ok(false);
        }
        let Some(key) = self.key_store.gruppen_schluessel().await? else {
            tracing::debug!("Kein Gruppen-Schluessel, Standort nicht gesendet");
            return Ok(false);
        };
        if !self.ist_verbunden() {
            tracing::warn!("Nicht verbunden, Standort uebersprungen");
            return Ok(false);
        }

        let payload = self.key_store.crypto().payload_verschluesseln(record, &key)?;
        Ok(self.ausgang_tx.send(payload).await.is_ok())
    }

    /// Sendet `location:unsubscribe`, trennt und wartet auf den Task
    pub async fn trennen(self) {
        let _ = self.stopp_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(fehler = %e, "Echtzeit-Task endete fehlerhaft");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
