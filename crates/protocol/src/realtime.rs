//! Echtzeit-Events zwischen Geraet und Relay-Server
//!
//! Jeder Frame ist `{"event": "<name>", "data": <nutzlast>}`. Die Namen
//! entsprechen den Ereignissen, die bestehende Clients bereits sprechen.

use draugar_core::types::MemberId;
use serde::{Deserialize, Serialize};

use crate::payload::EncryptedPayload;

/// Einzige Meldung bei abgelehntem Handshake (Token ungueltig, abgelaufen, fehlend)
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Gueltiger Handshake, aber keine freie Verbindung; der Client darf es erneut versuchen
pub const SERVER_VOLL: &str = "Server full";

/// Abschiedsnachricht beim Herunterfahren
pub const SHUTDOWN_MELDUNG: &str = "Server shutting down";

/// Erster Frame jeder Verbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAnfrage {
    /// Signiertes Identity-Token
    pub token: String,
}

/// Antwort auf einen erfolgreichen Handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeBestaetigung {
    pub member_id: MemberId,
    pub display_name: String,
}

/// Vom Server weitergereichte Standort-Aktualisierung eines anderen Mitglieds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBroadcast {
    pub sender_id: MemberId,
    pub sender_name: String,
    pub payload: EncryptedPayload,
}

/// Praesenz-Hinweis (`user:online` / `user:offline`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenzHinweis {
    pub member_id: MemberId,
}

/// Keepalive-Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingNachricht {
    pub timestamp_ms: u64,
}

/// Alle Echtzeit-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeMessage {
    // Client -> Server
    #[serde(rename = "handshake")]
    Handshake(HandshakeAnfrage),
    #[serde(rename = "location:update")]
    LocationUpdate(EncryptedPayload),
    #[serde(rename = "location:subscribe")]
    LocationSubscribe,
    #[serde(rename = "location:unsubscribe")]
    LocationUnsubscribe,
    #[serde(rename = "pong")]
    Pong(PingNachricht),

    // Server -> Client
    #[serde(rename = "handshake:ok")]
    HandshakeOk(HandshakeBestaetigung),
    #[serde(rename = "location:broadcast")]
    LocationBroadcast(LocationBroadcast),
    #[serde(rename = "user:online")]
    UserOnline(PresenzHinweis),
    #[serde(rename = "user:offline")]
    UserOffline(PresenzHinweis),
    #[serde(rename = "ping")]
    Ping(PingNachricht),
    #[serde(rename = "error")]
    Error(String),
}

impl RealtimeMessage {
    /// Erstellt eine generische Fehlernachricht
    pub fn fehler(nachricht: impl Into<String>) -> Self {
        Self::Error(nachricht.into())
    }

    /// Name des Events auf dem Draht (fuer Logging)
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Handshake(_) => "handshake",
            Self::LocationUpdate(_) => "location:update",
            Self::LocationSubscribe => "location:subscribe",
            Self::LocationUnsubscribe => "location:unsubscribe",
            Self::Pong(_) => "pong",
            Self::HandshakeOk(_) => "handshake:ok",
            Self::LocationBroadcast(_) => "location:broadcast",
            Self::UserOnline(_) => "user:online",
            Self::UserOffline(_) => "user:offline",
            Self::Ping(_) => "ping",
            Self::Error(_) => "error",
        }
    }

    /// Ob die Ablehnung endgueltig ist (erneuter Versuch zwecklos)
    pub fn ist_auth_ablehnung(&self) -> bool {
        matches!(self, Self::Error(meldung) if meldung == UNAUTHORIZED)
    }
}
